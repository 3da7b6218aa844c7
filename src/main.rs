//  Tyriabot - A Guild Wars 2 and moderation bot for Discord.
//  Copyright (C) 2020 Nick Samson

//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.

//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.

//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <https://www.gnu.org/licenses/>.

#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

use clap::{App, AppSettings};

use tyriabot::{about, db, dev, dispatch, logging};

#[doc(hidden)]
fn main() -> anyhow::Result<()> {
    better_panic::install();
    // A missing .env file is fine; the environment may already be set up.
    let _ = dotenv::dotenv();
    logging::init()?;

    let matches = App::new(about::BIN_NAME)
        .version(about::VERSION)
        .author(about::AUTHOR_NAME)
        .about(about::LICENSE_HEADER)
        .subcommand(dispatch::args::command_parser())
        .subcommand(db::args::command_parser())
        .subcommand(dev::command_parser())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .get_matches();

    debug!("Parsed command line.");
    dispatch::args::handle_matches(&matches)?;
    db::args::handle_matches(&matches)?;
    dev::handle_matches(&matches)?;

    Ok(())
}
