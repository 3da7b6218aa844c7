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

//! The `start` subcommand, which connects to Discord.

use clap::{App, ArgMatches, SubCommand};
use serenity::Client;

use crate::modules::standard_modules;

pub fn command_parser() -> App<'static, 'static> {
    SubCommand::with_name("start")
        .about("Starts the Tyriabot service.")
}

pub fn handle_matches(m: &ArgMatches) -> anyhow::Result<()> {
    if let ("start", Some(_)) = m.subcommand() {
        let token = std::env::var("TYRIABOT_TOKEN")
            .map_err(|_| anyhow::anyhow!("TYRIABOT_TOKEN must be set."))?;
        let owner = std::env::var("TYRIABOT_OWNER").unwrap_or_default().parse::<u64>()
            .map_err(|_| anyhow::anyhow!("TYRIABOT_OWNER must be a Discord user ID."))?;
        crate::data::ensure_data_folder()?;

        let dispatch = super::Dispatch::new(owner.into())
            .with_modules(standard_modules());
        let missing = dispatch.missing_dependencies();
        if !missing.is_empty() {
            anyhow::bail!("Modules are missing dependencies: {:?}", missing);
        }

        info!("Starting Tyriabot.");
        let mut client = Client::new(token, dispatch)?;
        client.start_autosharded()?;
    }

    Ok(())
}
