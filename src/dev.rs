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

//! Development helpers exposed on the command line.

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use serenity::model::id::GuildId;

use crate::db;
use crate::db::{open_global_db, open_guild_db, GuildConn};

pub fn command_parser() -> App<'static, 'static> {
    trace!("Generating dev command parser.");
    SubCommand::with_name("dev")
        .about("Commands related to development.")
        .subcommand(
            SubCommand::with_name("dummy-db")
                .arg(Arg::with_name("guild-id")
                    .takes_value(true)
                    .required(true)
                    .value_name("GUILD_ID")
                    .help("The guild to generate a dummy database file for. Created in $CWD."))
                .arg(Arg::with_name("global")
                    .long("global")
                    .help("Also creates a migrated global.sqlite3 next to it."))
                .about("Creates a dummy database with the latest migrations for use in testing.")
        )
        .setting(AppSettings::SubcommandRequiredElseHelp)
}

pub fn handle_matches(m: &ArgMatches) -> anyhow::Result<()> {
    if let ("dev", Some(m)) = m.subcommand() {
        if let ("dummy-db", Some(m)) = m.subcommand() {
            let gid = m.value_of("guild-id")
                .unwrap_or_default()
                .parse::<u64>()?;
            create_dummy_db(GuildId::from(gid))?;
            if m.is_present("global") {
                open_global_db("./")?;
                info!("Created global.sqlite3.");
            }
        }
    }
    Ok(())
}

fn create_dummy_db(gid: GuildId) -> db::Result<GuildConn> {
    info!("Creating db for guild id {} in current directory.", gid);
    let conn = open_guild_db("./", gid)?;
    info!("Done!");
    Ok(conn)
}
