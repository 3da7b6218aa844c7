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

//! Command-line handling for database maintenance.

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use crate::db::{get_db_version, new_conn, run_migrations, DatabaseVersion, Schema};

#[doc(hidden)]
pub fn command_parser() -> App<'static, 'static> {
    let arg = Arg::with_name("dbs")
        .multiple(true)
        .required(true)
        .value_name("DATABASE_FILES")
        .help("The database files to migrate. global.sqlite3 uses the global schema, anything else the guild schema.");

    SubCommand::with_name("db")
        .about("Commands related to maintaining the database files for Tyriabot.")
        .subcommand(SubCommand::with_name("migrate")
            .arg(arg)
            .arg(Arg::with_name("version")
                .short("V")
                .required(false)
                .takes_value(true)
                .help("The desired database version. Defaults to the latest.")
            )
            .about("Migrates the specified database files up to the latest (or given) database version.")
        )
        .subcommand(SubCommand::with_name("query")
            .arg(Arg::with_name("db")
                .required(true)
                .value_name("DATABASE_FILE")
                .help("The database file about which to query information.")
            )
            .about("Queries the version of a Tyriabot database file.")
        )
        .setting(AppSettings::SubcommandRequiredElseHelp)
}

#[doc(hidden)]
pub fn handle_matches(m: &ArgMatches) -> anyhow::Result<()> {
    if let ("db", Some(m)) = m.subcommand() {
        match m.subcommand() {
            ("migrate", Some(m)) => {
                let target = match m.value_of("version") {
                    Some(v) => Some(DatabaseVersion::Version(v.parse::<u32>()?)),
                    None => None
                };
                let files: Vec<&str> = m.values_of("dbs").map(|v| v.collect()).unwrap_or_default();
                let successes = files.iter()
                    .map(|c| {
                        info!("Migrating {}...", c);
                        new_conn(c).and_then(|mut conn| run_migrations(&mut conn, Schema::for_path(c), target))
                    })
                    .filter(|r| match r {
                        Err(e) => {
                            error!("Failed while migrating: {}", e);
                            false
                        }
                        Ok(()) => true
                    })
                    .count();

                info!("Successfully migrated {} of {} databases.", successes, files.len());
            }
            ("query", Some(m)) => {
                let db = m.value_of("db").unwrap_or_default();
                let conn = new_conn(db)?;
                let ver = get_db_version(&conn)?;
                info!("Database is at version {} (latest is {}).", ver, Schema::for_path(db).latest());
            }
            _ => {}
        }
    }

    Ok(())
}
