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

//! Owner tools for the bot-wide database.

use std::borrow::Cow;
use std::time::Instant;

use clap::{App, AppSettings, SubCommand};
use serde::de::DeserializeOwned;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use serenity::utils::MessageBuilder;

use crate::args::parse_app_matches;
use crate::db::global::{global_connection, GlobalConn, IndexRow};
use crate::dispatch::Dispatch;
use crate::gw2::model::{Item, Skill};
use crate::gw2::{client, MAX_IDS_PER_REQUEST};
use crate::modules::commands::{Command, Error, Result};
use crate::modules::Module;
use crate::pollers::{Discord, ARCDPS, DAILIES, NEWS, UPDATES};

use super::CATEGORY;

const ABOUT: &str = "Maintains the item and skill indexes and shows bot statistics. Bot owner only.";

/// Refills one index from every ID the endpoint lists. The old index stays in place if any
/// batch fails.
fn rebuild_from_api<T>(conn: &GlobalConn, endpoint: &str) -> Result<u64>
    where T: IndexRow + DeserializeOwned {
    let ids: Vec<u64> = client().get(endpoint)?;
    let total = ids.len();
    let batches = ids.chunks(MAX_IDS_PER_REQUEST)
        .enumerate()
        .map(|(n, chunk)| {
            if n % 50 == 0 {
                debug!("Fetching {} {} of {}", endpoint, n * MAX_IDS_PER_REQUEST, total);
            }
            client().get_many::<T>(endpoint, chunk).map_err(Error::from)
        });
    conn.rebuild_index(batches)
}

pub struct Database;

impl Database {
    fn rebuild(&self, ctx: &Context, msg: &Message) -> Result<()> {
        msg.channel_id.say(ctx, "Rebuilding the item and skill databases, this will take a while...")?;
        let start = Instant::now();
        let conn = global_connection()?;

        let items = rebuild_from_api::<Item>(&conn, "items")?;
        info!("Item index rebuilt with {} items.", items);
        let skills = rebuild_from_api::<Skill>(&conn, "skills")?;
        info!("Skill index rebuilt with {} skills.", skills);

        let elapsed = start.elapsed().as_secs_f64();
        info!("Database rebuilt in {:.1}s", elapsed);
        msg.channel_id.say(ctx, format!("Database done! Time elapsed: {:.2} seconds", elapsed))?;
        Ok(())
    }

    fn statistics(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let conn = global_connection()?;
        let discord = Discord::from(ctx);
        let guilds = discord.guilds();
        let mut lines = vec![
            format!("Registered users: {}", conn.count_api_keys()?),
            format!("Indexed items: {}", conn.count_items()?),
            format!("Indexed skills: {}", conn.count_skills()?),
            format!("Servers: {}", guilds.len()),
        ];
        for (label, sub) in &[("Update notifications", UPDATES), ("Daily notifications", DAILIES),
                              ("News", NEWS), ("ArcDPS updates", ARCDPS)] {
            let mut enabled = 0;
            for g in &guilds {
                if sub.enabled(*g)? {
                    enabled += 1;
                }
            }
            lines.push(format!("{}: {}", label, enabled));
        }

        msg.channel_id.say(ctx, MessageBuilder::new()
            .push_codeblock_safe(lines.join("\n"), None)
            .build())?;
        Ok(())
    }
}

impl Command for Database {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("database", args, &self.parser())?;
        match m.subcommand() {
            ("rebuild", _) => self.rebuild(ctx, msg),
            ("statistics", _) => self.statistics(ctx, msg),
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("database")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("rebuild")
                .about("Refills the item and skill indexes from the API."))
            .subcommand(SubCommand::with_name("statistics")
                .about("Shows usage numbers."))
    }
}

pub fn database_module() -> Module {
    Module::with_name("database")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_owner_only(true)
        .with_command(Database)
}
