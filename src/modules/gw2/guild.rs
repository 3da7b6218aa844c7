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

//! In-game guild details. Most of it needs a key belonging to the guild's leader.

use std::borrow::Cow;
use std::collections::HashMap;

use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::args::{joined_values, parse_plain_matches};
use crate::db::global::global_connection;
use crate::dispatch::Dispatch;
use crate::gw2::model::{GuildInfo, GuildMember, GuildRank, TreasuryEntry};
use crate::gw2::{client, encode, ApiError};
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::Module;
use crate::util::say_chunked;

use super::{fetch_key, user_colour, CATEGORY};

const ABOUT: &str = "Shows information about a Guild Wars 2 guild.";
const LEADER_ONLY: &str = "You need to be a guild leader to use this command.";
const MAX_LINES: usize = 20;

/// Members ordered by rank, without pending invites.
pub fn member_lines(members: &[GuildMember], ranks: &[GuildRank]) -> Vec<String> {
    let order: HashMap<&str, u32> = ranks.iter().map(|r| (r.id.as_str(), r.order)).collect();
    let mut listed: Vec<&GuildMember> = members.iter()
        .filter(|m| m.rank != "invited")
        .collect();
    listed.sort_by_key(|m| order.get(m.rank.as_str()).copied().unwrap_or(u32::MAX));
    listed.into_iter()
        .take(MAX_LINES)
        .map(|m| format!("{} ({})", m.name, m.rank))
        .collect()
}

/// Treasury items still short of what upgrades need.
pub fn treasury_lines(entries: &[TreasuryEntry], names: &HashMap<u64, String>) -> Vec<String> {
    entries.iter()
        .filter(|e| e.count < e.needed())
        .take(MAX_LINES)
        .map(|e| {
            let name = names.get(&e.item_id).map_or_else(|| format!("Item {}", e.item_id), String::clone);
            format!("{}: {}/{}", name, e.count, e.needed())
        })
        .collect()
}

fn leader_only<T>(r: crate::gw2::Result<T>) -> Result<T> {
    match r {
        Err(ApiError::Forbidden) => user_error(LEADER_ONLY),
        r => Ok(r?)
    }
}

pub struct Guild;

impl Guild {
    fn guild_id(&self, name: &str) -> Result<String> {
        let ids: Vec<String> = client().get(&format!("guild/search?name={}", encode(name)))?;
        match ids.into_iter().next() {
            Some(id) => Ok(id),
            None => user_error("I couldn't find a guild with that name.")
        }
    }

    fn info(&self, ctx: &Context, msg: &Message, name: &str) -> Result<()> {
        let id = self.guild_id(name)?;
        let endpoint = format!("guild/{}", id);
        let key = global_connection()?.api_key(msg.author.id)?;
        let info: GuildInfo = match key {
            Some(k) => match client().get_authed(&endpoint, &k.key) {
                Err(ApiError::Forbidden) | Err(ApiError::InvalidKey) => client().get(&endpoint)?,
                r => r?
            },
            None => client().get(&endpoint)?
        };

        let colour = user_colour(ctx, msg);
        msg.channel_id.send_message(ctx, |m| m.embed(|e| {
            e.title(format!("[{}] {}", info.tag, info.name))
                .colour(colour)
                .footer(|f| f.text(&info.id));
            if let Some(motd) = info.motd.as_ref().filter(|s| !s.trim().is_empty()) {
                e.description(motd);
            }
            if let Some(l) = info.level {
                e.field("Level", l, true);
            }
            if let (Some(n), Some(cap)) = (info.member_count, info.member_capacity) {
                e.field("Members", format!("{}/{}", n, cap), true);
            }
            for (label, v) in &[("Influence", info.influence), ("Aetherium", info.aetherium),
                                ("Resonance", info.resonance), ("Favor", info.favor)] {
                if let Some(v) = v {
                    e.field(label, v, true);
                }
            }
            e
        }))?;
        Ok(())
    }

    fn members(&self, ctx: &Context, msg: &Message, name: &str) -> Result<()> {
        let key = fetch_key(msg, &["guilds"])?;
        let id = self.guild_id(name)?;
        let members: Vec<GuildMember> = leader_only(client().get_authed(&format!("guild/{}/members", id), &key.key))?;
        let ranks: Vec<GuildRank> = leader_only(client().get_authed(&format!("guild/{}/ranks", id), &key.key))?;
        msg.channel_id.say(ctx, format!("Members of {}:", name))?;
        say_chunked(ctx, msg.channel_id, &member_lines(&members, &ranks).join("\n"), true)?;
        Ok(())
    }

    fn treasury(&self, ctx: &Context, msg: &Message, name: &str) -> Result<()> {
        let key = fetch_key(msg, &["guilds"])?;
        let id = self.guild_id(name)?;
        let entries: Vec<TreasuryEntry> = leader_only(client().get_authed(&format!("guild/{}/treasury", id), &key.key))?;
        let ids: Vec<u64> = entries.iter().map(|e| e.item_id).collect();
        let names = global_connection()?.item_names(&ids)?;
        let lines = treasury_lines(&entries, &names);
        if lines.is_empty() {
            msg.channel_id.say(ctx, "The treasury has everything its upgrades need.")?;
        } else {
            msg.channel_id.say(ctx, format!("Treasury of {} still needs:", name))?;
            say_chunked(ctx, msg.channel_id, &lines.join("\n"), true)?;
        }
        Ok(())
    }
}

impl Command for Guild {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_plain_matches("guild", args, &self.parser())?;
        match m.subcommand() {
            ("info", Some(sub)) => self.info(ctx, msg, &joined_values(sub, "name")),
            ("members", Some(sub)) => self.members(ctx, msg, &joined_values(sub, "name")),
            ("treasury", Some(sub)) => self.treasury(ctx, msg, &joined_values(sub, "name")),
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        let name = Arg::with_name("name")
            .help("The guild's full name.")
            .required(true)
            .multiple(true);
        App::new("guild")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("info")
                .about("Shows a guild's details.")
                .arg(name.clone()))
            .subcommand(SubCommand::with_name("members")
                .about("Lists a guild's members by rank.")
                .arg(name.clone()))
            .subcommand(SubCommand::with_name("treasury")
                .about("Lists what the guild's treasury still needs.")
                .arg(name))
    }
}

pub fn guild_module() -> Module {
    Module::with_name("guild")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Guild)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gw2::model::TreasuryNeed;

    fn member(name: &str, rank: &str) -> GuildMember {
        GuildMember { name: name.to_string(), rank: rank.to_string() }
    }

    #[test]
    fn members_by_rank() {
        let ranks = vec![
            GuildRank { id: "Leader".to_string(), order: 1 },
            GuildRank { id: "Officer".to_string(), order: 2 },
            GuildRank { id: "Member".to_string(), order: 3 },
        ];
        let members = vec![
            member("c.3333", "Member"),
            member("x.9999", "invited"),
            member("a.1111", "Leader"),
            member("b.2222", "Officer"),
        ];
        assert_eq!(member_lines(&members, &ranks), vec!["a.1111 (Leader)", "b.2222 (Officer)", "c.3333 (Member)"]);

        let many: Vec<GuildMember> = (0..30).map(|i| member(&format!("m.{}", i), "Member")).collect();
        assert_eq!(member_lines(&many, &ranks).len(), MAX_LINES);
    }

    #[test]
    fn treasury_shortfalls() {
        let need = |count| vec![TreasuryNeed { upgrade_id: 1, count }];
        let entries = vec![
            TreasuryEntry { item_id: 19976, count: 10, needed_by: need(50) },
            TreasuryEntry { item_id: 19721, count: 250, needed_by: need(250) },
            TreasuryEntry { item_id: 70957, count: 0, needed_by: need(5) },
        ];
        let mut names = HashMap::new();
        names.insert(19976, "Mystic Coin".to_string());
        assert_eq!(treasury_lines(&entries, &names), vec!["Mystic Coin: 10/50", "Item 70957: 0/5"]);
    }
}
