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

//! Raid protection: quarantines new members in a dedicated channel once too many join at once.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use circular_queue::CircularQueue;
use clap::{App, AppSettings, Arg, SubCommand};
use lock_api::RwLockUpgradableReadGuard;
use parking_lot::Mutex;
use serenity::model::channel::{ChannelType, Message, PermissionOverwrite, PermissionOverwriteType};
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, RoleId};
use serenity::model::permissions::Permissions;
use serenity::prelude::Context;
use serenity::utils::Colour;
use typemap::Key;

use crate::args::parse_app_matches;
use crate::db::cache::get_cached_connection;
use crate::db::GuildConn;
use crate::dispatch::Dispatch;
use crate::error::{BotResult, SerenityError};
use crate::modules::commands::{Command, Error, Result};
use crate::modules::privilege::{admin_role, require_admin};
use crate::modules::{config, hook, Module};

/// Joins within [JOIN_WINDOW] needed to turn protection on. Zero disables the trigger.
pub const RAID_MEMBERS_KEY: &str = "raid_members";
pub const RAID_PROTECTED_KEY: &str = "raid_protected";
pub const RAID_ROLE_KEY: &str = "raid_role";
pub const RAID_CHANNEL_KEY: &str = "raid_channel";

pub const JOIN_WINDOW: Duration = Duration::from_secs(15);
/// Upper bound on the join threshold; also how many joins each guild remembers.
pub const MAX_RAID_MEMBERS: u32 = 100;

const RAID_NAME: &str = "raid";
const ABOUT: &str = "Protects the server from raids by quarantining new members.";

/// Recent join times for one guild.
pub struct JoinWindow {
    joins: CircularQueue<Instant>,
}

impl Default for JoinWindow {
    fn default() -> Self {
        JoinWindow { joins: CircularQueue::with_capacity(MAX_RAID_MEMBERS as usize) }
    }
}

impl JoinWindow {
    /// Records a join at `now` and returns how many joins fell within the window ending at `now`.
    pub fn record(&mut self, now: Instant) -> u32 {
        self.joins.push(now);
        self.joins.iter()
            .take_while(|t| now.saturating_duration_since(**t) < JOIN_WINDOW)
            .count() as u32
    }
}

struct JoinWindows;

impl Key for JoinWindows {
    type Value = Arc<Mutex<HashMap<GuildId, JoinWindow>>>;
}

fn join_windows(ctx: &Context) -> Arc<Mutex<HashMap<GuildId, JoinWindow>>> {
    let rg = ctx.data.upgradable_read();
    match rg.get::<JoinWindows>() {
        Some(w) => w.clone(),
        None => {
            let mut wg = RwLockUpgradableReadGuard::upgrade(rg);
            let out = Arc::new(Mutex::new(HashMap::new()));
            wg.insert::<JoinWindows>(out.clone());
            out
        }
    }
}

fn valid_threshold(s: &str) -> bool {
    s.parse::<u32>().map_or(false, |n| n <= MAX_RAID_MEMBERS)
}

pub fn members_reply(threshold: u32) -> String {
    if threshold == 0 {
        "Automatic raid-protect is turned off.".to_string()
    } else {
        format!("I will turn on raid-protect when {} people join within 15 seconds.", threshold)
    }
}

fn find_raid_role(ctx: &Context, guild: GuildId) -> Option<RoleId> {
    let g = guild.to_guild_cached(ctx)?;
    let rg = g.read();
    rg.roles.values()
        .find(|r| r.name == RAID_NAME)
        .map(|r| r.id)
}

fn overwrite(role: RoleId, allow: Permissions, deny: Permissions) -> PermissionOverwrite {
    PermissionOverwrite { allow, deny, kind: PermissionOverwriteType::Role(role) }
}

fn announce(ctx: &Context, channel: ChannelId, title: Option<&str>, text: &str) -> serenity::Result<()> {
    channel.send_message(ctx, |m| m.embed(|e| {
        if let Some(t) = title {
            e.title(t);
        }
        e.description(text).colour(Colour::RED)
    }))?;
    Ok(())
}

/// Creates the raid role and its quarantine channel, returning the new role.
fn set_up(ctx: &Context, guild: GuildId, conn: &GuildConn) -> BotResult<RoleId> {
    let role = guild.create_role(ctx, |r| r.name(RAID_NAME))
        .map_err(SerenityError::from)?;
    let read_send = Permissions::READ_MESSAGES | Permissions::SEND_MESSAGES;
    let everyone = RoleId(guild.0);

    let mut overwrites = vec![
        overwrite(everyone, Permissions::empty(), Permissions::READ_MESSAGES),
        overwrite(role.id, read_send, Permissions::empty()),
    ];
    if let Some(admin) = admin_role(guild)? {
        overwrites.push(overwrite(admin, read_send | Permissions::MANAGE_CHANNELS, Permissions::empty()));
    }
    let channel = guild.create_channel(ctx, |c| c
        .name(RAID_NAME)
        .kind(ChannelType::Text)
        .permissions(overwrites))
        .map_err(SerenityError::from)?;

    conn.set_value(RAID_ROLE_KEY, &role.id.to_string())?;
    conn.set_value(RAID_CHANNEL_KEY, &channel.id.to_string())?;
    announce(ctx, channel.id, Some("Anti-Raid"), "Raid-protection has been set up!")
        .map_err(SerenityError::from)?;

    let hidden = overwrite(role.id, Permissions::empty(), Permissions::READ_MESSAGES);
    let channels = guild.channels(ctx).map_err(SerenityError::from)?;
    for (id, c) in channels {
        if id == channel.id || c.kind != ChannelType::Text {
            continue;
        }
        if let Err(e) = id.create_permission(ctx, &hidden) {
            // Channels the bot can't manage stay visible; nothing else to do about them.
            debug!("Couldn't hide {} from the raid role: {}", id, e);
        }
    }

    announce(ctx, channel.id, None,
             "Raid-protection is now active! Contact a Staff Member for help or wait till you get verified!")
        .map_err(SerenityError::from)?;
    info!("Set up raid protection in {}", guild);
    Ok(role.id)
}

fn member_join_hook(disp: &Dispatch, ctx: &Context, guild: GuildId, member: &Member) -> BotResult<()> {
    let conn = get_cached_connection(guild)?;
    let conn = conn.borrow();

    let threshold = disp.config_value::<u32>(&conn, RAID_MEMBERS_KEY)?;
    let joined = join_windows(ctx).lock()
        .entry(guild)
        .or_default()
        .record(Instant::now());
    trace!("{} joins in {} within the window", joined, guild);

    let mut protected = conn.flag(RAID_PROTECTED_KEY)?;
    if threshold != 0 && joined >= threshold && !protected {
        warn!("{} members joined {} within 15 seconds; turning on raid protection.", joined, guild);
        conn.set_value(RAID_PROTECTED_KEY, "true")?;
        protected = true;
    }

    if protected {
        let role = match find_raid_role(ctx, guild) {
            Some(r) => r,
            None => set_up(ctx, guild, &conn)?
        };
        let mut m = member.clone();
        m.add_role(ctx, role).map_err(SerenityError::from)?;
    }
    Ok(())
}

pub struct RaidProtect;

impl Command for RaidProtect {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("raidprotect", args, &self.parser())?;
        let guild = msg.guild_id.ok_or(hook::Error::Denied)?;
        let conn = get_cached_connection(guild)?;
        let conn = conn.borrow();

        let reply: Cow<str> = match m.subcommand() {
            ("setup", _) => {
                require_admin(ctx, msg)?;
                if find_raid_role(ctx, guild).is_some() {
                    "Raid-protection is already set up on this server.".into()
                } else {
                    set_up(ctx, guild, &conn)?;
                    "Raid-protection has been set up!".into()
                }
            }
            ("toggle", _) => {
                require_admin(ctx, msg)?;
                let now = !conn.flag(RAID_PROTECTED_KEY)?;
                conn.set_value(RAID_PROTECTED_KEY, &now.to_string())?;
                if now {
                    "Your server is now protected, new members will be put in the raid channel.".into()
                } else {
                    "Your server is no longer protected, new members will not be put in the raid channel.".into()
                }
            }
            ("setmembers", Some(sub)) => {
                require_admin(ctx, msg)?;
                let n = sub.value_of("members").unwrap_or_default();
                disp.set_config(&conn, RAID_MEMBERS_KEY, n)?;
                "Members set".into()
            }
            ("members", _) => {
                members_reply(disp.config_value::<u32>(&conn, RAID_MEMBERS_KEY)?).into()
            }
            _ => return Err(Error::Other)
        };

        msg.channel_id.say(ctx, reply)?;
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("raidprotect")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("setup")
                .about("Creates the raid role and channel."))
            .subcommand(SubCommand::with_name("toggle")
                .about("Turns raid protection on or off."))
            .subcommand(SubCommand::with_name("setmembers")
                .about("Sets how many joins within 15 seconds turn protection on. 0 turns that off.")
                .arg(Arg::with_name("members")
                    .required(true)
                    .value_name("MEMBERS")
                    .validator(config::fallible_validator::<u32, _>)))
            .subcommand(SubCommand::with_name("members")
                .about("Shows how many joins within 15 seconds turn protection on."))
    }
}

pub fn raid_protect_module() -> Module {
    Module::with_name("raidprotect")
        .with_description(ABOUT)
        .with_category("Moderation")
        .with_sensitivity(false)
        .with_dependency("privilege")
        .with_command(RaidProtect)
        .with_member_join_hook(member_join_hook)
        .with_config_value(config::Value::new(
            RAID_MEMBERS_KEY,
            "How many members joining within 15 seconds turns raid protection on. 0 disables it.",
            valid_threshold,
            Some("4"),
        ))
        .with_config_value(config::Value::new(
            RAID_PROTECTED_KEY,
            "Whether new members are currently quarantined.",
            config::valid_bool,
            Some("false"),
        ))
        .with_config_value(config::Value::new(
            RAID_ROLE_KEY,
            "The role given to quarantined members.",
            config::valid_parseable::<RoleId>,
            Option::<String>::None,
        ))
        .with_config_value(config::Value::new(
            RAID_CHANNEL_KEY,
            "The channel quarantined members can see.",
            config::valid_parseable::<ChannelId>,
            Option::<String>::None,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_window() {
        let mut w = JoinWindow::default();
        let start = Instant::now();
        assert_eq!(w.record(start), 1);
        assert_eq!(w.record(start + Duration::from_secs(5)), 2);
        assert_eq!(w.record(start + Duration::from_secs(14)), 3);
        // The first join has aged out.
        assert_eq!(w.record(start + Duration::from_secs(16)), 3);
        assert_eq!(w.record(start + Duration::from_secs(60)), 1);
    }

    #[test]
    fn join_window_is_bounded() {
        let mut w = JoinWindow::default();
        let now = Instant::now();
        for _ in 0..MAX_RAID_MEMBERS * 2 {
            w.record(now);
        }
        assert_eq!(w.record(now), MAX_RAID_MEMBERS);
    }

    #[test]
    fn thresholds() {
        assert!(valid_threshold("0"));
        assert!(valid_threshold("100"));
        assert!(!valid_threshold("101"));
        assert!(!valid_threshold("-1"));
        assert_eq!(members_reply(0), "Automatic raid-protect is turned off.");
        assert_eq!(members_reply(4), "I will turn on raid-protect when 4 people join within 15 seconds.");
    }
}
