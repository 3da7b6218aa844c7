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

//! Posts a numbered case to a log channel for every ban and unban, and lets moderators fill in
//! the reason afterwards.

use std::borrow::Cow;

use clap::{App, AppSettings, Arg, SubCommand};
use rusqlite::{Connection, OptionalExtension, Row, NO_PARAMS};
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use serenity::model::user::User;
use serenity::prelude::Context;

use crate::args::{channel_arg, joined_values, parse_app_matches, parse_plain_matches, parse_value};
use crate::db::cache::get_cached_connection;
use crate::db::{self, GuildConn};
use crate::dispatch::Dispatch;
use crate::error::{BotResult, SerenityError};
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::hook::{self, BanAction};
use crate::modules::{config, Module};

/// Config key holding the log channel.
pub const MOD_LOG_CHANNEL_KEY: &str = "mod_log_channel";

const MODLOG_ABOUT: &str = "Registers the channel where bans and unbans are logged.";
const REASON_ABOUT: &str = "Fills in the reason for a logged moderation case.";

/// One logged moderation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub number: u64,
    pub action: String,
    pub user: UserId,
    pub user_tag: String,
    pub reason: Option<String>,
    pub moderator: Option<String>,
    pub message: Option<MessageId>,
}

impl Case {
    fn from_row(r: &Row) -> rusqlite::Result<Self> {
        let number: i64 = r.get(0)?;
        let user: i64 = r.get(2)?;
        let message: Option<i64> = r.get(6)?;
        Ok(Case {
            number: number as u64,
            action: r.get(1)?,
            user: UserId(user as u64),
            user_tag: r.get(3)?,
            reason: r.get(4)?,
            moderator: r.get(5)?,
            message: message.map(|m| MessageId(m as u64)),
        })
    }

    /// The text of the case message. `prefix` is used to tell moderators how to add a reason.
    pub fn render(&self, prefix: char) -> String {
        let head = format!("**{}** | Case {}\n**User:** {} ({})\n", self.action, self.number, self.user_tag, self.user);
        match (&self.reason, &self.moderator) {
            (Some(reason), Some(moderator)) => format!("{}**Reason:** {}\n**Responsible Moderator:** {}", head, reason, moderator),
            _ => format!("{}**Reason:** Responsible moderator, please do `{}reason {} <reason>`", head, prefix, self.number)
        }
    }
}

const CASE_COLUMNS: &str = "case_number, action, user_id, user_tag, reason, moderator, message_id";

/// Records a new case, numbered one past the highest so far.
pub fn new_case(conn: &Connection, action: BanAction, user: UserId, user_tag: &str) -> db::Result<Case> {
    let next: i64 = conn.query_row("SELECT COALESCE(MAX(case_number), 0) + 1 FROM mod_cases;", NO_PARAMS, |r| r.get(0))?;
    conn.execute(
        "INSERT INTO mod_cases (case_number, action, user_id, user_tag, created_at) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![next, action.as_str(), user.0 as i64, user_tag, chrono::Utc::now().timestamp()],
    )?;
    Ok(Case {
        number: next as u64,
        action: action.as_str().to_string(),
        user,
        user_tag: user_tag.to_string(),
        reason: None,
        moderator: None,
        message: None,
    })
}

/// Looks a case up by number.
pub fn get_case(conn: &Connection, number: u64) -> db::Result<Option<Case>> {
    let c = conn.query_row(
        &format!("SELECT {} FROM mod_cases WHERE case_number = ?;", CASE_COLUMNS),
        params![number as i64],
        Case::from_row,
    ).optional()?;
    Ok(c)
}

/// Remembers which message shows the case.
pub fn set_case_message(conn: &Connection, number: u64, message: MessageId) -> db::Result<()> {
    conn.execute("UPDATE mod_cases SET message_id = ?1 WHERE case_number = ?2;",
                 params![message.0 as i64, number as i64])?;
    Ok(())
}

/// Fills in the reason and moderator.
pub fn set_case_reason(conn: &Connection, number: u64, reason: &str, moderator: &str) -> db::Result<()> {
    conn.execute("UPDATE mod_cases SET reason = ?1, moderator = ?2 WHERE case_number = ?3;",
                 params![reason, moderator, number as i64])?;
    Ok(())
}

fn log_channel(conn: &GuildConn) -> db::Result<Option<ChannelId>> {
    Ok(conn.get_value(MOD_LOG_CHANNEL_KEY)?
        .and_then(|v| v.parse::<u64>().ok())
        .map(ChannelId))
}

fn ban_hook(_disp: &Dispatch, ctx: &Context, guild: GuildId, user: &User, action: BanAction) -> BotResult<()> {
    let conn = get_cached_connection(guild)?;
    let conn = conn.borrow();
    let channel = match log_channel(&conn)? {
        Some(c) => c,
        None => return Ok(())
    };

    let case = new_case(conn.as_ref(), action, user.id, &user.tag())?;
    debug!("Logging case {} in {}: {} {}", case.number, guild, case.action, user.tag());
    let posted = channel.say(ctx, case.render(conn.command_prefix()?))
        .map_err(SerenityError::from)?;
    set_case_message(conn.as_ref(), case.number, posted.id)?;
    Ok(())
}

/// The `modlog` command.
pub struct ModLog;

impl Command for ModLog {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("modlog", args, &self.parser())?;
        let guild = msg.guild_id.ok_or(hook::Error::Denied)?;
        let conn = get_cached_connection(guild)?;
        let conn = conn.borrow();

        let reply = match m.subcommand() {
            ("register", Some(sub)) => {
                let raw = sub.value_of("channel").unwrap_or_default();
                let channel = match channel_arg(raw) {
                    Some(c) => c,
                    None => return user_error(format!("{} isn't a channel.", raw))
                };
                disp.set_config(&conn, MOD_LOG_CHANNEL_KEY, &channel.to_string())?;
                "Server registered."
            }
            ("unregister", _) => {
                conn.unset_value(MOD_LOG_CHANNEL_KEY)?;
                "Server unregistered."
            }
            _ => return Err(Error::Other)
        };
        msg.channel_id.say(ctx, reply)?;
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("modlog")
            .about(MODLOG_ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("register")
                .about("Logs bans and unbans to CHANNEL.")
                .arg(Arg::with_name("channel")
                    .required(true)
                    .value_name("CHANNEL")))
            .subcommand(SubCommand::with_name("unregister")
                .about("Stops logging. Existing cases are kept."))
    }
}

/// The `reason` command.
pub struct Reason;

impl Command for Reason {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_plain_matches("reason", args, &self.parser())?;
        let number = parse_value::<u64>(&m, "case")?.unwrap_or_default();
        let reason = joined_values(&m, "reason");
        let guild = msg.guild_id.ok_or(hook::Error::Denied)?;
        let conn = get_cached_connection(guild)?;
        let conn = conn.borrow();

        let channel = match log_channel(&conn)? {
            Some(c) => c,
            None => return user_error("This server has no mod log channel registered.")
        };
        let mut case = match get_case(conn.as_ref(), number)? {
            Some(c) => c,
            None => return user_error("That's not a valid case number.")
        };

        let moderator = msg.author.tag();
        set_case_reason(conn.as_ref(), number, &reason, &moderator)?;
        case.reason = Some(reason);
        case.moderator = Some(moderator);

        let text = case.render(conn.command_prefix()?);
        match case.message {
            Some(id) => {
                channel.edit_message(ctx, id, |m| m.content(&text))?;
            }
            None => {
                let posted = channel.say(ctx, &text)?;
                set_case_message(conn.as_ref(), number, posted.id)?;
            }
        }
        msg.channel_id.say(ctx, "Case updated")?;
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("reason")
            .about(REASON_ABOUT)
            .arg(Arg::with_name("case")
                .required(true)
                .value_name("CASE"))
            .arg(Arg::with_name("reason")
                .required(true)
                .multiple(true)
                .value_name("REASON"))
    }
}

/// Creates the `modlog` [Module], which also logs bans.
pub fn mod_log_module() -> Module {
    Module::with_name("modlog")
        .with_description(MODLOG_ABOUT)
        .with_category("Moderation")
        .with_dependency("config")
        .with_command(ModLog)
        .with_ban_hook(ban_hook)
        .with_config_value(config::Value::new(
            MOD_LOG_CHANNEL_KEY,
            "The channel bans and unbans are logged to.",
            config::valid_parseable::<ChannelId>,
            Option::<String>::None,
        ))
}

/// Creates the `reason` [Module].
pub fn reason_module() -> Module {
    Module::with_name("reason")
        .with_description(REASON_ABOUT)
        .with_category("Moderation")
        .with_dependency("modlog")
        .with_command(Reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;
    use crate::db::open_guild_db;

    #[test]
    fn case_numbering() {
        let dir = TempDir::new("mod_log").unwrap();
        let conn = open_guild_db(dir.path(), GuildId(3)).unwrap();
        let first = new_case(conn.as_ref(), BanAction::Ban, UserId(10), "troll#0001").unwrap();
        let second = new_case(conn.as_ref(), BanAction::Unban, UserId(10), "troll#0001").unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(second.number, 2);

        set_case_message(conn.as_ref(), 2, MessageId(99)).unwrap();
        set_case_reason(conn.as_ref(), 2, "appealed", "mod#0002").unwrap();
        let stored = get_case(conn.as_ref(), 2).unwrap().unwrap();
        assert_eq!(stored.message, Some(MessageId(99)));
        assert_eq!(stored.reason.as_deref(), Some("appealed"));
        assert!(get_case(conn.as_ref(), 3).unwrap().is_none());
    }

    #[test]
    fn rendering() {
        let mut case = Case {
            number: 4,
            action: "Ban".to_string(),
            user: UserId(10),
            user_tag: "troll#0001".to_string(),
            reason: None,
            moderator: None,
            message: None,
        };
        assert_eq!(case.render('$'),
                   "**Ban** | Case 4\n**User:** troll#0001 (10)\n**Reason:** Responsible moderator, please do `$reason 4 <reason>`");
        case.reason = Some("spam".to_string());
        case.moderator = Some("mod#0002".to_string());
        assert_eq!(case.render('$'),
                   "**Ban** | Case 4\n**User:** troll#0001 (10)\n**Reason:** spam\n**Responsible Moderator:** mod#0002");
    }
}
