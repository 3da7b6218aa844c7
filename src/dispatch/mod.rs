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

//! Contains the primary event handler for Tyriabot.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::unsync::Lazy;
use regex::Regex;
use serenity::model::channel::Message;
use serenity::model::gateway::{Activity, Ready};
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId};
use serenity::model::prelude::{User, UserId};
use serenity::prelude::{Context, EventHandler};
use serenity::utils::MessageBuilder;

use crate::db::cache::get_cached_connection;
use crate::db::guild_conn::DEFAULT_COMMAND_PREFIX;
use crate::error::{AnyError, BotResult};
use crate::modules::commands::Command;
use crate::modules::config::Validator;
use crate::modules::hook::{BanAction, BanHookFn, CommandHookFn, MemberJoinHookFn, ReadyHookFn};
use crate::modules::{hook, Module};
use crate::util::LogErrorExt;

pub mod args;
pub mod config;
pub mod pending;

use pending::PendingReplies;

/// Shown in place of backend errors.
pub const BACKEND_FAILURE_MESSAGE: &str = "The command failed on the backend. Please contact the bot admin if this persists.";

/// The primary event handler. Contains references to transient state for the bot.
/// Non-transient data should live in the databases.
pub struct Dispatch {
    owner: AtomicU64,
    modules: HashMap<String, Module>,
    command_hooks: Vec<CommandHookFn>,
    member_join_hooks: Vec<MemberJoinHookFn>,
    ban_hooks: Vec<BanHookFn>,
    ready_hooks: Vec<ReadyHookFn>,
    config_validator: Validator,
    pending: Arc<PendingReplies>,
    started: AtomicBool,
}

// Thread local because Regex just uses an interior mutex if used in multiple threads.
thread_local! {
    static CMD_REGEX: Lazy<Regex> = Lazy::new(
        || Regex::new(r#"(?s)^([\p{Math Symbol}\p{Currency Symbol}\p{Punctuation}])(\w+)(?:\s*)(.*)"#).unwrap()
    );
}

impl EventHandler for Dispatch {
    fn message(&self, ctx: Context, new_message: Message) {
        let res = self.handle_message(&ctx, &new_message);

        if let Err(e) = res {
            report_error(&ctx, new_message.channel_id, e);
        }
    }

    fn ready(&self, ctx: Context, data_about_bot: Ready) {
        ctx.set_activity(Activity::playing("Guild Wars 2"));
        let active_guilds = &data_about_bot.guilds;
        active_guilds.iter().for_each(
            |g| get_cached_connection(g.id()).log_error()
        );

        if !self.started.swap(true, Ordering::SeqCst) {
            debug!("First ready; running ready hooks.");
            for hook in &self.ready_hooks {
                hook(self, &ctx).log_error();
            }
        }

        info!("Tyriabot is up and running in at least {} servers.", active_guilds.len());
    }

    fn guild_member_addition(&self, ctx: Context, guild_id: GuildId, new_member: Member) {
        for hook in &self.member_join_hooks {
            hook(self, &ctx, guild_id, &new_member).log_error();
        }
    }

    fn guild_ban_addition(&self, ctx: Context, guild_id: GuildId, banned_user: User) {
        self.run_ban_hooks(&ctx, guild_id, &banned_user, BanAction::Ban);
    }

    fn guild_ban_removal(&self, ctx: Context, guild_id: GuildId, unbanned_user: User) {
        self.run_ban_hooks(&ctx, guild_id, &unbanned_user, BanAction::Unban);
    }
}

/// Tells the user what went wrong: the error itself for user errors, a generic message otherwise.
pub fn report_error(ctx: &Context, channel: ChannelId, e: AnyError) {
    let msg = if e.is_user_error() {
        info!("{}", &e);
        MessageBuilder::new()
            .push_codeblock_safe(e, None)
            .build()
    } else {
        error!("{}", &e);
        MessageBuilder::new()
            .push_codeblock_safe(BACKEND_FAILURE_MESSAGE, None)
            .build()
    };

    channel.say(ctx, msg).log_error();
}

impl Dispatch {
    /// Creates a dispatch with the given owner.
    pub fn new(owner: UserId) -> Self {
        Dispatch {
            owner: AtomicU64::new(*owner.as_u64()),
            command_hooks: Vec::new(),
            member_join_hooks: Vec::new(),
            ban_hooks: Vec::new(),
            ready_hooks: Vec::new(),
            modules: HashMap::new(),
            config_validator: Validator::new(),
            pending: Arc::new(PendingReplies::new()),
            started: AtomicBool::new(false),
        }
    }

    /// The bot owner.
    pub fn owner(&self) -> UserId {
        UserId::from(self.owner.load(Ordering::Relaxed))
    }

    /// Replies commands are waiting for.
    pub fn pending(&self) -> &Arc<PendingReplies> {
        &self.pending
    }

    /// Every loaded module, by name.
    pub fn modules(&self) -> &HashMap<String, Module> {
        &self.modules
    }

    /// Handles an incoming new message.
    pub fn handle_message(&self, ctx: &Context, new_message: &Message) -> BotResult<()> {
        if new_message.is_own(&ctx) {
            trace!("Saw a message from myself.");
            return Ok(());
        }
        if new_message.author.bot {
            return Ok(());
        }

        if let Some(handler) = self.pending.take(new_message.channel_id, new_message.author.id) {
            trace!("Routing message to a pending reply.");
            return handler(self, ctx, new_message);
        }

        let msg = &new_message.content;
        let m = match CMD_REGEX.with(|r| r.captures(msg)) {
            Some(m) => m,
            None => return Ok(())
        };
        trace!("It's a command, probably.");

        let sym = m.get(1).and_then(|s| s.as_str().chars().next());
        let req_sym = if let Some(g) = &new_message.guild_id {
            let conn = get_cached_connection(*g)?;
            let r = conn.borrow();
            r.command_prefix()?
        } else {
            DEFAULT_COMMAND_PREFIX
        };

        if sym != Some(req_sym) {
            return Ok(());
        }

        let command_group = m.get(2).map_or("", |g| g.as_str());

        let command_name: Cow<str> = self.command_hooks.iter().try_fold(
            Cow::Borrowed(command_group),
            |acc, next: &CommandHookFn| next(self, ctx, new_message, acc),
        )?;

        let cmd = self.resolve_command(&command_name)
            .ok_or_else(|| hook::Error::CommandNotFound(command_name.to_string()))?;

        let args = m.get(3).map_or("", |a| a.as_str()).trim().to_string();
        debug!("{}", invocation_summary(&new_message.author.tag(), &command_name, &args));
        cmd.invoke(self, ctx, new_message, Cow::Owned(args))?;

        Ok(())
    }

    fn run_ban_hooks(&self, ctx: &Context, guild: GuildId, user: &User, action: BanAction) {
        for hook in &self.ban_hooks {
            hook(self, ctx, guild, user, action).log_error();
        }
    }

    /// Adds a module to the dispatcher.
    pub fn with_module(mut self, m: Module) -> Self {
        self.command_hooks.extend(m.command_hooks().iter());
        self.member_join_hooks.extend(m.member_join_hooks().iter());
        self.ban_hooks.extend(m.ban_hooks().iter());
        self.ready_hooks.extend(m.ready_hooks().iter());
        m.config_values().iter()
            .cloned()
            .for_each(|v| self.config_validator.add_value(v));
        debug!("Loaded module {}", m.name());
        self.modules.insert(m.name().to_owned(), m);
        self
    }

    /// Adds several modules, in order.
    pub fn with_modules(self, ms: impl IntoIterator<Item=Module>) -> Self {
        ms.into_iter().fold(self, Dispatch::with_module)
    }

    /// Lists `(module, missing dependency)` pairs for dependencies that aren't loaded.
    pub fn missing_dependencies(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self.modules.values()
            .flat_map(|m| m.dependencies().iter()
                .filter(|d| !self.modules.contains_key(d.as_str()))
                .map(move |d| (m.name().to_string(), d.clone())))
            .collect();
        out.sort();
        out
    }

    /// Resolves the given name to a command, if it exists.
    pub fn resolve_command(&self, cmd: impl AsRef<str>) -> Option<&dyn Command> {
        self.modules
            .get(cmd.as_ref())
            .and_then(|x| x.command_handler())
            .map(|x| x.as_ref())
    }
}

/// What gets logged for a command invocation. Arguments can hold credentials, so only their
/// size is recorded.
fn invocation_summary(author: &str, command: &str, args: &str) -> String {
    format!("{} invoked {} ({} bytes of arguments)", author, command, args.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::standard_modules;

    #[test]
    fn command_regex() {
        CMD_REGEX.with(|r| {
            let c = r.captures("$wallet  show gold").unwrap();
            assert_eq!(&c[1], "$");
            assert_eq!(&c[2], "wallet");
            assert_eq!(&c[3], "show gold");
            assert!(r.captures("hello !ping").is_none());
            let c = r.captures("!reason 3 spamming\nin general").unwrap();
            assert_eq!(&c[3], "3 spamming\nin general");
        });
    }

    #[test]
    fn invocations_are_logged_without_arguments() {
        let args = "add 0AE4A2B7-31C8-9C4C-A87E-0B73D4F7E8A1F3B5C6D2-1E9A-4B5C-8D7E-6F1A2B3C4D5E";
        let line = invocation_summary("someone#0001", "key", args);
        assert_eq!(line, format!("someone#0001 invoked key ({} bytes of arguments)", args.len()));
        assert!(!line.contains("0AE4A2B7"));
    }

    #[test]
    fn standard_modules_are_complete() {
        let disp = Dispatch::new(UserId::from(1)).with_modules(standard_modules());
        assert!(disp.missing_dependencies().is_empty(), "{:?}", disp.missing_dependencies());
        assert!(disp.resolve_command("prune").is_some());
        assert!(disp.resolve_command("wallet").is_some());
        for name in &["bosses", "cats", "skillinfo"] {
            assert!(disp.resolve_command(name).is_some(), "{} isn't loaded", name);
        }
        assert!(disp.resolve_command("base_hooks").is_none());
        assert!(disp.config_validator().check_key("command_prefix").is_ok());
        assert!(disp.config_validator().check_key("admin_role").is_ok());
        for key in &["update_notify", "daily_notify_channel", "news", "arcdps_channel", "raid_members"] {
            assert!(disp.config_validator().check_key(key).is_ok(), "{} isn't registered", key);
        }
    }

    #[test]
    fn every_command_renders_help() {
        let disp = Dispatch::new(UserId::from(1)).with_modules(standard_modules());
        for (name, m) in disp.modules() {
            if let Some(c) = m.command_handler() {
                assert!(!c.help().is_empty(), "{} has no help", name);
                assert_eq!(c.parser().get_name(), name.as_str());
            }
        }
    }

    #[test]
    fn bare_subcommand_groups_are_rejected() {
        let disp = Dispatch::new(UserId::from(1)).with_modules(standard_modules());
        for name in &["key", "character", "wallet", "guild", "pvp", "wvw", "tp", "gem",
            "updatenotifier", "newsfeed", "arcdps", "database"] {
            let c = disp.resolve_command(name).unwrap();
            assert!(c.parser().get_matches_from_safe(vec![*name]).is_err(), "{} ran without a subcommand", name);
            assert!(c.parser().get_matches_from_safe(vec![*name, "nonsense"]).is_err());
        }
    }
}
