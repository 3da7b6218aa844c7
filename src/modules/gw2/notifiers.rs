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

//! Subscriptions to game update, news and ArcDPS announcements, and the channel and toggle
//! handling every announcement shares.

use std::borrow::Cow;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;

use crate::args::{channel_arg, parse_app_matches, parse_value};
use crate::db::cache::get_cached_connection;
use crate::db::global::global_connection;
use crate::dispatch::Dispatch;
use crate::error::BotResult;
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::config::{self, fallible_validator, valid_bool, valid_parseable};
use crate::modules::hook;
use crate::modules::privilege::require_admin;
use crate::modules::Module;
use crate::pollers::arcdps::{current_version, ArcDpsPoller, DOWNLOAD_URL};
use crate::pollers::build::{BuildPoller, CHECK_DELAY_STATE};
use crate::pollers::news::NewsPoller;
use crate::pollers::{Looper, Subscription, ARCDPS, NEWS, UPDATES};

use super::CATEGORY;

/// Shortest delay between build checks the owner may set.
pub const MIN_CHECK_DELAY: u64 = 60;

/// What to say when a subscription changes.
pub struct ToggleReplies {
    pub on: &'static str,
    pub off: &'static str,
    /// Posted in a channel once it's chosen.
    pub posted_here: &'static str,
}

/// Config values for a subscription's toggle and channel.
pub fn subscription_values(sub: &Subscription) -> Vec<config::Value> {
    vec![
        config::Value::new(sub.toggle, "Whether this server gets these announcements.", valid_bool, Some("false")),
        config::Value::new(sub.channel, "The channel these announcements go to.", valid_parseable::<u64>, Option::<String>::None),
    ]
}

/// Sets the announcement channel for this guild, and says hello in it.
pub fn set_channel(disp: &Dispatch, ctx: &Context, msg: &Message, sub: &Subscription, arg: &str, replies: &ToggleReplies) -> Result<()> {
    let guild = msg.guild_id.ok_or(hook::Error::Denied)?;
    let channel = match channel_arg(arg) {
        Some(c) => c,
        None => return user_error("That's not a channel. Mention it like #channel.")
    };
    let in_guild = channel.to_channel_cached(ctx)
        .and_then(|c| c.guild())
        .map_or(false, |gc| gc.read().guild_id == guild);
    if !in_guild {
        return user_error("I can't find that channel on this server.");
    }

    let conn = get_cached_connection(guild)?;
    disp.set_config(&conn.borrow(), sub.channel, &channel.0.to_string())?;
    channel.say(ctx, replies.posted_here)?;
    msg.channel_id.say(ctx, format!("Channel set to {}", channel.mention()))?;
    Ok(())
}

/// Turns this guild's announcements on or off.
pub fn toggle(disp: &Dispatch, ctx: &Context, msg: &Message, sub: &Subscription, on: bool, replies: &ToggleReplies) -> Result<()> {
    let guild = msg.guild_id.ok_or(hook::Error::Denied)?;
    let conn = get_cached_connection(guild)?;
    let rc = conn.borrow();
    disp.set_config(&rc, sub.toggle, &on.to_string())?;
    let mut reply = if on { replies.on } else { replies.off }.to_string();
    if on && rc.get_value(sub.channel)?.is_none() {
        reply.push_str(". Pick a channel for them with the channel subcommand.");
    }
    msg.channel_id.say(ctx, reply)?;
    Ok(())
}

fn channel_subcommand(about: &'static str) -> App<'static, 'static> {
    SubCommand::with_name("channel")
        .about(about)
        .arg(Arg::with_name("channel")
            .help("A channel mention or ID.")
            .required(true))
}

fn toggle_subcommand(about: &'static str) -> App<'static, 'static> {
    SubCommand::with_name("toggle")
        .about(about)
        .arg(Arg::with_name("on")
            .help("true or false.")
            .required(true)
            .validator(fallible_validator::<bool, _>))
}

/// Handles `channel` and `toggle`; anything else is left to the caller.
fn subscription_subcommand(disp: &Dispatch, ctx: &Context, msg: &Message, m: &ArgMatches, sub: &Subscription, replies: &ToggleReplies) -> Option<Result<()>> {
    match m.subcommand() {
        ("channel", Some(s)) => Some(set_channel(disp, ctx, msg, sub, s.value_of("channel").unwrap_or_default(), replies)),
        ("toggle", Some(s)) => Some(toggle(disp, ctx, msg, sub, s.value_of("on") == Some("true"), replies)),
        _ => None
    }
}

fn with_subscription(module: Module, sub: &Subscription) -> Module {
    subscription_values(sub).into_iter().fold(module, Module::with_config_value)
}

const UPDATES_ABOUT: &str = "Announces new Guild Wars 2 builds.";
const UPDATE_REPLIES: ToggleReplies = ToggleReplies {
    on: "I will notify you on this server about new builds",
    off: "I will not send notifications about new builds",
    posted_here: "New game builds will be announced in this channel.",
};

pub struct UpdateNotifier;

impl Command for UpdateNotifier {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("updatenotifier", args, &self.parser())?;
        if let Some(r) = subscription_subcommand(disp, ctx, msg, &m, &UPDATES, &UPDATE_REPLIES) {
            return r;
        }
        match m.subcommand() {
            ("checkdelay", Some(s)) => {
                if msg.author.id != disp.owner() {
                    return Err(Error::InsufficientUserPerms(msg.author.id));
                }
                let delay = parse_value::<u64>(s, "seconds")?.unwrap_or_default();
                if delay < MIN_CHECK_DELAY {
                    return user_error(format!("The delay must be at least {} seconds.", MIN_CHECK_DELAY));
                }
                global_connection()?.set_state(CHECK_DELAY_STATE, &delay.to_string())?;
                info!("Build check delay set to {} seconds.", delay);
                msg.channel_id.say(ctx, "Delay updated.")?;
                Ok(())
            }
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("updatenotifier")
            .about(UPDATES_ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(channel_subcommand("Sets the channel new builds are announced in."))
            .subcommand(toggle_subcommand("Turns build announcements on or off."))
            .subcommand(SubCommand::with_name("checkdelay")
                .about("Sets how often the game build is checked, for every server. Bot owner only.")
                .arg(Arg::with_name("seconds")
                    .required(true)))
    }
}

fn start_build_poller(_disp: &Dispatch, ctx: &Context) -> BotResult<()> {
    BuildPoller::new(ctx).start()?;
    Ok(())
}

pub fn update_notifier_module() -> Module {
    let module = Module::with_name("updatenotifier")
        .with_description(UPDATES_ABOUT)
        .with_category(CATEGORY)
        .with_command(UpdateNotifier)
        .with_ready_hook(start_build_poller);
    with_subscription(module, &UPDATES)
}

const NEWS_ABOUT: &str = "Posts new articles from guildwars2.com.";
const NEWS_REPLIES: ToggleReplies = ToggleReplies {
    on: "I will send news from guildwars2.com",
    off: "I will not send notifications about news",
    posted_here: "News from guildwars2.com will be posted in this channel.",
};

/// The reply to a forced news check that posted `posted` articles.
pub fn forced_news_reply(posted: usize) -> &'static str {
    if posted == 0 {
        "There are no new articles to post."
    } else {
        "Attempted to post news"
    }
}

pub struct NewsFeed;

impl NewsFeed {
    fn force(&self, disp: &Dispatch, ctx: &Context, msg: &Message) -> Result<()> {
        if msg.author.id != disp.owner() {
            return Err(Error::InsufficientUserPerms(msg.author.id));
        }
        match NewsPoller::new(ctx).check() {
            Ok(posted) => {
                msg.channel_id.say(ctx, forced_news_reply(posted))?;
                Ok(())
            }
            Err(e) => user_error(format!("News notifier has encountered an exception: {}", e))
        }
    }
}

impl Command for NewsFeed {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("newsfeed", args, &self.parser())?;
        if let ("force", _) = m.subcommand() {
            return self.force(disp, ctx, msg);
        }
        subscription_subcommand(disp, ctx, msg, &m, &NEWS, &NEWS_REPLIES)
            .unwrap_or(Err(Error::Other))
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("newsfeed")
            .about(NEWS_ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(channel_subcommand("Sets the channel news is posted in."))
            .subcommand(toggle_subcommand("Turns news on or off."))
            .subcommand(SubCommand::with_name("force")
                .about("Checks the news feed now and posts anything new to every server. Bot owner only."))
    }
}

fn start_news_poller(_disp: &Dispatch, ctx: &Context) -> BotResult<()> {
    NewsPoller::new(ctx).start()?;
    Ok(())
}

pub fn news_feed_module() -> Module {
    let module = Module::with_name("newsfeed")
        .with_description(NEWS_ABOUT)
        .with_category(CATEGORY)
        .with_command(NewsFeed)
        .with_ready_hook(start_news_poller);
    with_subscription(module, &NEWS)
}

const ARCDPS_ABOUT: &str = "Checks for and announces ArcDPS updates.";
const ARCDPS_REPLIES: ToggleReplies = ToggleReplies {
    on: "I will send ArcDPS updates",
    off: "I will not send notifications about ArcDPS updates",
    posted_here: "ArcDPS updates will be posted in this channel.",
};

pub struct ArcDps;

impl Command for ArcDps {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("arcdps", args, &self.parser())?;
        if let ("check", _) = m.subcommand() {
            let version = current_version().map_err(Error::Backend)?;
            msg.channel_id.say(ctx, format!("The current ArcDPS version is {}. Link: {}", version, DOWNLOAD_URL))?;
            return Ok(());
        }

        require_admin(ctx, msg)?;
        subscription_subcommand(disp, ctx, msg, &m, &ARCDPS, &ARCDPS_REPLIES)
            .unwrap_or(Err(Error::Other))
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("arcdps")
            .about(ARCDPS_ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("check")
                .about("Shows the current ArcDPS version."))
            .subcommand(channel_subcommand("Sets the channel ArcDPS updates are posted in. Admins only."))
            .subcommand(toggle_subcommand("Turns ArcDPS announcements on or off. Admins only."))
    }
}

fn start_arcdps_poller(_disp: &Dispatch, ctx: &Context) -> BotResult<()> {
    ArcDpsPoller::new(ctx).start()?;
    Ok(())
}

pub fn arcdps_module() -> Module {
    let module = Module::with_name("arcdps")
        .with_description(ARCDPS_ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_dependency("privilege")
        .with_command(ArcDps)
        .with_ready_hook(start_arcdps_poller);
    with_subscription(module, &ARCDPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_config() {
        let values = subscription_values(&NEWS);
        assert_eq!(values[0].name(), "news");
        assert_eq!(values[0].default().map(String::as_str), Some("false"));
        assert!(values[0].is_valid("true"));
        assert!(!values[0].is_valid("yes"));
        assert_eq!(values[1].name(), "news_channel");
        assert!(values[1].is_valid("81384788765712384"));
        assert!(!values[1].is_valid("#news"));
    }

    #[test]
    fn forced_news() {
        assert_eq!(forced_news_reply(0), "There are no new articles to post.");
        assert_eq!(forced_news_reply(2), "Attempted to post news");
        let m = NewsFeed.parser().get_matches_from_safe(vec!["newsfeed", "force"]).unwrap();
        assert_eq!(m.subcommand_name(), Some("force"));
    }
}
