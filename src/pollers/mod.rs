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

//! Background pollers that watch the game and its surroundings, and announce changes to the
//! servers that asked for them.
//!
//! Each poller is a [Looper] running on its own thread. Pollers are started from ready hooks, so
//! they never start twice.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serenity::cache::CacheRwLock;
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Context;

use crate::db::cache::get_cached_connection;
use crate::error::BotError;

pub mod arcdps;
pub mod build;
pub mod daily;
pub mod gem;
pub mod news;

/// Errors starting a poller.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The thread couldn't be spawned.
    #[error("Couldn't start a poller thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl BotError for Error {
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Something done over and over on a dedicated thread.
pub trait Looper: Sized + Send + 'static {
    /// Thread name, also used in logs.
    const NAME: &'static str;

    /// How long to sleep after each run.
    fn interval(&self) -> Duration;

    /// One run. Errors are logged and the loop carries on.
    fn loop_func(&mut self) -> anyhow::Result<()>;

    /// Spawns the loop.
    fn start(mut self) -> Result<JoinHandle<()>, Error> {
        info!("Starting the {} poller.", Self::NAME);
        let handle = thread::Builder::new()
            .name(Self::NAME.to_string())
            .spawn(move || loop {
                if let Err(e) = self.loop_func() {
                    error!("{} Error: {:?}", Self::NAME, e);
                }
                thread::sleep(self.interval());
            })?;
        Ok(handle)
    }
}

/// A pair of per-guild config keys: whether a server wants some announcement, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub toggle: &'static str,
    pub channel: &'static str,
}

pub const UPDATES: Subscription = Subscription { toggle: "update_notify", channel: "update_notify_channel" };
pub const DAILIES: Subscription = Subscription { toggle: "daily_notify", channel: "daily_notify_channel" };
pub const NEWS: Subscription = Subscription { toggle: "news", channel: "news_channel" };
pub const ARCDPS: Subscription = Subscription { toggle: "arcdps", channel: "arcdps_channel" };

impl Subscription {
    pub fn enabled(&self, guild: GuildId) -> crate::db::Result<bool> {
        get_cached_connection(guild)?.borrow().flag(self.toggle)
    }

    /// The channel a guild wants announcements in, if the guild has them turned on.
    pub fn channel_for(&self, guild: GuildId) -> crate::db::Result<Option<ChannelId>> {
        let conn = get_cached_connection(guild)?;
        let rc = conn.borrow();
        if !rc.flag(self.toggle)? {
            return Ok(None);
        }
        Ok(rc.get_value(self.channel)?
            .and_then(|v| v.parse::<u64>().ok())
            .map(ChannelId))
    }
}

/// What a poller needs from Discord: a way to send, and the guild list.
#[derive(Clone)]
pub struct Discord {
    pub http: Arc<Http>,
    cache: CacheRwLock,
}

impl From<&Context> for Discord {
    fn from(ctx: &Context) -> Self {
        Discord { http: ctx.http.clone(), cache: ctx.cache.clone() }
    }
}

impl Discord {
    /// Every guild the bot is in.
    pub fn guilds(&self) -> Vec<GuildId> {
        self.cache.read().guilds.keys().copied().collect()
    }

    /// Channels of every guild subscribed to `sub`. Guilds whose settings can't be read are
    /// skipped.
    pub fn subscribers(&self, sub: &Subscription) -> Vec<ChannelId> {
        self.guilds().into_iter()
            .filter_map(|g| match sub.channel_for(g) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Couldn't read {} settings for guild {}: {}", sub.toggle, g, e);
                    None
                }
            })
            .collect()
    }

    /// Runs `f` for every subscribed channel. Failures in one channel don't stop the rest.
    pub fn announce<F>(&self, sub: &Subscription, f: F)
        where F: Fn(&Http, ChannelId) -> serenity::Result<()> {
        let channels = self.subscribers(sub);
        debug!("Announcing to {} channels subscribed to {}.", channels.len(), sub.toggle);
        for c in channels {
            if let Err(e) = f(&self.http, c) {
                warn!("Couldn't announce in channel {}: {}", c, e);
            }
        }
    }

    /// Sends the same text to every subscribed channel.
    pub fn announce_text(&self, sub: &Subscription, text: &str) {
        self.announce(sub, |http, c| c.say(http, text).map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriptions_are_distinct() {
        let all = [UPDATES, DAILIES, NEWS, ARCDPS];
        let mut keys: Vec<&str> = all.iter().flat_map(|s| vec![s.toggle, s.channel]).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 8);
    }
}
