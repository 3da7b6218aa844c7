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

//! One-shot replies a command waits for, like a confirmation or a choice from a list.
//!
//! A pending reply is keyed by channel and user. The next message from that user in that channel
//! goes to the pending handler instead of command parsing. If nothing arrives before the
//! deadline, a timeout message is posted instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, UserId};
use serenity::prelude::Context;

use crate::dispatch::Dispatch;
use crate::error::BotResult;
use crate::util::LogErrorExt;

/// Handles the reply once it arrives.
pub type ReplyHandler = Box<dyn FnOnce(&Dispatch, &Context, &Message) -> BotResult<()> + Send>;

struct Pending {
    token: u64,
    deadline: Instant,
    handler: ReplyHandler,
}

/// Every reply currently being waited on.
#[derive(Default)]
pub struct PendingReplies {
    next_token: AtomicU64,
    waiting: Mutex<HashMap<(ChannelId, UserId), Pending>>,
}

impl PendingReplies {
    /// Creates an empty set of pending replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts waiting for `user` to say something in `channel`. Replaces anything already
    /// pending for that pair. Returns a token identifying this wait.
    pub fn register(&self, channel: ChannelId, user: UserId, timeout: Duration, handler: ReplyHandler) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let pending = Pending { token, deadline: Instant::now() + timeout, handler };
        self.waiting.lock().insert((channel, user), pending);
        token
    }

    /// Like [PendingReplies::register], but posts `timeout_message` in the channel if the user
    /// doesn't answer in time.
    pub fn expect_reply(self: &Arc<Self>,
                        http: Arc<Http>,
                        channel: ChannelId,
                        user: UserId,
                        timeout: Duration,
                        timeout_message: impl Into<String>,
                        handler: ReplyHandler) {
        let token = self.register(channel, user, timeout, handler);
        let this = Arc::clone(self);
        let timeout_message = timeout_message.into();
        let spawned = thread::Builder::new()
            .name("pending-reply".to_string())
            .spawn(move || {
                thread::sleep(timeout);
                if this.expire(channel, user, token) {
                    debug!("Reply from {} in {} timed out.", user, channel);
                    channel.say(&http, &timeout_message).log_error();
                }
            });
        if let Err(e) = spawned {
            error!("Couldn't start reply timeout thread: {}", e);
        }
    }

    /// Removes the wait identified by `token` if it's still there. Returns whether it was.
    pub fn expire(&self, channel: ChannelId, user: UserId, token: u64) -> bool {
        let mut waiting = self.waiting.lock();
        match waiting.get(&(channel, user)) {
            Some(p) if p.token == token => {
                waiting.remove(&(channel, user));
                true
            }
            _ => false
        }
    }

    /// Takes the handler waiting on this user and channel, if it hasn't expired.
    pub fn take(&self, channel: ChannelId, user: UserId) -> Option<ReplyHandler> {
        let mut waiting = self.waiting.lock();
        let live = waiting.get(&(channel, user))
            .map_or(false, |p| p.deadline > Instant::now());
        if live {
            waiting.remove(&(channel, user)).map(|p| p.handler)
        } else {
            // Expired entries are left for the timeout thread so it still posts its message.
            None
        }
    }

    /// Number of replies being waited on.
    pub fn len(&self) -> usize {
        self.waiting.lock().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> ReplyHandler {
        Box::new(|_, _, _| Ok(()))
    }

    #[test]
    fn take_once() {
        let p = PendingReplies::new();
        let (c, u) = (ChannelId(1), UserId(2));
        p.register(c, u, Duration::from_secs(45), noop());
        assert!(p.take(c, UserId(3)).is_none());
        assert!(p.take(c, u).is_some());
        assert!(p.take(c, u).is_none());
    }

    #[test]
    fn expired_replies_are_not_taken() {
        let p = PendingReplies::new();
        let (c, u) = (ChannelId(1), UserId(2));
        let token = p.register(c, u, Duration::from_millis(0), noop());
        thread::sleep(Duration::from_millis(5));
        assert!(p.take(c, u).is_none());
        assert!(p.expire(c, u, token));
        assert!(p.is_empty());
    }

    #[test]
    fn replaced_waits_keep_the_newest() {
        let p = PendingReplies::new();
        let (c, u) = (ChannelId(1), UserId(2));
        let old = p.register(c, u, Duration::from_secs(45), noop());
        let new = p.register(c, u, Duration::from_secs(45), noop());
        assert!(!p.expire(c, u, old));
        assert_eq!(p.len(), 1);
        assert!(p.expire(c, u, new));
    }
}
