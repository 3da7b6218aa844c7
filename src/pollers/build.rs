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

//! Announces new game builds.

use std::time::Duration;

use serenity::prelude::Context;

use crate::db::global::global_connection;
use crate::gw2::client;
use crate::gw2::model::Build;

use super::{Discord, Looper, UPDATES};

/// Global state key for the seconds between build checks.
pub const CHECK_DELAY_STATE: &str = "check_delay";
pub const DEFAULT_CHECK_DELAY: u64 = 300;
const BUILD_STATE: &str = "build";

pub fn announcement(build: u64) -> String {
    format!("Guild Wars 2 has just updated! New build: `{}`", build)
}

/// Whether `current` is news, given the last build seen. Nothing is news the first time.
pub fn is_new_build(last: Option<&str>, current: u64) -> bool {
    match last.and_then(|l| l.parse::<u64>().ok()) {
        Some(l) => l != current,
        None => false
    }
}

pub struct BuildPoller {
    discord: Discord,
}

impl BuildPoller {
    pub fn new(ctx: &Context) -> Self {
        BuildPoller { discord: Discord::from(ctx) }
    }
}

impl Looper for BuildPoller {
    const NAME: &'static str = "build-poller";

    fn interval(&self) -> Duration {
        let delay = global_connection()
            .and_then(|c| c.state(CHECK_DELAY_STATE))
            .ok()
            .flatten()
            .and_then(|d| d.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CHECK_DELAY);
        Duration::from_secs(delay)
    }

    fn loop_func(&mut self) -> anyhow::Result<()> {
        let build: Build = client().get("build")?;
        let conn = global_connection()?;
        let last = conn.state(BUILD_STATE)?;
        if last.as_deref() == Some(build.id.to_string().as_str()) {
            return Ok(());
        }

        conn.set_state(BUILD_STATE, &build.id.to_string())?;
        if is_new_build(last.as_deref(), build.id) {
            info!("Game build changed to {}", build.id);
            self.discord.announce_text(&UPDATES, &announcement(build.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_changes() {
        assert!(!is_new_build(None, 115267));
        assert!(!is_new_build(Some("115267"), 115267));
        assert!(is_new_build(Some("115199"), 115267));
        assert_eq!(announcement(115267), "Guild Wars 2 has just updated! New build: `115267`");
    }
}
