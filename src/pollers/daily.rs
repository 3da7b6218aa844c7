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

//! Posts the day's dailies shortly after the daily reset.

use std::thread;
use std::time::Duration;

use chrono::{Datelike, Utc};
use serenity::prelude::Context;

use crate::db::global::global_connection;
use crate::modules::gw2::daily::announcement;
use crate::util::say_chunked;

use super::{Discord, Looper, DAILIES};

const RESET_STATE: &str = "reset_day";

/// The API takes a little while to switch over after reset.
const POST_DELAY: Duration = Duration::from_secs(120);

/// Whether a reset happened since `last` was recorded. The first check only records the day.
pub fn is_reset(last: Option<&str>, today: &str) -> bool {
    last.map_or(false, |l| l != today)
}

pub struct DailyPoller {
    discord: Discord,
}

impl DailyPoller {
    pub fn new(ctx: &Context) -> Self {
        DailyPoller { discord: Discord::from(ctx) }
    }
}

impl Looper for DailyPoller {
    const NAME: &'static str = "daily-notifier";

    fn interval(&self) -> Duration {
        Duration::from_secs(60)
    }

    fn loop_func(&mut self) -> anyhow::Result<()> {
        let today = Utc::now().weekday().to_string();
        let last = global_connection()?.state(RESET_STATE)?;
        if last.as_deref() == Some(today.as_str()) {
            return Ok(());
        }

        global_connection()?.set_state(RESET_STATE, &today)?;
        if !is_reset(last.as_deref(), &today) {
            return Ok(());
        }

        info!("Daily reset happened, announcing dailies in {:?}.", POST_DELAY);
        thread::sleep(POST_DELAY);
        let text = announcement()?;
        self.discord.announce(&DAILIES, |http, c| say_chunked(http, c, &text, false));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resets() {
        assert!(!is_reset(None, "Mon"));
        assert!(!is_reset(Some("Mon"), "Mon"));
        assert!(is_reset(Some("Sun"), "Mon"));
    }
}
