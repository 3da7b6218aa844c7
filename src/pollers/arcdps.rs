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

//! Announces ArcDPS releases.

use std::time::Duration;

use serenity::prelude::Context;

use crate::db::global::global_connection;
use crate::gw2::feeds::arcdps_version;
use crate::gw2::{client, ARCDPS_URL};

use super::{Discord, Looper, ARCDPS};

const VERSION_STATE: &str = "arcdps";

/// Where the x64 build can be downloaded.
pub const DOWNLOAD_URL: &str = "https://www.deltaconnected.com/arcdps/x64/";

pub fn announcement(version: &str) -> String {
    format!("ArcDPS has been updated. {} Link: {}", version, DOWNLOAD_URL)
}

/// The version currently on the download page.
pub fn current_version() -> anyhow::Result<String> {
    let page = client().fetch_page(ARCDPS_URL)?;
    arcdps_version(&page).ok_or_else(|| anyhow::anyhow!("No version found on the ArcDPS page"))
}

pub struct ArcDpsPoller {
    discord: Discord,
}

impl ArcDpsPoller {
    pub fn new(ctx: &Context) -> Self {
        ArcDpsPoller { discord: Discord::from(ctx) }
    }
}

impl Looper for ArcDpsPoller {
    const NAME: &'static str = "arcdps-poller";

    fn interval(&self) -> Duration {
        Duration::from_secs(600)
    }

    fn loop_func(&mut self) -> anyhow::Result<()> {
        let version = current_version()?;
        let conn = global_connection()?;
        let last = conn.state(VERSION_STATE)?;
        if last.as_deref() == Some(version.as_str()) {
            return Ok(());
        }

        conn.set_state(VERSION_STATE, &version)?;
        if last.is_some() {
            info!("ArcDPS updated to {}", version);
            self.discord.announce_text(&ARCDPS, &announcement(&version));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message() {
        assert_eq!(announcement("Jun 01 2021"),
                   "ArcDPS has been updated. Jun 01 2021 Link: https://www.deltaconnected.com/arcdps/x64/");
    }
}
