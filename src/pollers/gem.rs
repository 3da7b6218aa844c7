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

//! Tells users when gems get as cheap as they asked for.

use std::time::Duration;

use serenity::model::misc::Mentionable;
use serenity::model::id::UserId;
use serenity::prelude::Context;

use crate::db::global::global_connection;
use crate::gw2::client;
use crate::gw2::coins::gold_to_coins;
use crate::gw2::model::GemExchange;

use super::{Discord, Looper};

/// Gems in a watched bundle.
pub const WATCHED_GEMS: u64 = 400;

/// The exchange is queried with a large amount so the rate isn't skewed by small trades.
pub const EXCHANGE_ENDPOINT: &str = "commerce/exchange/coins?quantity=10000000";

/// Current price of `gems` gems, in copper.
pub fn gem_price(gems: u64) -> crate::gw2::Result<u64> {
    let rate: GemExchange = client().get(EXCHANGE_ENDPOINT)?;
    Ok(rate.coins_per_gem * gems)
}

/// Watches that should fire at `price`, as `(user, target)`.
pub fn triggered(watches: &[(UserId, u64)], price: u64) -> Vec<(UserId, u64)> {
    watches.iter()
        .filter(|(_, target)| *target > price)
        .copied()
        .collect()
}

pub fn notification(user: UserId, target: u64, price: u64) -> String {
    format!("Hey, {}! You asked to be notified when {} gems were cheaper than {}. Guess what? They're now only {}!",
            user.mention(), WATCHED_GEMS, gold_to_coins(target), gold_to_coins(price))
}

pub struct GemPoller {
    discord: Discord,
}

impl GemPoller {
    pub fn new(ctx: &Context) -> Self {
        GemPoller { discord: Discord::from(ctx) }
    }
}

impl Looper for GemPoller {
    const NAME: &'static str = "gem-tracker";

    fn interval(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn loop_func(&mut self) -> anyhow::Result<()> {
        let conn = global_connection()?;
        let watches = conn.gem_watches()?;
        if watches.is_empty() {
            return Ok(());
        }

        let price = gem_price(WATCHED_GEMS)?;
        for (user, target) in triggered(&watches, price) {
            let sent = user.create_dm_channel(&*self.discord.http)
                .and_then(|dm| dm.say(&*self.discord.http, notification(user, target, price)));
            match sent {
                Ok(_) => {
                    debug!("Told {} that gems dropped to {}", user, price);
                    conn.remove_gem_watch(user)?;
                }
                Err(e) => warn!("Couldn't DM {} about gem prices: {}", user, e)
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watches_fire_below_target() {
        let watches = vec![(UserId(1), 1_000_000), (UserId(2), 500_000), (UserId(3), 750_000)];
        assert_eq!(triggered(&watches, 750_000), vec![(UserId(1), 1_000_000)]);
        assert!(triggered(&watches, 2_000_000).is_empty());
    }

    #[test]
    fn message() {
        assert_eq!(notification(UserId(42), 1_000_000, 937_600),
                   "Hey, <@42>! You asked to be notified when 400 gems were cheaper than 100g. Guess what? They're now only 93g 76s!");
    }
}
