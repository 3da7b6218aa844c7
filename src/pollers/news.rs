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

//! Posts new articles from the official news feed.

use std::time::Duration;

use serenity::prelude::Context;
use serenity::utils::Colour;

use crate::db::global::global_connection;
use crate::gw2::feeds::{new_posts, parse_news, NewsItem};
use crate::gw2::{client, NEWS_FEED_URL};
use crate::util::truncate_with_ellipsis;

use super::{Discord, Looper, NEWS};

const TITLES_STATE: &str = "news_titles";
const NEWS_COLOUR: u32 = 0xc12d2b;
const MAX_DESCRIPTION: usize = 2000;

pub struct NewsPoller {
    discord: Discord,
}

impl NewsPoller {
    pub fn new(ctx: &Context) -> Self {
        NewsPoller { discord: Discord::from(ctx) }
    }

    fn post(&self, item: &NewsItem) {
        self.discord.announce(&NEWS, |http, c| c.send_message(http, |m| m.embed(|e| e
            .title(&item.title)
            .url(&item.link)
            .description(truncate_with_ellipsis(&item.description, MAX_DESCRIPTION))
            .colour(Colour::new(NEWS_COLOUR))))
            .map(|_| ()));
    }
}

impl NewsPoller {
    /// Posts every article not seen on the last check, returning how many there were.
    pub fn check(&self) -> anyhow::Result<usize> {
        let feed = client().fetch_page(NEWS_FEED_URL)?;
        let items = parse_news(&feed)?;
        if items.is_empty() {
            warn!("The news feed had no items.");
            return Ok(0);
        }

        let conn = global_connection()?;
        let seen: Option<Vec<String>> = conn.state(TITLES_STATE)?
            .and_then(|s| serde_json::from_str(&s).ok());
        let fresh = new_posts(&items, seen.as_deref());
        for item in &fresh {
            info!("New article: {}", item.title);
            self.post(item);
        }

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        conn.set_state(TITLES_STATE, &serde_json::to_string(&titles)?)?;
        Ok(fresh.len())
    }
}

impl Looper for NewsPoller {
    const NAME: &'static str = "news-poller";

    fn interval(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn loop_func(&mut self) -> anyhow::Result<()> {
        self.check()?;
        Ok(())
    }
}
