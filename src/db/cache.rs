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

//! Per-thread LRU cache of guild database connections.

use std::cell::RefCell;
use std::rc::Rc;

use lru_cache::LruCache;
use once_cell::sync::Lazy;
use once_cell::unsync::Lazy as UnsyncLazy;
use serenity::model::prelude::GuildId;

use crate::db::{ensure_guild_db_in_data_dir, GuildConn};

const DEFAULT_CACHED_CONNECTIONS: usize = 16;

/// How many guild connections each thread keeps open, from `TYRIABOT_DB_CONN_PER_THREAD`.
pub static NUM_CACHED_CONNECTIONS: Lazy<usize> = Lazy::new(
    || match std::env::var("TYRIABOT_DB_CONN_PER_THREAD") {
        Ok(v) => v.parse::<usize>().unwrap_or_else(|_| {
            warn!("TYRIABOT_DB_CONN_PER_THREAD must be a valid usize, using {}.", DEFAULT_CACHED_CONNECTIONS);
            DEFAULT_CACHED_CONNECTIONS
        }),
        Err(_) => DEFAULT_CACHED_CONNECTIONS
    }.max(1)
);

thread_local! {
    static CONNECTION_CACHE: UnsyncLazy<RefCell<LruCache<GuildId, Rc<RefCell<GuildConn>>>>> = UnsyncLazy::new(
        || RefCell::new(LruCache::new(*NUM_CACHED_CONNECTIONS))
    );
}

/// Returns this thread's connection to the guild's database, opening and migrating it if needed.
pub fn get_cached_connection(g: GuildId) -> super::Result<Rc<RefCell<GuildConn>>> {
    CONNECTION_CACHE.with(
        |cache| {
            let mut cache_ref = cache.borrow_mut();
            match cache_ref.get_mut(&g) {
                None => {
                    trace!("Opening database for guild {}", g);
                    let out = Rc::new(
                        RefCell::new(
                            ensure_guild_db_in_data_dir(g)?
                        )
                    );

                    cache_ref.insert(g, out.clone());
                    Ok(out)
                }
                Some(rc) => Ok(rc.clone()),
            }
        }
    )
}
