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

//! Reading and writing validated per-guild config values.

use std::str::FromStr;

use crate::db::GuildConn;
use crate::dispatch::Dispatch;
use crate::modules::config::{Error, Result, Validator};

impl Dispatch {
    /// The registry of every config value the loaded modules declared.
    pub fn config_validator(&self) -> &Validator {
        &self.config_validator
    }

    /// Reads a config value, falling back to its default.
    pub fn get_config(&self, conn: &GuildConn, key: &str) -> Result<String> {
        self.config_validator.check_key(key)?;
        match conn.get_value(key)? {
            Some(v) => Ok(v),
            None => self.config_validator.default_for(key)
                .map(Clone::clone)
                .map_err(|_| Error::NotSet(key.to_string()))
        }
    }

    /// Reads a config value and parses it.
    pub fn config_value<T: FromStr>(&self, conn: &GuildConn, key: &'static str) -> Result<T> {
        self.get_config(conn, key)?
            .parse::<T>()
            .map_err(|_| Error::InvalidValue(key))
    }

    /// Validates and stores a config value.
    pub fn set_config(&self, conn: &GuildConn, key: &str, value: &str) -> Result<()> {
        self.config_validator.validate(key, value)?;
        conn.set_value(key, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::model::id::{GuildId, UserId};
    use tempdir::TempDir;
    use crate::db::open_guild_db;
    use crate::modules::raid_protect::{raid_protect_module, RAID_MEMBERS_KEY};

    #[test]
    fn defaults_and_validation() {
        let dir = TempDir::new("dispatch_config").unwrap();
        let conn = open_guild_db(dir.path(), GuildId::from(7)).unwrap();
        let disp = Dispatch::new(UserId::from(1)).with_module(raid_protect_module());

        assert_eq!(disp.config_value::<u32>(&conn, RAID_MEMBERS_KEY).unwrap(), 4);
        disp.set_config(&conn, RAID_MEMBERS_KEY, "9").unwrap();
        assert_eq!(disp.config_value::<u32>(&conn, RAID_MEMBERS_KEY).unwrap(), 9);
        assert!(matches!(disp.set_config(&conn, RAID_MEMBERS_KEY, "many"), Err(Error::InvalidValue(_))));
        assert!(matches!(disp.get_config(&conn, "bogus"), Err(Error::NoSuchKey(_))));
    }
}
