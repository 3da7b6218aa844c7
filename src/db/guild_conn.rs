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

//! A connection to one guild's database.

use rusqlite::{Connection, OptionalExtension};
use serenity::model::id::GuildId;

/// Wraps a migrated connection to a guild's database along with the guild it belongs to.
pub struct GuildConn {
    guild: GuildId,
    conn: Connection,
}

impl GuildConn {
    /// Wraps an already-migrated connection.
    pub fn new(guild: GuildId, conn: Connection) -> Self {
        GuildConn { guild, conn }
    }

    /// The guild this database belongs to.
    pub fn as_id(&self) -> GuildId {
        self.guild
    }

    /// Reads a raw config value.
    pub fn get_value(&self, key: &str) -> super::Result<Option<String>> {
        let v = self.conn.query_row(
            "SELECT value FROM config_values WHERE name = ?;",
            params![key],
            |r| r.get(0),
        ).optional()?;
        Ok(v)
    }

    /// Writes a raw config value without validating it.
    pub fn set_value(&self, key: &str, value: &str) -> super::Result<()> {
        self.conn.execute(
            "INSERT INTO config_values (name, value) VALUES (?1, ?2)
             ON CONFLICT (name) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }

    /// Removes a config value.
    pub fn unset_value(&self, key: &str) -> super::Result<()> {
        self.conn.execute("DELETE FROM config_values WHERE name = ?;", params![key])?;
        Ok(())
    }

    /// Reads a boolean flag, treating anything unset or unparseable as false.
    pub fn flag(&self, key: &str) -> super::Result<bool> {
        Ok(self.get_value(key)?
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false))
    }

    /// Retrieves the command prefix for the guild.
    pub fn command_prefix(&self) -> super::Result<char> {
        Ok(self.get_value(COMMAND_PREFIX_KEY)?
            .and_then(|s| s.chars().next())
            .unwrap_or(DEFAULT_COMMAND_PREFIX))
    }

    /// Sets the command prefix to the given character.
    pub fn set_command_prefix(&self, cmd: char) -> super::Result<()> {
        self.set_value(COMMAND_PREFIX_KEY, &cmd.to_string())
    }
}

/// Config key holding the command prefix.
pub const COMMAND_PREFIX_KEY: &str = "command_prefix";
/// Prefix used when a guild hasn't picked one, and in DMs.
pub const DEFAULT_COMMAND_PREFIX: char = '!';

impl AsRef<Connection> for GuildConn {
    fn as_ref(&self) -> &Connection {
        &self.conn
    }
}

impl AsMut<Connection> for GuildConn {
    fn as_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;
    use crate::db::open_guild_db;

    #[test]
    fn config_values_round_trip() {
        let dir = TempDir::new("guild_conn").unwrap();
        let conn = open_guild_db(dir.path(), GuildId::from(42)).unwrap();
        assert_eq!(conn.command_prefix().unwrap(), '!');
        conn.set_command_prefix('$').unwrap();
        assert_eq!(conn.command_prefix().unwrap(), '$');

        assert!(!conn.flag("raid_protected").unwrap());
        conn.set_value("raid_protected", "true").unwrap();
        assert!(conn.flag("raid_protected").unwrap());
        conn.unset_value("raid_protected").unwrap();
        assert_eq!(conn.get_value("raid_protected").unwrap(), None);
    }
}
