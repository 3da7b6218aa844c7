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

//! The bot-wide database: API keys, gem price watches, poller state and the item and skill
//! indexes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use once_cell::unsync::Lazy as UnsyncLazy;
use rusqlite::{Connection, OptionalExtension, Row, NO_PARAMS};
use serenity::model::id::UserId;

use crate::data::ensure_data_folder;
use crate::db::{open_global_db, DatabaseError};
use crate::gw2::model::{Item, Skill};

/// A stored API key with what it's allowed to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// The Discord user who owns the key.
    pub user: UserId,
    /// The key itself.
    pub key: String,
    /// Account name, e.g. `Name.1234`.
    pub account_name: String,
    /// The name the user gave the key.
    pub key_name: String,
    /// Granted scopes.
    pub permissions: Vec<String>,
}

impl ApiKey {
    /// Returns the scopes in `required` that this key lacks.
    pub fn missing_scopes<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required.iter()
            .filter(|s| !self.permissions.iter().any(|p| p == *s))
            .copied()
            .collect()
    }

    /// Whether the key grants `scope`.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.permissions.iter().any(|p| p == scope)
    }

    fn from_row(r: &Row) -> rusqlite::Result<Self> {
        let user: i64 = r.get(0)?;
        let permissions: String = r.get(4)?;
        Ok(ApiKey {
            user: UserId(user as u64),
            key: r.get(1)?,
            account_name: r.get(2)?,
            key_name: r.get(3)?,
            permissions: permissions.split(',')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        })
    }
}

/// A connection to the global database.
pub struct GlobalConn(Connection);

thread_local! {
    static GLOBAL_CONN: UnsyncLazy<RefCell<Option<Rc<GlobalConn>>>> = UnsyncLazy::new(|| RefCell::new(None));
}

/// Returns this thread's connection to the global database, opening it on first use.
pub fn global_connection() -> super::Result<Rc<GlobalConn>> {
    GLOBAL_CONN.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(c) = slot.as_ref() {
            return Ok(c.clone());
        }
        let conn = Rc::new(GlobalConn::open(ensure_data_folder()?.clone())?);
        *slot = Some(conn.clone());
        Ok(conn)
    })
}

const ITEM_COLUMNS: &str = "id, name, item_type, level, rarity, icon, chat_link";

/// A row of one of the indexes `database rebuild` fills from the API.
pub trait IndexRow {
    /// The live table.
    const TABLE: &'static str;
    /// Where a rebuild collects rows before they replace the live table.
    const STAGING: &'static str;

    fn insert_into(&self, conn: &Connection, table: &str) -> rusqlite::Result<()>;
}

impl IndexRow for Item {
    const TABLE: &'static str = "items";
    const STAGING: &'static str = "items_staging";

    fn insert_into(&self, conn: &Connection, table: &str) -> rusqlite::Result<()> {
        conn.execute(
            &format!("INSERT OR REPLACE INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);", table, ITEM_COLUMNS),
            params![self.id as i64, self.name, self.item_type, self.level as i64, self.rarity, self.icon, self.chat_link],
        )?;
        Ok(())
    }
}

impl IndexRow for Skill {
    const TABLE: &'static str = "skills";
    const STAGING: &'static str = "skills_staging";

    fn insert_into(&self, conn: &Connection, table: &str) -> rusqlite::Result<()> {
        let data = serde_json::to_string(self)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        conn.execute(
            &format!("INSERT OR REPLACE INTO {} (id, name, data) VALUES (?1, ?2, ?3);", table),
            params![self.id as i64, self.name, data],
        )?;
        Ok(())
    }
}

fn skill_from_row(r: &Row) -> rusqlite::Result<Skill> {
    let data: String = r.get(0)?;
    serde_json::from_str(&data)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

fn item_from_row(r: &Row) -> rusqlite::Result<Item> {
    let id: i64 = r.get(0)?;
    let level: i64 = r.get(3)?;
    Ok(Item {
        id: id as u64,
        name: r.get(1)?,
        item_type: r.get(2)?,
        level: level as u32,
        rarity: r.get(4)?,
        icon: r.get(5)?,
        chat_link: r.get(6)?,
    })
}

impl GlobalConn {
    /// Opens and migrates the global database in `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> super::Result<Self> {
        Ok(GlobalConn(open_global_db(dir)?))
    }

    /// Looks up a user's key.
    pub fn api_key(&self, user: UserId) -> super::Result<Option<ApiKey>> {
        let k = self.0.query_row(
            "SELECT user_id, api_key, account_name, key_name, permissions FROM api_keys WHERE user_id = ?;",
            params![user.0 as i64],
            ApiKey::from_row,
        ).optional()?;
        Ok(k)
    }

    /// Stores a key. Returns false without touching anything if the user already has one.
    pub fn insert_api_key(&self, key: &ApiKey) -> super::Result<bool> {
        let changed = self.0.execute(
            "INSERT OR IGNORE INTO api_keys (user_id, api_key, account_name, key_name, permissions)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![key.user.0 as i64, key.key, key.account_name, key.key_name, key.permissions.join(",")],
        )?;
        Ok(changed > 0)
    }

    /// Deletes a user's key, returning whether there was one.
    pub fn remove_api_key(&self, user: UserId) -> super::Result<bool> {
        let changed = self.0.execute("DELETE FROM api_keys WHERE user_id = ?;", params![user.0 as i64])?;
        Ok(changed > 0)
    }

    /// Number of users with a stored key.
    pub fn count_api_keys(&self) -> super::Result<u64> {
        let n: i64 = self.0.query_row("SELECT COUNT(*) FROM api_keys;", NO_PARAMS, |r| r.get(0))?;
        Ok(n as u64)
    }

    /// Records (or replaces) a user's gem price watch, in coins.
    pub fn set_gem_watch(&self, user: UserId, price: u64) -> super::Result<()> {
        self.0.execute(
            "INSERT INTO gem_watches (user_id, price) VALUES (?1, ?2)
             ON CONFLICT (user_id) DO UPDATE SET price = excluded.price;",
            params![user.0 as i64, price as i64],
        )?;
        Ok(())
    }

    /// Every active gem watch.
    pub fn gem_watches(&self) -> super::Result<Vec<(UserId, u64)>> {
        let mut stmt = self.0.prepare("SELECT user_id, price FROM gem_watches;")?;
        let rows = stmt.query_map(NO_PARAMS, |r| {
            let u: i64 = r.get(0)?;
            let p: i64 = r.get(1)?;
            Ok((UserId(u as u64), p as u64))
        })?;
        let out = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(out)
    }

    /// Removes a user's gem watch.
    pub fn remove_gem_watch(&self, user: UserId) -> super::Result<()> {
        self.0.execute("DELETE FROM gem_watches WHERE user_id = ?;", params![user.0 as i64])?;
        Ok(())
    }

    /// Reads a poller state value.
    pub fn state(&self, name: &str) -> super::Result<Option<String>> {
        let v = self.0.query_row(
            "SELECT value FROM poller_state WHERE name = ?;",
            params![name],
            |r| r.get(0),
        ).optional()?;
        Ok(v)
    }

    /// Writes a poller state value.
    pub fn set_state(&self, name: &str, value: &str) -> super::Result<()> {
        self.0.execute(
            "INSERT INTO poller_state (name, value) VALUES (?1, ?2)
             ON CONFLICT (name) DO UPDATE SET value = excluded.value;",
            params![name, value],
        )?;
        Ok(())
    }

    /// Runs `f` in a transaction, rolling back if it fails.
    fn in_transaction<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> super::Result<T> {
        self.0.execute_batch("BEGIN;")?;
        match f(&self.0) {
            Ok(v) => {
                self.0.execute_batch("COMMIT;")?;
                Ok(v)
            }
            Err(e) => {
                self.0.execute_batch("ROLLBACK;")?;
                Err(e.into())
            }
        }
    }

    fn insert_rows<T: IndexRow>(&self, table: &str, rows: &[T]) -> super::Result<()> {
        self.in_transaction(|c| rows.iter().try_for_each(|r| r.insert_into(c, table)))
    }

    /// Adds a batch of items to the live index in a single transaction.
    pub fn insert_items(&self, items: &[Item]) -> super::Result<()> {
        self.insert_rows(Item::TABLE, items)
    }

    /// Adds a batch of skills to the live index in a single transaction.
    pub fn insert_skills(&self, skills: &[Skill]) -> super::Result<()> {
        self.insert_rows(Skill::TABLE, skills)
    }

    /// Replaces an index with the rows from `batches`, returning how many rows it now has.
    ///
    /// Batches are collected in a staging table, and the live table is only swapped out once
    /// the last one has arrived. If any batch fails the live index is left as it was.
    pub fn rebuild_index<T, E>(&self, batches: impl IntoIterator<Item=Result<Vec<T>, E>>) -> Result<u64, E>
        where T: IndexRow,
              E: From<DatabaseError> {
        self.0.execute(&format!("DELETE FROM {};", T::STAGING), NO_PARAMS)
            .map_err(DatabaseError::from)?;

        for batch in batches {
            let staged = batch.and_then(|rows| self.insert_rows(T::STAGING, &rows).map_err(E::from));
            if let Err(e) = staged {
                if let Err(cleanup) = self.0.execute(&format!("DELETE FROM {};", T::STAGING), NO_PARAMS) {
                    warn!("Couldn't empty {} after a failed rebuild: {}", T::STAGING, cleanup);
                }
                return Err(e);
            }
        }

        let n = self.in_transaction(|c| {
            c.execute(&format!("DELETE FROM {};", T::TABLE), NO_PARAMS)?;
            let n = c.execute(&format!("INSERT INTO {} SELECT * FROM {};", T::TABLE, T::STAGING), NO_PARAMS)?;
            c.execute(&format!("DELETE FROM {};", T::STAGING), NO_PARAMS)?;
            Ok(n as u64)
        })?;
        Ok(n)
    }

    /// Number of indexed items.
    pub fn count_items(&self) -> super::Result<u64> {
        let n: i64 = self.0.query_row("SELECT COUNT(*) FROM items;", NO_PARAMS, |r| r.get(0))?;
        Ok(n as u64)
    }

    /// Looks up one item by ID.
    pub fn item(&self, id: u64) -> super::Result<Option<Item>> {
        let i = self.0.query_row(
            &format!("SELECT {} FROM items WHERE id = ?;", ITEM_COLUMNS),
            params![id as i64],
            item_from_row,
        ).optional()?;
        Ok(i)
    }

    /// Items whose name is exactly `name`, ignoring case.
    pub fn items_exactly_named(&self, name: &str) -> super::Result<Vec<Item>> {
        let mut stmt = self.0.prepare(
            &format!("SELECT {} FROM items WHERE name = ?1 COLLATE NOCASE ORDER BY id;", ITEM_COLUMNS)
        )?;
        let rows = stmt.query_map(params![name], item_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of items whose name contains `fragment`, ignoring case.
    pub fn count_items_containing(&self, fragment: &str) -> super::Result<u64> {
        let n: i64 = self.0.query_row(
            "SELECT COUNT(*) FROM items WHERE instr(lower(name), lower(?1)) > 0;",
            params![fragment],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    /// Up to `limit` items whose name contains `fragment`, ignoring case.
    pub fn items_containing(&self, fragment: &str, limit: u32) -> super::Result<Vec<Item>> {
        let mut stmt = self.0.prepare(
            &format!("SELECT {} FROM items WHERE instr(lower(name), lower(?1)) > 0 ORDER BY name, id LIMIT ?2;",
                     ITEM_COLUMNS)
        )?;
        let rows = stmt.query_map(params![fragment, limit as i64], item_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Names for the given item IDs; unknown IDs are left out.
    pub fn item_names(&self, ids: &[u64]) -> super::Result<HashMap<u64, String>> {
        let mut stmt = self.0.prepare("SELECT name FROM items WHERE id = ?;")?;
        let mut out = HashMap::new();
        for id in ids {
            let name: Option<String> = stmt.query_row(params![*id as i64], |r| r.get(0)).optional()?;
            if let Some(n) = name {
                out.insert(*id, n);
            }
        }
        Ok(out)
    }

    /// Number of indexed skills.
    pub fn count_skills(&self) -> super::Result<u64> {
        let n: i64 = self.0.query_row("SELECT COUNT(*) FROM skills;", NO_PARAMS, |r| r.get(0))?;
        Ok(n as u64)
    }

    /// Skills whose name is exactly `name`, ignoring case.
    pub fn skills_exactly_named(&self, name: &str) -> super::Result<Vec<Skill>> {
        let mut stmt = self.0.prepare("SELECT data FROM skills WHERE name = ?1 COLLATE NOCASE ORDER BY id;")?;
        let rows = stmt.query_map(params![name], skill_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of skills whose name contains `fragment`, ignoring case.
    pub fn count_skills_containing(&self, fragment: &str) -> super::Result<u64> {
        let n: i64 = self.0.query_row(
            "SELECT COUNT(*) FROM skills WHERE instr(lower(name), lower(?1)) > 0;",
            params![fragment],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    /// Up to `limit` skills whose name contains `fragment`, ignoring case.
    pub fn skills_containing(&self, fragment: &str, limit: u32) -> super::Result<Vec<Skill>> {
        let mut stmt = self.0.prepare(
            "SELECT data FROM skills WHERE instr(lower(name), lower(?1)) > 0 ORDER BY name, id LIMIT ?2;"
        )?;
        let rows = stmt.query_map(params![fragment, limit as i64], skill_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn item(id: u64, name: &str) -> Item {
        Item {
            id,
            name: name.to_string(),
            item_type: "Trophy".to_string(),
            level: 0,
            rarity: "Exotic".to_string(),
            icon: None,
            chat_link: format!("[&{}]", id),
        }
    }

    fn key(user: u64) -> ApiKey {
        ApiKey {
            user: UserId(user),
            key: "ABC-123".to_string(),
            account_name: "Someone.1234".to_string(),
            key_name: "bot".to_string(),
            permissions: vec!["account".to_string(), "wallet".to_string()],
        }
    }

    #[test]
    fn api_keys() {
        let dir = TempDir::new("global").unwrap();
        let conn = GlobalConn::open(dir.path()).unwrap();
        assert!(conn.api_key(UserId(1)).unwrap().is_none());
        assert!(conn.insert_api_key(&key(1)).unwrap());
        assert!(!conn.insert_api_key(&key(1)).unwrap());
        let k = conn.api_key(UserId(1)).unwrap().unwrap();
        assert_eq!(k, key(1));
        assert_eq!(k.missing_scopes(&["account", "pvp"]), vec!["pvp"]);
        assert_eq!(conn.count_api_keys().unwrap(), 1);
        assert!(conn.remove_api_key(UserId(1)).unwrap());
        assert!(!conn.remove_api_key(UserId(1)).unwrap());
    }

    #[test]
    fn gem_watches_and_state() {
        let dir = TempDir::new("global").unwrap();
        let conn = GlobalConn::open(dir.path()).unwrap();
        conn.set_gem_watch(UserId(5), 1_000_000).unwrap();
        conn.set_gem_watch(UserId(5), 2_000_000).unwrap();
        assert_eq!(conn.gem_watches().unwrap(), vec![(UserId(5), 2_000_000)]);
        conn.remove_gem_watch(UserId(5)).unwrap();
        assert!(conn.gem_watches().unwrap().is_empty());

        assert_eq!(conn.state("build").unwrap(), None);
        conn.set_state("build", "100").unwrap();
        conn.set_state("build", "101").unwrap();
        assert_eq!(conn.state("build").unwrap().as_deref(), Some("101"));
    }

    #[test]
    fn item_index() {
        let dir = TempDir::new("global").unwrap();
        let conn = GlobalConn::open(dir.path()).unwrap();
        conn.insert_items(&[item(1, "Mystic Coin"), item(2, "Mystic Clover"), item(3, "Glob of Ectoplasm")]).unwrap();
        assert_eq!(conn.count_items().unwrap(), 3);
        assert_eq!(conn.count_items_containing("mystic").unwrap(), 2);
        assert_eq!(conn.items_containing("MYSTIC", 20).unwrap().len(), 2);
        assert_eq!(conn.items_exactly_named("mystic coin").unwrap()[0].id, 1);
        assert_eq!(conn.item(3).unwrap().unwrap().name, "Glob of Ectoplasm");
        let names = conn.item_names(&[1, 99]).unwrap();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn rebuild_replaces_the_index() {
        let dir = TempDir::new("global").unwrap();
        let conn = GlobalConn::open(dir.path()).unwrap();
        conn.insert_items(&[item(1, "Mystic Coin"), item(99, "Retired Item")]).unwrap();

        let batches: Vec<Result<Vec<Item>, DatabaseError>> = vec![
            Ok(vec![item(1, "Mystic Coin"), item(2, "Mystic Clover")]),
            Ok(vec![item(3, "Glob of Ectoplasm")]),
        ];
        assert_eq!(conn.rebuild_index(batches).unwrap(), 3);
        assert_eq!(conn.count_items().unwrap(), 3);
        assert!(conn.item(99).unwrap().is_none());
        assert_eq!(conn.item(3).unwrap().unwrap().name, "Glob of Ectoplasm");
    }

    #[test]
    fn failed_rebuild_keeps_the_old_index() {
        let dir = TempDir::new("global").unwrap();
        let conn = GlobalConn::open(dir.path()).unwrap();
        conn.insert_items(&[item(1, "Mystic Coin"), item(2, "Mystic Clover")]).unwrap();

        let batches: Vec<Result<Vec<Item>, DatabaseError>> = vec![
            Ok(vec![item(3, "Glob of Ectoplasm")]),
            Err(DatabaseError::TooNew),
            Ok(vec![item(4, "Never Reached")]),
        ];
        assert!(matches!(conn.rebuild_index(batches), Err(DatabaseError::TooNew)));
        assert_eq!(conn.count_items().unwrap(), 2);
        assert_eq!(conn.count_items_containing("mystic").unwrap(), 2);
        assert!(conn.item(3).unwrap().is_none());

        // The next rebuild doesn't pick up rows staged by the failed one.
        let batches: Vec<Result<Vec<Item>, DatabaseError>> = vec![Ok(vec![item(5, "Obsidian Shard")])];
        assert_eq!(conn.rebuild_index(batches).unwrap(), 1);
        assert!(conn.item(3).unwrap().is_none());
    }

    #[test]
    fn skill_index() {
        let dir = TempDir::new("global").unwrap();
        let conn = GlobalConn::open(dir.path()).unwrap();
        let skill: Skill = serde_json::from_str(r#"{
            "id": 5491, "name": "Fireball", "description": "Throw a fireball.",
            "professions": ["Elementalist"],
            "facts": [{"text": "Recharge", "type": "Recharge", "value": 0}]
        }"#).unwrap();
        let batches: Vec<Result<Vec<Skill>, DatabaseError>> = vec![Ok(vec![skill.clone()])];
        assert_eq!(conn.rebuild_index(batches).unwrap(), 1);
        assert_eq!(conn.count_skills().unwrap(), 1);
        assert_eq!(conn.skills_exactly_named("fireball").unwrap(), vec![skill]);
        assert_eq!(conn.count_skills_containing("FIRE").unwrap(), 1);
        assert_eq!(conn.skills_containing("ball", 20).unwrap()[0].id, 5491);
        assert_eq!(conn.count_items().unwrap(), 0);
    }
}
