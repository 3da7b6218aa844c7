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

//! Database access. Every guild gets its own SQLite file, and one global file holds per-user
//! and bot-wide state. Both are versioned through `PRAGMA user_version` and migrated with
//! embedded SQL scripts.

use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use itertools::Itertools;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior, NO_PARAMS};
use serenity::model::id::GuildId;

use crate::data::{ensure_data_folder, resource_string};
use crate::error::BotError;
use crate::util::string_from_cow;

pub mod args;
pub mod cache;
pub mod global;
pub mod guild_conn;

pub use guild_conn::GuildConn;

/// Errors from the database layer.
#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    /// Something went wrong with the filesystem.
    #[error("An I/O error occurred: {0}")]
    IOError(#[from] io::Error),
    /// SQLite complained.
    #[error("A SQL error occurred: {0}")]
    SQLError(#[from] rusqlite::Error),
    /// The file was written by a newer tyriabot.
    #[error("Database from a newer version of tyriabot.")]
    TooNew,
    /// A bundled SQL script is missing from the binary.
    #[error("Missing bundled SQL script {0}.")]
    MissingScript(String),
}

impl BotError for DatabaseError {
    fn is_user_error(&self) -> bool {
        false
    }
}

impl From<DatabaseError> for crate::modules::commands::Error {
    fn from(e: DatabaseError) -> Self {
        crate::modules::commands::Error::RuntimeFailure(e.into())
    }
}

/// The version of a database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord)]
pub enum DatabaseVersion {
    /// No migrations have been applied.
    Uninitialized,
    /// The index of the last applied migration.
    Version(u32),
}

impl PartialOrd for DatabaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (DatabaseVersion::Uninitialized, DatabaseVersion::Uninitialized) => Some(Ordering::Equal),
            (DatabaseVersion::Uninitialized, DatabaseVersion::Version(_)) => Some(Ordering::Less),
            (DatabaseVersion::Version(_), DatabaseVersion::Uninitialized) => Some(Ordering::Greater),
            (DatabaseVersion::Version(v), DatabaseVersion::Version(ov)) => v.partial_cmp(ov),
        }
    }
}

impl DatabaseVersion {
    /// High bit set once any migration has run.
    pub const INITIALIZE_MASK: u32 = (1 << 31);
    #[doc(hidden)]
    pub const VERSION_MASK: u32 = std::u32::MAX & (!Self::INITIALIZE_MASK);

    /// Index of the migration that would be applied next.
    pub fn next_migration(&self) -> u32 {
        match self {
            DatabaseVersion::Uninitialized => 0,
            DatabaseVersion::Version(v) => v + 1
        }
    }
}

impl fmt::Display for DatabaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseVersion::Uninitialized => write!(f, "uninitialized"),
            DatabaseVersion::Version(v) => write!(f, "{}", v)
        }
    }
}

impl From<i32> for DatabaseVersion {
    fn from(i: i32) -> Self {
        let i = i as u32;
        if i & Self::INITIALIZE_MASK == 0 {
            DatabaseVersion::Uninitialized
        } else {
            DatabaseVersion::Version(i & Self::VERSION_MASK)
        }
    }
}

impl From<u32> for DatabaseVersion {
    fn from(i: u32) -> Self {
        Self::from(i as i32)
    }
}

impl From<DatabaseVersion> for u32 {
    fn from(v: DatabaseVersion) -> Self {
        match v {
            DatabaseVersion::Uninitialized => 0,
            DatabaseVersion::Version(v) => v | DatabaseVersion::INITIALIZE_MASK
        }
    }
}

impl From<DatabaseVersion> for i32 {
    fn from(v: DatabaseVersion) -> Self {
        let o: u32 = v.into();
        o as i32
    }
}

#[derive(rust_embed::RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/migrations/guild/"]
struct GuildMigrations;

#[derive(rust_embed::RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/migrations/global/"]
struct GlobalMigrations;

fn up_migrations(names: impl Iterator<Item=String>) -> Vec<String> {
    names.filter(|s| s.ends_with("up.sql"))
        .sorted()
        .collect()
}

static GUILD_MIGRATIONS: Lazy<Vec<String>> = Lazy::new(
    || up_migrations(GuildMigrations::iter().map(String::from))
);

static GLOBAL_MIGRATIONS: Lazy<Vec<String>> = Lazy::new(
    || up_migrations(GlobalMigrations::iter().map(String::from))
);

/// Which migration set a database file follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// A `{guild_id}.sqlite3` file.
    Guild,
    /// The bot-wide `global.sqlite3` file.
    Global,
}

impl Schema {
    fn migrations(self) -> &'static [String] {
        match self {
            Schema::Guild => &GUILD_MIGRATIONS,
            Schema::Global => &GLOBAL_MIGRATIONS,
        }
    }

    fn migration_sql(self, name: &str) -> Option<String> {
        match self {
            Schema::Guild => GuildMigrations::get(name),
            Schema::Global => GlobalMigrations::get(name),
        }.map(string_from_cow)
    }

    /// The newest version this binary knows about.
    pub fn latest(self) -> DatabaseVersion {
        match self.migrations().len() {
            0 => DatabaseVersion::Uninitialized,
            n => DatabaseVersion::Version(n as u32 - 1)
        }
    }

    /// Guesses the schema from a file name; `global.sqlite3` is global, anything else a guild.
    pub fn for_path(p: impl AsRef<Path>) -> Self {
        match p.as_ref().file_stem().and_then(|s| s.to_str()) {
            Some(GLOBAL_DB_STEM) => Schema::Global,
            _ => Schema::Guild
        }
    }
}

const GLOBAL_DB_STEM: &str = "global";

/// Alias for database results.
pub type Result<T> = std::result::Result<T, DatabaseError>;

static PRELUDE_SQL: Lazy<Option<String>> = Lazy::new(|| resource_string("conn_prelude.sql"));

/// Opens a connection with the standard flags and connection setup.
pub fn new_conn(p: impl AsRef<Path>) -> Result<Connection> {
    let db = Connection::open_with_flags(
        p,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_SHARED_CACHE,
    )?;

    let prelude = PRELUDE_SQL.as_ref()
        .ok_or_else(|| DatabaseError::MissingScript("conn_prelude.sql".to_string()))?;
    db.execute_batch(prelude)?;
    db.busy_timeout(Duration::from_secs(5))?;

    Ok(db)
}

/// Path of a guild's database file inside `data_dir`.
pub fn guild_db_path(data_dir: impl Into<PathBuf>, g: GuildId) -> PathBuf {
    let mut db_name = data_dir.into();
    db_name.push(format!("{}.sqlite3", g));
    db_name
}

/// Opens a guild's database inside `data_dir` without migrating it.
pub fn ensure_guild_db(data_dir: impl Into<PathBuf>, g: GuildId) -> Result<Connection> {
    new_conn(guild_db_path(data_dir, g))
}

/// Opens and migrates a guild's database inside `data_dir`.
pub fn open_guild_db(data_dir: impl Into<PathBuf>, g: GuildId) -> Result<GuildConn> {
    let mut conn = ensure_guild_db(data_dir, g)?;
    run_migrations(&mut conn, Schema::Guild, None)?;
    Ok(GuildConn::new(g, conn))
}

/// Opens and migrates a guild's database in the data folder.
pub fn ensure_guild_db_in_data_dir(g: GuildId) -> Result<GuildConn> {
    let dir = ensure_data_folder()?;
    open_guild_db(dir, g)
}

/// Opens and migrates the global database inside `data_dir`.
pub fn open_global_db(data_dir: impl Into<PathBuf>) -> Result<Connection> {
    let mut path = data_dir.into();
    path.push(format!("{}.sqlite3", GLOBAL_DB_STEM));
    let mut conn = new_conn(path)?;
    run_migrations(&mut conn, Schema::Global, None)?;
    Ok(conn)
}

/// Applies every pending migration of `schema` up to `until` (default: the latest).
pub fn run_migrations(conn: &mut Connection, schema: Schema, until: Option<DatabaseVersion>) -> Result<()> {
    let latest = schema.latest();
    let until = until.unwrap_or(latest).min(latest);

    let trans = conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;
    let ver = trans.query_row(
        "PRAGMA user_version;",
        NO_PARAMS,
        |r| r.get(0),
    ).map(|i: i32| DatabaseVersion::from(i))?;

    if ver > latest {
        return Err(DatabaseError::TooNew);
    } else if ver >= until {
        return Ok(());
    }

    for idx in ver.next_migration()..until.next_migration() {
        run_migration(schema, idx, &trans)?;
    }

    trans.commit()?;

    Ok(())
}

fn run_migration(schema: Schema, idx: u32, t: &Transaction) -> Result<()> {
    let migration = &schema.migrations()[idx as usize];
    info!("Applying {:?} migration {}...", schema, migration);

    let mig_sql = schema.migration_sql(migration)
        .ok_or_else(|| DatabaseError::MissingScript(migration.clone()))?;
    t.execute_batch(&mig_sql)?;

    let new_ver = DatabaseVersion::Version(idx);
    t.execute(
        &format!("PRAGMA user_version = {}", i32::from(new_ver)),
        NO_PARAMS,
    )?;
    Ok(())
}

/// Reads the version of a database file.
pub fn get_db_version(conn: &Connection) -> Result<DatabaseVersion> {
    let v = conn.query_row(
        "PRAGMA user_version;",
        NO_PARAMS,
        |r| r.get(0).map(|i: i32| DatabaseVersion::from(i)),
    )?;

    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_migration_up() {
        let dummy_dir = TempDir::new("migrations").unwrap();
        let mut dummy_conn = ensure_guild_db(dummy_dir.as_ref(), GuildId::from(std::u64::MAX)).unwrap();
        assert_eq!(get_db_version(&dummy_conn).unwrap(), DatabaseVersion::Uninitialized);
        run_migrations(&mut dummy_conn, Schema::Guild, None).unwrap();
        assert_eq!(get_db_version(&dummy_conn).unwrap(), Schema::Guild.latest());

        // Running again is a no-op.
        run_migrations(&mut dummy_conn, Schema::Guild, None).unwrap();
        assert_eq!(get_db_version(&dummy_conn).unwrap(), Schema::Guild.latest());
    }

    #[test]
    fn global_migration_up() {
        let dummy_dir = TempDir::new("migrations").unwrap();
        let conn = open_global_db(dummy_dir.path()).unwrap();
        assert_eq!(get_db_version(&conn).unwrap(), Schema::Global.latest());
    }

    #[test]
    fn newer_databases_are_rejected() {
        let dummy_dir = TempDir::new("migrations").unwrap();
        let mut conn = ensure_guild_db(dummy_dir.as_ref(), GuildId::from(1)).unwrap();
        let too_new = DatabaseVersion::Version(Schema::Guild.latest().next_migration() + 5);
        conn.execute(&format!("PRAGMA user_version = {}", i32::from(too_new)), NO_PARAMS).unwrap();
        assert!(matches!(run_migrations(&mut conn, Schema::Guild, None), Err(DatabaseError::TooNew)));
    }

    #[test]
    fn version_round_trips_through_pragma_encoding() {
        assert_eq!(DatabaseVersion::from(0i32), DatabaseVersion::Uninitialized);
        let v = DatabaseVersion::Version(3);
        assert_eq!(DatabaseVersion::from(i32::from(v)), v);
        assert!(DatabaseVersion::Uninitialized < DatabaseVersion::Version(0));
        assert_eq!(Schema::for_path("/tmp/global.sqlite3"), Schema::Global);
        assert_eq!(Schema::for_path("/tmp/1234.sqlite3"), Schema::Guild);
    }
}
