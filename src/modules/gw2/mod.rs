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

//! Guild Wars 2 commands, and the pieces they share: key lookup, scope checks and picking
//! one search result out of several.

use std::time::Duration;

use serenity::model::channel::Message;
use serenity::prelude::Context;
use serenity::utils::Colour;

use crate::db::cache::get_cached_connection;
use crate::db::global::{global_connection, ApiKey, GlobalConn};
use crate::db::guild_conn::DEFAULT_COMMAND_PREFIX;
use crate::db;
use crate::dispatch::Dispatch;
use crate::error::{AnyError, UserError};
use crate::gw2::model::{Item, Skill};
use crate::gw2::ApiError;
use crate::modules::commands::{self, user_error};

pub mod account;
pub mod character;
pub mod daily;
pub mod database;
pub mod gem;
pub mod guild;
pub mod key;
pub mod notifiers;
pub mod progress;
pub mod pvp;
pub mod quaggan;
pub mod skill;
pub mod tp;
pub mod wallet;
pub mod wvw;

pub const CATEGORY: &str = "Guild Wars 2";

/// Most items offered when a search is ambiguous.
pub const MAX_ITEM_CHOICES: u64 = 20;
pub const ITEM_CHOICE_TIMEOUT: Duration = Duration::from_secs(120);

/// The command prefix in effect where `msg` was sent.
pub fn prefix(msg: &Message) -> commands::Result<char> {
    match msg.guild_id {
        Some(g) => {
            let conn = get_cached_connection(g)?;
            let p = conn.borrow().command_prefix()?;
            Ok(p)
        }
        None => Ok(DEFAULT_COMMAND_PREFIX)
    }
}

/// Checks a stored key against the scopes a command needs.
pub fn check_scopes(key: Option<ApiKey>, who: &str, prefix: char, scopes: &[&str]) -> Result<ApiKey, ApiError> {
    let key = key.ok_or_else(|| ApiError::Key(
        format!("No API key associated with {}, add one with {}key add (key)", who, prefix)
    ))?;
    let missing = key.missing_scopes(scopes);
    if missing.is_empty() {
        Ok(key)
    } else {
        Err(ApiError::Key(format!("{}, missing the following scopes to use this command: `{}`",
                                  who, missing.join(", "))))
    }
}

/// The author's key, provided it has every scope in `scopes`.
pub fn fetch_key(msg: &Message, scopes: &[&str]) -> commands::Result<ApiKey> {
    let stored = global_connection()?.api_key(msg.author.id)?;
    Ok(check_scopes(stored, &msg.author.tag(), prefix(msg)?, scopes)?)
}

/// The colour of the author's highest coloured role, for embeds.
pub fn user_colour(ctx: &Context, msg: &Message) -> Colour {
    let member = msg.guild_id
        .and_then(|g| g.to_guild_cached(ctx))
        .and_then(|g| {
            let rg = g.read();
            rg.members.get(&msg.author.id).cloned()
        });
    member.and_then(|m| m.colour(ctx)).unwrap_or_default()
}

/// The outcome of a name search over one of the indexes.
#[derive(Debug)]
pub enum Matches<T> {
    Nothing,
    TooMany(u64),
    One(T),
    Several(Vec<T>),
}

impl<T> Matches<T> {
    fn from_search(exact: Vec<T>, count: u64, fetch: impl FnOnce() -> db::Result<Vec<T>>) -> db::Result<Self> {
        if exact.len() == 1 {
            return Ok(exact.into_iter().next().map_or(Matches::Nothing, Matches::One));
        }
        let out = match count {
            0 => Matches::Nothing,
            n if n > MAX_ITEM_CHOICES => Matches::TooMany(n),
            _ => {
                let mut found = fetch()?;
                if found.len() == 1 {
                    Matches::One(found.remove(0))
                } else {
                    Matches::Several(found)
                }
            }
        };
        Ok(out)
    }
}

/// Looks `query` up in the item index. A single exact name match wins over partial matches.
pub fn find_items(conn: &GlobalConn, query: &str) -> db::Result<Matches<Item>> {
    Matches::from_search(
        conn.items_exactly_named(query)?,
        conn.count_items_containing(query)?,
        || conn.items_containing(query, MAX_ITEM_CHOICES as u32),
    )
}

/// Looks `query` up in the skill index, the same way as [find_items].
pub fn find_skills(conn: &GlobalConn, query: &str) -> db::Result<Matches<Skill>> {
    Matches::from_search(
        conn.skills_exactly_named(query)?,
        conn.count_skills_containing(query)?,
        || conn.skills_containing(query, MAX_ITEM_CHOICES as u32),
    )
}

pub fn choice_list(labels: impl IntoIterator<Item=String>) -> String {
    let mut out = "Which one of these interests you? Type its number```".to_string();
    for (i, label) in labels.into_iter().enumerate() {
        out.push_str(&format!("\n{}: {}", i, label));
    }
    out.push_str("```");
    out
}

/// Runs once a search result has been picked. The message is either the command or the reply
/// that picked it.
pub type ChoiceHandler<T> = Box<dyn FnOnce(&Context, &Message, T) -> commands::Result<()> + Send>;
pub type ItemHandler = ChoiceHandler<Item>;

/// How a search over one index talks to the user.
pub struct SearchReplies<T> {
    pub not_found: &'static str,
    /// Posted when nobody picks a result in time.
    pub timeout: &'static str,
    /// What the results are called when there are too many of them, e.g. "item".
    pub noun: &'static str,
    pub label: fn(&T) -> String,
}

fn item_label(i: &Item) -> String {
    format!("{} ({})", i.name, i.rarity)
}

const ITEM_SEARCH: SearchReplies<Item> = SearchReplies {
    not_found: "I couldn't find that item in the database, check for typos.",
    timeout: "No item was picked.",
    noun: "item",
    label: item_label,
};

/// Settles `matches` on a single result, asking the user to choose when there are several.
pub fn with_choice<T>(disp: &Dispatch, ctx: &Context, msg: &Message, matches: Matches<T>, replies: &SearchReplies<T>, then: ChoiceHandler<T>) -> commands::Result<()>
    where T: Clone + Send + 'static {
    match matches {
        Matches::Nothing => user_error(replies.not_found),
        Matches::TooMany(n) => user_error(format!("Your search gave me {} {} results. Please be more specific", n, replies.noun)),
        Matches::One(found) => then(ctx, msg, found),
        Matches::Several(found) => {
            msg.channel_id.say(ctx, choice_list(found.iter().map(replies.label)))?;
            disp.pending().expect_reply(
                ctx.http.clone(),
                msg.channel_id,
                msg.author.id,
                ITEM_CHOICE_TIMEOUT,
                replies.timeout,
                Box::new(move |_disp: &Dispatch, ctx: &Context, reply: &Message| {
                    let picked = reply.content.trim().parse::<usize>().ok()
                        .and_then(|n| found.get(n).cloned());
                    match picked {
                        Some(p) => then(ctx, reply, p).map_err(AnyError::from),
                        None => Err(UserError::new("That's not a number in the list").into())
                    }
                }),
            );
            Ok(())
        }
    }
}

/// Resolves `query` to a single item, asking the user to choose when it's ambiguous.
pub fn with_item(disp: &Dispatch, ctx: &Context, msg: &Message, query: &str, then: ItemHandler) -> commands::Result<()> {
    let matches = find_items(&*global_connection()?, query)?;
    with_choice(disp, ctx, msg, matches, &ITEM_SEARCH, then)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::model::id::UserId;
    use tempdir::TempDir;

    fn item(id: u64, name: &str) -> Item {
        Item {
            id,
            name: name.to_string(),
            item_type: "CraftingMaterial".to_string(),
            level: 0,
            rarity: "Rare".to_string(),
            icon: None,
            chat_link: String::new(),
        }
    }

    #[test]
    fn scope_checks() {
        let e = check_scopes(None, "someone#0001", '$', &["account"]).unwrap_err();
        assert_eq!(e.to_string(), "No API key associated with someone#0001, add one with $key add (key)");

        let key = ApiKey {
            user: UserId(1),
            key: "K".to_string(),
            account_name: "Someone.1234".to_string(),
            key_name: "bot".to_string(),
            permissions: vec!["account".to_string()],
        };
        let e = check_scopes(Some(key.clone()), "someone#0001", '!', &["account", "wallet", "pvp"]).unwrap_err();
        assert_eq!(e.to_string(), "someone#0001, missing the following scopes to use this command: `wallet, pvp`");
        assert!(check_scopes(Some(key), "someone#0001", '!', &["account"]).is_ok());
    }

    #[test]
    fn item_resolution() {
        let dir = TempDir::new("items").unwrap();
        let conn = GlobalConn::open(dir.path()).unwrap();
        let mut items = vec![item(19976, "Mystic Coin"), item(19675, "Mystic Clover")];
        items.extend((0..25).map(|i| item(100 + i, &format!("Glob of Ectoplasm {}", i))));
        conn.insert_items(&items).unwrap();

        assert!(matches!(find_items(&conn, "mystic coin").unwrap(), Matches::One(i) if i.id == 19976));
        assert!(matches!(find_items(&conn, "mystic").unwrap(), Matches::Several(v) if v.len() == 2));
        assert!(matches!(find_items(&conn, "ectoplasm").unwrap(), Matches::TooMany(25)));
        assert!(matches!(find_items(&conn, "ectoplasm 7").unwrap(), Matches::One(i) if i.id == 107));
        assert!(matches!(find_items(&conn, "legendary").unwrap(), Matches::Nothing));
    }

    #[test]
    fn choices() {
        let items = [item(1, "Mystic Coin"), item(2, "Mystic Clover")];
        let list = choice_list(items.iter().map(ITEM_SEARCH.label));
        assert_eq!(list, "Which one of these interests you? Type its number```\n0: Mystic Coin (Rare)\n1: Mystic Clover (Rare)```");
    }
}
