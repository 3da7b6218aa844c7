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

//! Registering, removing and describing API keys.

use std::borrow::Cow;

use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;

use crate::args::parse_app_matches;
use crate::db::global::{global_connection, ApiKey};
use crate::dispatch::Dispatch;
use crate::error::UserError;
use crate::gw2::{client, ApiError};
use crate::gw2::model::{Account, TokenInfo};
use crate::modules::commands::{Command, Error, Result};
use crate::modules::Module;

use super::{fetch_key, prefix, user_colour, CATEGORY};

const ABOUT: &str = "Manages the Guild Wars 2 API key linked to your Discord account.";

/// Maps a failed `tokeninfo` lookup onto what the user is told. Only a key the API refuses is
/// called invalid; outages and the like pass through as they are.
pub fn token_error(e: ApiError) -> Error {
    match e {
        ApiError::InvalidKey => UserError::new("That API key is invalid.").into(),
        other => other.into()
    }
}

fn already_listed(msg: &Message) -> String {
    format!("{}, you're already on the list, remove your key first if you wish to change it.",
            msg.author.mention())
}

pub struct Key;

impl Key {
    fn add(&self, ctx: &Context, msg: &Message, key: &str) -> Result<()> {
        // The key is a credential; get it out of the channel first.
        if let Err(e) = msg.delete(ctx) {
            debug!("Couldn't delete a message holding an API key: {}", e);
        }

        let conn = global_connection()?;
        if conn.api_key(msg.author.id)?.is_some() {
            msg.channel_id.say(ctx, already_listed(msg))?;
            return Ok(());
        }

        let token: TokenInfo = client().get_authed("tokeninfo", key).map_err(|e| {
            info!("Couldn't verify an API key from {}: {}", msg.author.tag(), e);
            token_error(e)
        })?;
        let account: Account = client().get_authed("account", key)?;

        let added = conn.insert_api_key(&ApiKey {
            user: msg.author.id,
            key: key.to_string(),
            account_name: account.name,
            key_name: token.name,
            permissions: token.permissions,
        })?;
        let reply = if added {
            format!("{}, your api key was verified and added to the list.", msg.author.mention())
        } else {
            already_listed(msg)
        };
        msg.channel_id.say(ctx, reply)?;
        Ok(())
    }

    fn remove(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let reply = if global_connection()?.remove_api_key(msg.author.id)? {
            format!("{}, successfully removed your key.", msg.author.mention())
        } else {
            format!("{}, no API key associated with your account. Add your key using `{}key add`",
                    msg.author.mention(), prefix(msg)?)
        };
        msg.channel_id.say(ctx, reply)?;
        Ok(())
    }

    fn info(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let key = fetch_key(msg, &[])?;
        let account: Account = client().get_authed("account", &key.key)?;
        let colour = user_colour(ctx, msg);
        msg.channel_id.send_message(ctx, |m| m.embed(|e| {
            e.author(|a| a.name(&account.name)).colour(colour);
            if !key.key_name.is_empty() {
                e.field("Key name", &key.key_name, true);
            }
            e.field("Permissions", key.permissions.join(", "), true)
        }))?;
        Ok(())
    }
}

impl Command for Key {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("key", args, &self.parser())?;
        match m.subcommand() {
            ("add", Some(sub)) => self.add(ctx, msg, sub.value_of("key").unwrap_or_default()),
            ("remove", _) => self.remove(ctx, msg),
            ("info", _) => self.info(ctx, msg),
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("key")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("add")
                .about("Links an API key to your account. Generate one at https://account.arena.net under Applications.")
                .arg(Arg::with_name("key")
                    .required(true)
                    .value_name("KEY")))
            .subcommand(SubCommand::with_name("remove")
                .about("Forgets your API key."))
            .subcommand(SubCommand::with_name("info")
                .about("Shows the account, name and permissions of your key."))
    }
}

pub fn key_module() -> Module {
    Module::with_name("key")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;

    #[test]
    fn only_refused_keys_are_invalid() {
        let refused = token_error(ApiError::InvalidKey);
        assert!(refused.is_user_error());
        assert_eq!(refused.to_string(), "That API key is invalid.");

        let outage = token_error(ApiError::Connection("502 Bad Gateway".into()));
        assert!(!outage.to_string().contains("invalid"));
        assert!(outage.to_string().contains("502 Bad Gateway"));
    }
}
