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

//! Wallet balances.

use std::borrow::Cow;
use std::collections::HashMap;

use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;

use crate::args::{joined_values, parse_plain_matches};
use crate::dispatch::Dispatch;
use crate::gw2::client;
use crate::gw2::coins::gold_to_coins;
use crate::gw2::gamedata::{gamedata, WalletCurrency};
use crate::gw2::model::{Currency, WalletEntry};
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::Module;
use crate::util::say_chunked;

use super::{fetch_key, prefix, user_colour, CATEGORY};

const ABOUT: &str = "Shows the currencies in your wallet.";
const SCOPES: &[&str] = &["wallet"];
const COIN_ID: u64 = 1;

fn format_amount(id: u64, value: u64) -> String {
    if id == COIN_ID {
        gold_to_coins(value)
    } else {
        value.to_string()
    }
}

/// `(name, amount)` for each currency in `group`, zero when the wallet lacks it.
pub fn wallet_fields(wallet: &[WalletEntry], group: &[WalletCurrency]) -> Vec<(String, String)> {
    let balances: HashMap<u64, u64> = wallet.iter().map(|w| (w.id, w.value)).collect();
    group.iter()
        .map(|c| (c.name.clone(), format_amount(c.id, balances.get(&c.id).copied().unwrap_or(0))))
        .collect()
}

/// Finds a currency by name, ignoring case. "gold" is another name for coin.
pub fn find_currency<'a>(currencies: &'a [Currency], name: &str) -> Option<&'a Currency> {
    let name = name.trim().to_lowercase();
    let name = if name == "gold" { "coin".to_string() } else { name };
    currencies.iter().find(|c| c.name.to_lowercase() == name)
}

pub struct Wallet;

impl Wallet {
    fn group(&self, ctx: &Context, msg: &Message, title: &str, group: &[WalletCurrency]) -> Result<()> {
        let key = fetch_key(msg, SCOPES)?;
        let wallet: Vec<WalletEntry> = client().get_authed("account/wallet", &key.key)?;
        let fields = wallet_fields(&wallet, group);
        let colour = user_colour(ctx, msg);
        msg.channel_id.send_message(ctx, |m| m
            .content(msg.author.mention())
            .embed(|e| e
                .title(title)
                .author(|a| a.name(&key.account_name))
                .colour(colour)
                .fields(fields.into_iter().map(|(n, v)| (n, v, true)))))?;
        Ok(())
    }

    fn currencies(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let currencies: Vec<Currency> = client().get("currencies?ids=all")?;
        let mut names: Vec<&str> = currencies.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        msg.channel_id.say(ctx, "Available currencies are:")?;
        say_chunked(ctx, msg.channel_id, &names.join("\n"), true)?;
        Ok(())
    }

    fn currency(&self, ctx: &Context, msg: &Message, name: &str) -> Result<()> {
        let key = fetch_key(msg, SCOPES)?;
        let currencies: Vec<Currency> = client().get("currencies?ids=all")?;
        let currency = match find_currency(&currencies, name) {
            Some(c) => c,
            None => return user_error(format!("Invalid currency. See `{}wallet currencies`", prefix(msg)?))
        };
        let wallet: Vec<WalletEntry> = client().get_authed("account/wallet", &key.key)?;
        let amount = wallet.iter()
            .find(|w| w.id == currency.id)
            .map_or(0, |w| w.value);

        let colour = user_colour(ctx, msg);
        msg.channel_id.send_message(ctx, |m| m.embed(|e| {
            e.title(&currency.name)
                .author(|a| a.name(&key.account_name))
                .colour(colour)
                .field("Amount in wallet", format_amount(currency.id, amount), false)
                .description(&currency.description);
            if let Some(icon) = &currency.icon {
                e.thumbnail(icon);
            }
            e
        }))?;
        Ok(())
    }
}

impl Command for Wallet {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_plain_matches("wallet", args, &self.parser())?;
        let wallet = &gamedata().wallet;
        match m.subcommand() {
            ("show", _) => self.group(ctx, msg, "Wallet", &wallet.show),
            ("tokens", _) => self.group(ctx, msg, "Dungeon tokens", &wallet.tokens),
            ("maps", _) => self.group(ctx, msg, "Map currencies", &wallet.maps),
            ("currencies", _) => self.currencies(ctx, msg),
            ("currency", Some(sub)) => self.currency(ctx, msg, &joined_values(sub, "name")),
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("wallet")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("show")
                .about("Shows the most common currencies."))
            .subcommand(SubCommand::with_name("tokens")
                .about("Shows your dungeon tokens."))
            .subcommand(SubCommand::with_name("maps")
                .about("Shows your map currencies."))
            .subcommand(SubCommand::with_name("currencies")
                .about("Lists every currency name."))
            .subcommand(SubCommand::with_name("currency")
                .about("Shows how much of one currency you have.")
                .arg(Arg::with_name("name")
                    .required(true)
                    .multiple(true)))
    }
}

pub fn wallet_module() -> Module {
    Module::with_name("wallet")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Wallet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(id: u64, name: &str) -> Currency {
        Currency { id, name: name.to_string(), description: String::new(), icon: None }
    }

    #[test]
    fn fields_cover_the_whole_group() {
        let wallet = [WalletEntry { id: 1, value: 10003 }, WalletEntry { id: 2, value: 55 }];
        let group = vec![
            WalletCurrency { id: 1, name: "Gold".to_string() },
            WalletCurrency { id: 4, name: "Gems".to_string() },
            WalletCurrency { id: 2, name: "Karma".to_string() },
        ];
        assert_eq!(wallet_fields(&wallet, &group), vec![
            ("Gold".to_string(), "1g 3c".to_string()),
            ("Gems".to_string(), "0".to_string()),
            ("Karma".to_string(), "55".to_string()),
        ]);
    }

    #[test]
    fn currency_names() {
        let all = [currency(1, "Coin"), currency(2, "Karma"), currency(23, "Spirit Shard")];
        assert_eq!(find_currency(&all, "gold").map(|c| c.id), Some(1));
        assert_eq!(find_currency(&all, "spirit shard").map(|c| c.id), Some(23));
        assert_eq!(find_currency(&all, "KARMA").map(|c| c.id), Some(2));
        assert!(find_currency(&all, "laurel").is_none());
    }
}
