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

//! Trading post prices and orders, and finding items in an account.

use std::borrow::Cow;
use std::collections::HashMap;

use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;
use serenity::utils::Colour;

use crate::args::{joined_values, parse_plain_matches, parse_value};
use crate::db::global::global_connection;
use crate::dispatch::Dispatch;
use crate::gw2::coins::gold_to_coins;
use crate::gw2::gamedata::gamedata;
use crate::gw2::inventory::{Holdings, HOLDINGS_SCOPES};
use crate::gw2::model::{Item, PriceInfo, Prices, Transaction};
use crate::gw2::{client, ApiError};
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::Module;
use crate::util::say_chunked;

use super::{fetch_key, with_item, CATEGORY, MAX_ITEM_CHOICES};

const TP_ABOUT: &str = "Looks up trading post prices and your open orders.";
const SEARCH_ABOUT: &str = "Finds where an item is stored in your account.";

fn price_text(p: &PriceInfo, none: &str) -> String {
    if p.unit_price == 0 {
        none.to_string()
    } else {
        format!("{} ({} listed)", gold_to_coins(p.unit_price), p.quantity)
    }
}

fn show_price(ctx: &Context, msg: &Message, item: &Item) -> Result<()> {
    let prices: Prices = match client().get(&format!("commerce/prices/{}", item.id)) {
        Err(ApiError::NotFound) => return user_error(format!("{} can't be sold on the trading post.", item.name)),
        r => r?
    };
    let colour = Colour::new(gamedata().rarity_color(&item.rarity));
    msg.channel_id.send_message(ctx, |m| m.embed(|e| {
        e.title(&item.name)
            .description(format!("{} {}", item.rarity, item.item_type))
            .colour(colour)
            .field("Buy price", price_text(&prices.buys, "No buy orders"), false)
            .field("Sell price", price_text(&prices.sells, "No sell orders"), false)
            .footer(|f| f.text(&item.chat_link));
        if let Some(icon) = &item.icon {
            e.thumbnail(icon);
        }
        e
    }))?;
    Ok(())
}

/// One line per order: name, quantity, price each and the whole order's worth.
pub fn transaction_lines(orders: &[Transaction], names: &HashMap<u64, String>) -> Vec<String> {
    orders.iter()
        .take(MAX_ITEM_CHOICES as usize)
        .map(|t| {
            let name = names.get(&t.item_id).map_or("Unknown item", String::as_str);
            format!("{} x{}: {} each, max offer {}", name, t.quantity,
                    gold_to_coins(t.price), gold_to_coins(t.price * t.quantity))
        })
        .collect()
}

pub struct TradingPost;

impl TradingPost {
    fn by_id(&self, ctx: &Context, msg: &Message, id: u64) -> Result<()> {
        let item = match global_connection()?.item(id)? {
            Some(i) => i,
            None => match client().get::<Item>(&format!("items/{}", id)) {
                Err(ApiError::NotFound) => return user_error("There's no item with that ID."),
                r => r?
            }
        };
        show_price(ctx, msg, &item)
    }

    fn current(&self, ctx: &Context, msg: &Message, side: &str) -> Result<()> {
        let key = fetch_key(msg, &["tradingpost"])?;
        let orders: Vec<Transaction> = client()
            .get_authed(&format!("commerce/transactions/current/{}", side), &key.key)?;
        if orders.is_empty() {
            return user_error("You have no ongoing transactions.");
        }
        let ids: Vec<u64> = orders.iter().map(|t| t.item_id).collect();
        let names = global_connection()?.item_names(&ids)?;
        msg.channel_id.say(ctx, format!("{}, your current {}:", msg.author.mention(), side))?;
        say_chunked(ctx, msg.channel_id, &transaction_lines(&orders, &names).join("\n"), true)?;
        Ok(())
    }
}

impl Command for TradingPost {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_plain_matches("tp", args, &self.parser())?;
        match m.subcommand() {
            ("price", Some(sub)) => {
                let query = joined_values(sub, "item");
                with_item(disp, ctx, msg, &query, Box::new(|ctx: &Context, msg: &Message, item: Item| {
                    show_price(ctx, msg, &item)
                }))
            }
            ("id", Some(sub)) => {
                let id = parse_value::<u64>(sub, "id")?.unwrap_or_default();
                self.by_id(ctx, msg, id)
            }
            ("current", Some(sub)) => self.current(ctx, msg, sub.value_of("side").unwrap_or("buys")),
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("tp")
            .about(TP_ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("price")
                .about("Shows the best buy and sell prices of an item.")
                .arg(Arg::with_name("item")
                    .required(true)
                    .multiple(true)))
            .subcommand(SubCommand::with_name("id")
                .about("Shows the prices of an item by its ID.")
                .arg(Arg::with_name("id")
                    .required(true)))
            .subcommand(SubCommand::with_name("current")
                .about("Lists your open orders.")
                .arg(Arg::with_name("side")
                    .required(true)
                    .possible_values(&["buys", "sells"])))
    }
}

pub fn tp_module() -> Module {
    Module::with_name("tp")
        .with_description(TP_ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(TradingPost)
}

/// The reply to a search, or `None` if the item is nowhere.
pub fn search_reply(item: &Item, locations: &[(String, u64)]) -> Option<String> {
    if locations.is_empty() {
        return None;
    }
    let lines = locations.iter()
        .map(|(place, n)| format!("{}: Found {}", place, n))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("Here are the places where you have {}:```{}```", item.name, lines))
}

pub struct Search;

impl Command for Search {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_plain_matches("search", args, &self.parser())?;
        let key = fetch_key(msg, HOLDINGS_SCOPES)?;
        let query = joined_values(&m, "item");
        with_item(disp, ctx, msg, &query, Box::new(move |ctx: &Context, msg: &Message, item: Item| {
            let holdings = Holdings::fetch(client(), &key.key)?;
            match search_reply(&item, &holdings.locations(item.id)) {
                Some(r) => {
                    msg.channel_id.say(ctx, format!("{}, {}", msg.author.mention(), r))?;
                    Ok(())
                }
                None => user_error("Sorry, you don't have that item")
            }
        }))
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("search")
            .about(SEARCH_ABOUT)
            .arg(Arg::with_name("item")
                .required(true)
                .multiple(true))
    }
}

pub fn search_module() -> Module {
    Module::with_name("search")
        .with_description(SEARCH_ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Search)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin() -> Item {
        Item {
            id: 19976,
            name: "Mystic Coin".to_string(),
            item_type: "Trophy".to_string(),
            level: 0,
            rarity: "Rare".to_string(),
            icon: None,
            chat_link: "[&AgGwTgAA]".to_string(),
        }
    }

    #[test]
    fn prices() {
        assert_eq!(price_text(&PriceInfo { quantity: 0, unit_price: 0 }, "No buy orders"), "No buy orders");
        assert_eq!(price_text(&PriceInfo { quantity: 12, unit_price: 10003 }, "No sell orders"), "1g 3c (12 listed)");
    }

    #[test]
    fn orders() {
        let orders = vec![Transaction { item_id: 19976, price: 15000, quantity: 3, created: String::new() }];
        let mut names = HashMap::new();
        names.insert(19976, "Mystic Coin".to_string());
        assert_eq!(transaction_lines(&orders, &names), vec!["Mystic Coin x3: 1g 50s each, max offer 4g 50s"]);
    }

    #[test]
    fn search_replies() {
        assert_eq!(search_reply(&coin(), &[]), None);
        let locs = vec![("BANK".to_string(), 250), ("SOMECHAR".to_string(), 1)];
        assert_eq!(search_reply(&coin(), &locs).unwrap(),
                   "Here are the places where you have Mystic Coin:```BANK: Found 250\nSOMECHAR: Found 1```");
    }
}
