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

//! Gem exchange prices and price watches.

use std::borrow::Cow;

use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;

use crate::args::{parse_app_matches, parse_value};
use crate::db::global::global_connection;
use crate::dispatch::Dispatch;
use crate::error::BotResult;
use crate::gw2::coins::{gold_to_coins, GOLD};
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::config::fallible_validator;
use crate::modules::Module;
use crate::pollers::gem::{gem_price, GemPoller, WATCHED_GEMS};
use crate::pollers::Looper;

use super::CATEGORY;

const ABOUT: &str = "Shows the gem exchange rate, or lets you know when gems get cheaper.";

pub struct Gem;

impl Command for Gem {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("gem", args, &self.parser())?;
        match m.subcommand() {
            ("price", Some(s)) => {
                let gems = parse_value::<u64>(s, "gems")?.unwrap_or(WATCHED_GEMS);
                if gems == 0 {
                    return user_error("Ask about at least one gem.");
                }
                let price = gem_price(gems)?;
                msg.channel_id.say(ctx, format!("{} gems currently cost {}", gems, gold_to_coins(price)))?;
            }
            ("track", Some(s)) => {
                let gold = parse_value::<u64>(s, "gold")?.unwrap_or_default();
                let coins = match gold.checked_mul(GOLD) {
                    Some(c) if c > 0 => c,
                    _ => return user_error("That's not an amount of gold I can watch for.")
                };
                global_connection()?.set_gem_watch(msg.author.id, coins)?;
                msg.channel_id.say(ctx, format!("{}, you will be notified when the price of {} gems drops below {}",
                                                msg.author.mention(), WATCHED_GEMS, gold_to_coins(coins)))?;
            }
            _ => return Err(Error::Other)
        }
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("gem")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("price")
                .about("Shows what gems cost in gold.")
                .arg(Arg::with_name("gems")
                    .default_value("400")
                    .validator(fallible_validator::<u64, _>)))
            .subcommand(SubCommand::with_name("track")
                .about("Sends you a message once 400 gems cost less than the given gold.")
                .arg(Arg::with_name("gold")
                    .required(true)
                    .validator(fallible_validator::<u64, _>)))
    }
}

fn start_gem_poller(_disp: &Dispatch, ctx: &Context) -> BotResult<()> {
    GemPoller::new(ctx).start()?;
    Ok(())
}

pub fn gem_module() -> Module {
    Module::with_name("gem")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Gem)
        .with_ready_hook(start_gem_poller)
}
