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

//! World vs. World matchups.

use std::borrow::Cow;

use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::prelude::Context;
use serenity::utils::Colour;

use crate::args::{joined_values, parse_plain_matches};
use crate::dispatch::Dispatch;
use crate::gw2::client;
use crate::gw2::model::{Account, World, WvwMatch};
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::Module;

use super::{fetch_key, CATEGORY};

const ABOUT: &str = "Shows World vs. World information.";

/// World IDs from here on are European.
const EU_WORLDS: u64 = 2000;

pub fn population(p: &str) -> &str {
    match p {
        "VeryHigh" => "Very high",
        p => p
    }
}

/// Kills per death to two decimals. No deaths means the kills themselves.
pub fn kill_death_ratio(kills: u64, deaths: u64) -> String {
    let ratio = if deaths == 0 { kills as f64 } else { kills as f64 / deaths as f64 };
    format!("{:.2}", ratio)
}

/// World names split into `(NA, EU)`, each sorted.
pub fn by_region(worlds: &[World]) -> (Vec<&str>, Vec<&str>) {
    let (mut na, mut eu): (Vec<&World>, Vec<&World>) = worlds.iter().partition(|w| w.id < EU_WORLDS);
    na.sort_by(|a, b| a.name.cmp(&b.name));
    eu.sort_by(|a, b| a.name.cmp(&b.name));
    (na.iter().map(|w| w.name.as_str()).collect(), eu.iter().map(|w| w.name.as_str()).collect())
}

fn team_colour(color: &str) -> Colour {
    match color {
        "red" => Colour::RED,
        "green" => Colour::DARK_GREEN,
        _ => Colour::BLUE
    }
}

pub struct Wvw;

impl Wvw {
    fn worlds(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let worlds: Vec<World> = client().get("worlds?ids=all")?;
        let (na, eu) = by_region(&worlds);
        msg.channel_id.say(ctx, format!("Available worlds:\n**North America**```{}```\n**Europe**```{}```",
                                        na.join(", "), eu.join(", ")))?;
        Ok(())
    }

    fn info(&self, ctx: &Context, msg: &Message, name: &str) -> Result<()> {
        let worlds: Vec<World> = client().get("worlds?ids=all")?;
        let world_id = if name.is_empty() {
            let key = fetch_key(msg, &["account"])?;
            let account: Account = client().get_authed("account", &key.key)?;
            account.world
        } else {
            match worlds.iter().find(|w| w.name.eq_ignore_ascii_case(name)) {
                Some(w) => w.id,
                None => return user_error("Invalid world name")
            }
        };
        let world = match worlds.iter().find(|w| w.id == world_id) {
            Some(w) => w,
            None => return user_error("Invalid world name")
        };

        let matchup: WvwMatch = client().get(&format!("wvw/matches?world={}", world_id))?;
        let color = match matchup.color_of(world_id) {
            Some(c) => c,
            None => return user_error("That world isn't in a matchup right now.")
        };
        let get = |t: &crate::gw2::model::Teams<u64>| t.get(color).copied().unwrap_or(0);
        let (kills, deaths) = (get(&matchup.kills), get(&matchup.deaths));

        msg.channel_id.send_message(ctx, |m| m.embed(|e| e
            .title(&world.name)
            .description(format!("Matchup {}", matchup.id))
            .colour(team_colour(color))
            .field("Score", get(&matchup.scores), true)
            .field("Points per tick", matchup.points_per_tick(color), true)
            .field("Victory points", get(&matchup.victory_points), true)
            .field("Kills", kills, true)
            .field("Deaths", deaths, true)
            .field("K/D ratio", kill_death_ratio(kills, deaths), true)
            .field("Population", population(&world.population), false)))?;
        Ok(())
    }
}

impl Command for Wvw {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_plain_matches("wvw", args, &self.parser())?;
        match m.subcommand() {
            ("worlds", _) => self.worlds(ctx, msg),
            ("info", Some(sub)) => self.info(ctx, msg, &joined_values(sub, "world")),
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("wvw")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("worlds")
                .about("Lists every world by region."))
            .subcommand(SubCommand::with_name("info")
                .about("Shows the current matchup of a world, yours by default.")
                .arg(Arg::with_name("world")
                    .multiple(true)))
    }
}

pub fn wvw_module() -> Module {
    Module::with_name("wvw")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Wvw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(id: u64, name: &str) -> World {
        World { id, name: name.to_string(), population: "High".to_string() }
    }

    #[test]
    fn regions() {
        let worlds = vec![world(2012, "Piken Square"), world(1001, "Anvil Rock"), world(2003, "Gandara"),
                          world(1008, "Jade Quarry")];
        let (na, eu) = by_region(&worlds);
        assert_eq!(na, vec!["Anvil Rock", "Jade Quarry"]);
        assert_eq!(eu, vec!["Gandara", "Piken Square"]);
    }

    #[test]
    fn display_values() {
        assert_eq!(population("VeryHigh"), "Very high");
        assert_eq!(population("Medium"), "Medium");
        assert_eq!(kill_death_ratio(300, 200), "1.50");
        assert_eq!(kill_death_ratio(10, 3), "3.33");
        assert_eq!(kill_death_ratio(7, 0), "7.00");
    }
}
