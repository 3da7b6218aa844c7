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

//! Structured PvP statistics.

use std::borrow::Cow;
use std::collections::HashMap;

use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;
use serenity::utils::Colour;

use crate::args::parse_app_matches;
use crate::dispatch::Dispatch;
use crate::gw2::client;
use crate::gw2::gamedata::gamedata;
use crate::gw2::model::{PvpStats, WinLoss};
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::Module;
use crate::util::capitalized;

use super::{fetch_key, user_colour, CATEGORY};

const ABOUT: &str = "Shows your PvP statistics.";
const SCOPES: &[&str] = &["pvp"];

/// Extremes among the professions that have been played at all.
#[derive(Debug, PartialEq, Eq)]
pub struct ProfessionSummary<'a> {
    pub most_played: (&'a str, u64),
    pub least_played: (&'a str, u64),
    pub best: (&'a str, u64),
    pub worst: (&'a str, u64),
}

pub fn profession_summary(profs: &HashMap<String, WinLoss>) -> Option<ProfessionSummary> {
    let mut played: Vec<(&str, &WinLoss)> = profs.iter()
        .filter(|(_, wl)| wl.total() > 0)
        .map(|(p, wl)| (p.as_str(), wl))
        .collect();
    // Stable results for ties.
    played.sort_by_key(|(p, _)| *p);

    let by = |f: &dyn Fn(&WinLoss) -> u64, max: bool| {
        let pick = if max {
            played.iter().rev().max_by_key(|(_, wl)| f(wl))
        } else {
            played.iter().min_by_key(|(_, wl)| f(wl))
        };
        pick.map(|(p, wl)| (*p, f(wl)))
    };

    Some(ProfessionSummary {
        most_played: by(&WinLoss::total, true)?,
        least_played: by(&WinLoss::total, false)?,
        best: by(&WinLoss::win_ratio, true)?,
        worst: by(&WinLoss::win_ratio, false)?,
    })
}

pub struct Pvp;

impl Pvp {
    fn stats(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let key = fetch_key(msg, SCOPES)?;
        let stats: PvpStats = client().get_authed("pvp/stats", &key.key)?;
        let all = stats.aggregate;
        let ranked = stats.ladders.get("ranked").copied().unwrap_or_default();

        let colour = user_colour(ctx, msg);
        msg.channel_id.send_message(ctx, |m| m
            .content(msg.author.mention())
            .embed(|e| e
                .author(|a| a.name(&key.account_name))
                .colour(colour)
                .field("Rank", stats.rank(), false)
                .field("Total games played", all.total(), true)
                .field("Total wins", all.wins, true)
                .field("Total losses", all.losses, true)
                .field("Byes", all.byes, true)
                .field("Total winratio", format!("{}%", all.win_ratio()), true)
                .field("Ranked games played", ranked.total(), true)
                .field("Ranked wins", ranked.wins, true)
                .field("Ranked losses", ranked.losses, true)
                .field("Ranked winratio", format!("{}%", ranked.win_ratio()), true)))?;
        Ok(())
    }

    fn professions(&self, ctx: &Context, msg: &Message, profession: Option<&str>) -> Result<()> {
        let key = fetch_key(msg, SCOPES)?;
        let stats: PvpStats = client().get_authed("pvp/stats", &key.key)?;
        let colour = user_colour(ctx, msg);

        match profession {
            Some(p) => {
                let p = p.to_lowercase();
                if !gamedata().is_profession(&p) {
                    return user_error(format!("{} is not a profession.", p));
                }
                let wl = stats.professions.get(&p).copied().unwrap_or_default();
                let colour = Colour::new(gamedata().profession_color(&p));
                msg.channel_id.send_message(ctx, |m| m.embed(|e| e
                    .title(format!("{} stats", capitalized(&p)))
                    .author(|a| a.name(&key.account_name))
                    .colour(colour)
                    .field("Total games played", wl.total(), true)
                    .field("Wins", wl.wins, true)
                    .field("Losses", wl.losses, true)
                    .field("Winratio", format!("{}%", wl.win_ratio()), true)))?;
            }
            None => {
                let summary = match profession_summary(&stats.professions) {
                    Some(s) => s,
                    None => return user_error("You haven't played any PvP games yet.")
                };
                msg.channel_id.send_message(ctx, |m| m.embed(|e| e
                    .title("Professions")
                    .author(|a| a.name(&key.account_name))
                    .colour(colour)
                    .field("Most played", format!("{}, {} games", capitalized(summary.most_played.0), summary.most_played.1), true)
                    .field("Least played", format!("{}, {} games", capitalized(summary.least_played.0), summary.least_played.1), true)
                    .field("Highest winrate", format!("{}, {}%", capitalized(summary.best.0), summary.best.1), true)
                    .field("Lowest winrate", format!("{}, {}%", capitalized(summary.worst.0), summary.worst.1), true)))?;
            }
        }
        Ok(())
    }
}

impl Command for Pvp {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("pvp", args, &self.parser())?;
        match m.subcommand() {
            ("stats", _) => self.stats(ctx, msg),
            ("professions", Some(sub)) => self.professions(ctx, msg, sub.value_of("profession")),
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("pvp")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("stats")
                .about("Shows your overall and ranked results."))
            .subcommand(SubCommand::with_name("professions")
                .about("Compares your professions, or shows one of them.")
                .arg(Arg::with_name("profession")))
    }
}

pub fn pvp_module() -> Module {
    Module::with_name("pvp")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Pvp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wl(wins: u64, losses: u64) -> WinLoss {
        WinLoss { wins, losses, ..WinLoss::default() }
    }

    #[test]
    fn summary() {
        let mut profs = HashMap::new();
        profs.insert("guardian".to_string(), wl(30, 10));
        profs.insert("necromancer".to_string(), wl(2, 8));
        profs.insert("thief".to_string(), wl(5, 0));
        profs.insert("ranger".to_string(), wl(0, 0));

        let s = profession_summary(&profs).unwrap();
        assert_eq!(s.most_played, ("guardian", 40));
        assert_eq!(s.least_played, ("thief", 5));
        assert_eq!(s.best, ("thief", 100));
        assert_eq!(s.worst, ("necromancer", 20));

        assert!(profession_summary(&HashMap::new()).is_none());
    }
}
