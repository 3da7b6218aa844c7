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

//! Today's daily achievements, and the daily announcement settings.

use std::borrow::Cow;
use std::collections::HashMap;

use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::args::parse_app_matches;
use crate::dispatch::Dispatch;
use crate::error::BotResult;
use crate::gw2::client;
use crate::gw2::model::{Achievement, Dailies, Daily};
use crate::modules::commands::{Command, Error, Result};
use crate::modules::config::fallible_validator;
use crate::modules::Module;
use crate::modules::privilege::require_admin;
use crate::pollers::daily::DailyPoller;
use crate::pollers::{Looper, DAILIES};
use crate::util::{capitalized, say_chunked};

use super::notifiers::{self, ToggleReplies};
use super::CATEGORY;

const ABOUT: &str = "Shows today's daily achievements.";

pub const CATEGORIES: [&str; 4] = ["pve", "pvp", "wvw", "fractals"];

const REPLIES: ToggleReplies = ToggleReplies {
    on: "I will notify you on this server about dailies",
    off: "I will not send notifications about dailies",
    posted_here: "Daily achievements will be posted in this channel.",
};

/// Fractal dailies come in one per tier; only the top tier is worth listing.
fn keep_fractal(name: &str) -> bool {
    !name.starts_with("Daily Tier") || name.starts_with("Daily Tier 4")
}

/// Which dailies of a category to list. Fractals are filtered by name later.
fn relevant<'a>(category: &str, dailies: &'a [Daily]) -> Vec<&'a Daily> {
    dailies.iter()
        .filter(|d| category == "fractals" || d.for_expansion_players())
        .collect()
}

/// Names for `ids`, in the same order, skipping fractal tiers below the top.
pub fn daily_names(category: &str, ids: &[u64], names: &HashMap<u64, String>) -> Vec<String> {
    ids.iter()
        .filter_map(|id| names.get(id))
        .filter(|n| category != "fractals" || keep_fractal(n))
        .cloned()
        .collect()
}

pub fn category_text(category: &str, names: &[String]) -> String {
    let mut out = format!("{} dailies for today are: ```", capitalized(category));
    for n in names {
        out.push('\n');
        out.push_str(n);
    }
    out.push_str("```");
    out
}

/// Every category, each under an upper-cased header.
pub fn all_text(sections: &[(&str, Vec<String>)]) -> String {
    sections.iter()
        .flat_map(|(c, names)| std::iter::once(format!("{} DAILIES:", c.to_uppercase())).chain(names.iter().cloned()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fetches today's dailies with their names, per category.
pub fn todays_dailies() -> crate::gw2::Result<Vec<(&'static str, Vec<String>)>> {
    let dailies: Dailies = client().get("achievements/daily")?;
    let mut per_category = Vec::new();
    let mut all_ids = Vec::new();
    for c in CATEGORIES.iter() {
        let ids: Vec<u64> = relevant(c, dailies.category(c).unwrap_or_default())
            .into_iter()
            .map(|d| d.id)
            .collect();
        all_ids.extend(ids.iter().copied());
        per_category.push((*c, ids));
    }

    let names: HashMap<u64, String> = client().get_many::<Achievement>("achievements", &all_ids)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    Ok(per_category.into_iter()
        .map(|(c, ids)| (c, daily_names(c, &ids, &names)))
        .collect())
}

/// The daily announcement text.
pub fn announcement() -> crate::gw2::Result<String> {
    let sections = todays_dailies()?;
    Ok(format!("```markdown\n{}```\nHave a nice day!", all_text(&sections)))
}

pub struct DailyCommand;

impl DailyCommand {
    fn show(&self, ctx: &Context, msg: &Message, category: &str) -> Result<()> {
        let sections = todays_dailies()?;
        if category == "all" {
            say_chunked(ctx, msg.channel_id, &all_text(&sections), true)?;
        } else {
            let names = sections.iter()
                .find(|(c, _)| *c == category)
                .map(|(_, n)| n.as_slice())
                .unwrap_or_default();
            msg.channel_id.say(ctx, category_text(category, names))?;
        }
        Ok(())
    }
}

impl Command for DailyCommand {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("daily", args, &self.parser())?;
        match m.subcommand() {
            ("notifier", Some(sub)) => {
                require_admin(ctx, msg)?;
                match sub.subcommand() {
                    ("channel", Some(s)) => notifiers::set_channel(disp, ctx, msg, &DAILIES, s.value_of("channel").unwrap_or_default(), &REPLIES),
                    ("toggle", Some(s)) => notifiers::toggle(disp, ctx, msg, &DAILIES, s.value_of("on") == Some("true"), &REPLIES),
                    _ => Err(Error::Other)
                }
            }
            (category, _) => self.show(ctx, msg, category)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        let mut app = App::new("daily")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp);
        for c in CATEGORIES.iter() {
            app = app.subcommand(SubCommand::with_name(c)
                .about("Shows today's dailies of that kind."));
        }
        app.subcommand(SubCommand::with_name("all")
                .about("Shows every daily for today."))
            .subcommand(SubCommand::with_name("notifier")
                .about("Sets up daily announcements. Admins only.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(SubCommand::with_name("channel")
                    .about("Sets the channel dailies are posted in.")
                    .arg(Arg::with_name("channel")
                        .required(true)))
                .subcommand(SubCommand::with_name("toggle")
                    .about("Turns daily announcements on or off.")
                    .arg(Arg::with_name("on")
                        .required(true)
                        .validator(fallible_validator::<bool, _>))))
    }
}

fn start_daily_poller(_disp: &Dispatch, ctx: &Context) -> BotResult<()> {
    DailyPoller::new(ctx).start()?;
    Ok(())
}

pub fn daily_module() -> Module {
    let module = Module::with_name("daily")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_dependency("privilege")
        .with_command(DailyCommand)
        .with_ready_hook(start_daily_poller);
    notifiers::subscription_values(&DAILIES)
        .into_iter()
        .fold(module, Module::with_config_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> HashMap<u64, String> {
        vec![
            (1, "Daily Tier 1 Aquatic Ruins"),
            (2, "Daily Tier 4 Aquatic Ruins"),
            (3, "Daily Recommended Fractal: Scale 25"),
            (4, "Daily Gatherer"),
        ].into_iter().map(|(i, n)| (i, n.to_string())).collect()
    }

    #[test]
    fn fractal_tiers() {
        assert_eq!(daily_names("fractals", &[1, 2, 3], &names()),
                   vec!["Daily Tier 4 Aquatic Ruins", "Daily Recommended Fractal: Scale 25"]);
        assert_eq!(daily_names("pve", &[4, 1, 99], &names()), vec!["Daily Gatherer", "Daily Tier 1 Aquatic Ruins"]);
    }

    #[test]
    fn texts() {
        let gatherer = vec!["Daily Gatherer".to_string()];
        assert_eq!(category_text("pve", &gatherer), "Pve dailies for today are: ```\nDaily Gatherer```");
        let all = all_text(&[("pve", gatherer), ("pvp", vec!["Daily Top Stats".to_string()])]);
        assert_eq!(all, "PVE DAILIES:\nDaily Gatherer\nPVP DAILIES:\nDaily Top Stats");
    }
}
