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

//! Weekly raid clears and home instance cats: what's left to do on an account.

use std::borrow::Cow;

use clap::App;
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;

use crate::args::parse_app_matches;
use crate::dispatch::Dispatch;
use crate::gw2::client;
use crate::gw2::model::{Cat, Raid, UnlockedCat};
use crate::modules::commands::{Command, Result};
use crate::modules::Module;
use crate::util::title_case;

use super::{fetch_key, CATEGORY};

const BOSSES_ABOUT: &str = "Lists the raid bosses you haven't killed this week.";
const CATS_ABOUT: &str = "Lists the home instance cats you haven't collected.";
const SCOPES: &[&str] = &["progression"];

/// Raid encounters missing from `killed`, in raid and wing order.
pub fn missing_bosses(raids: &[Raid], killed: &[String]) -> Vec<String> {
    raids.iter()
        .flat_map(|r| r.wings.iter())
        .flat_map(|w| w.events.iter())
        .filter(|e| !killed.contains(&e.id))
        .map(|e| title_case(&e.id))
        .collect()
}

/// Cats missing from `unlocked`, by ID. Cats without a hint are named by their ID.
pub fn missing_cats(all: &[Cat], unlocked: &[UnlockedCat]) -> Vec<String> {
    let mut missing: Vec<&Cat> = all.iter()
        .filter(|c| !unlocked.iter().any(|u| u.id() == c.id))
        .collect();
    missing.sort_by_key(|c| c.id);
    missing.into_iter()
        .map(|c| match &c.hint {
            Some(h) if !h.is_empty() => title_case(h),
            _ => format!("Cat #{}", c.id)
        })
        .collect()
}

fn progress_reply(msg: &Message, missing: &[String], done: &str, todo: &str) -> String {
    if missing.is_empty() {
        format!("Congratulations {}, {}. Here's a gold star: :star:", msg.author.mention(), done)
    } else {
        format!("{}, {}: ```\n{}```", msg.author.mention(), todo, missing.join("\n"))
    }
}

pub struct Bosses;

impl Command for Bosses {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        parse_app_matches("bosses", args, &self.parser())?;
        let key = fetch_key(msg, SCOPES)?;
        let killed: Vec<String> = client().get_authed("account/raids", &key.key)?;
        let raids: Vec<Raid> = client().get("raids?ids=all")?;
        let missing = missing_bosses(&raids, &killed);
        msg.channel_id.say(ctx, progress_reply(msg, &missing, "you've cleared everything",
                                                "you haven't killed the following bosses this week"))?;
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("bosses").about(BOSSES_ABOUT)
    }
}

pub struct Cats;

impl Command for Cats {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        parse_app_matches("cats", args, &self.parser())?;
        let key = fetch_key(msg, SCOPES)?;
        let unlocked: Vec<UnlockedCat> = client().get_authed("account/home/cats", &key.key)?;
        let all: Vec<Cat> = client().get("home/cats?ids=all")?;
        let missing = missing_cats(&all, &unlocked);
        msg.channel_id.say(ctx, progress_reply(msg, &missing, "you've collected all the cats",
                                                "you haven't collected the following cats yet"))?;
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("cats").about(CATS_ABOUT)
    }
}

pub fn bosses_module() -> Module {
    Module::with_name("bosses")
        .with_description(BOSSES_ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Bosses)
}

pub fn cats_module() -> Module {
    Module::with_name("cats")
        .with_description(CATS_ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Cats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bosses_left() {
        let raids: Vec<Raid> = serde_json::from_str(r#"[
            {"id": "forsaken_thicket", "wings": [
                {"id": "spirit_vale", "events": [
                    {"id": "vale_guardian", "type": "Boss"},
                    {"id": "spirit_woods", "type": "Checkpoint"},
                    {"id": "gorseval", "type": "Boss"}
                ]},
                {"id": "salvation_pass", "events": [{"id": "slothasor", "type": "Boss"}]}
            ]}
        ]"#).unwrap();
        let killed = vec!["spirit_woods".to_string(), "vale_guardian".to_string()];
        assert_eq!(missing_bosses(&raids, &killed), vec!["Gorseval", "Slothasor"]);

        let everything = vec!["vale_guardian", "spirit_woods", "gorseval", "slothasor"]
            .into_iter().map(String::from).collect::<Vec<_>>();
        assert!(missing_bosses(&raids, &everything).is_empty());
    }

    #[test]
    fn cats_left() {
        let all: Vec<Cat> = serde_json::from_str(r#"[
            {"id": 3, "hint": "grilled_chicken"},
            {"id": 1, "hint": "chicken"},
            {"id": 36},
            {"id": 2, "hint": "fish"}
        ]"#).unwrap();
        let unlocked: Vec<UnlockedCat> = serde_json::from_str(r#"[2, {"id": 1, "hint": "chicken"}]"#).unwrap();
        assert_eq!(missing_cats(&all, &unlocked), vec!["Grilled Chicken", "Cat #36"]);
    }
}
