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

//! Skill lookups from the skill index.

use std::borrow::Cow;

use clap::{App, Arg};
use serde_json::Value;
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::args::{joined_values, parse_plain_matches};
use crate::db::global::global_connection;
use crate::dispatch::Dispatch;
use crate::gw2::model::Skill;
use crate::modules::commands::{Command, Result};
use crate::modules::Module;

use super::{find_skills, with_choice, SearchReplies, CATEGORY};

const ABOUT: &str = "Shows information about a skill.";
const PROFESSION_COUNT: usize = 9;

fn skill_label(s: &Skill) -> String {
    s.name.clone()
}

const SKILL_SEARCH: SearchReplies<Skill> = SearchReplies {
    not_found: "Your search gave me no results, sorry. Check for typos.",
    timeout: "No skill was picked.",
    noun: "skill",
    label: skill_label,
};

fn fact_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string()
    }
}

/// Embed fields for a skill: who can use it, then its cooldown, ranges, counts and combo
/// fields. Other kinds of facts are left out.
pub fn skill_fields(skill: &Skill) -> Vec<(String, String)> {
    let mut out = Vec::new();
    match skill.professions.len() {
        0 => {}
        1 => out.push(("Profession".to_string(), skill.professions[0].clone())),
        PROFESSION_COUNT => out.push(("Professions".to_string(), "All".to_string())),
        _ => out.push(("Professions".to_string(), skill.professions.join(", ")))
    }

    for fact in &skill.facts {
        let text = fact.text.clone().unwrap_or_default();
        let field = match fact.fact_type.as_str() {
            "Recharge" => fact.value.as_ref().map(|v| ("Cooldown".to_string(), fact_value(v))),
            "Distance" | "Number" => fact.value.as_ref().map(|v| (text, fact_value(v))),
            "ComboField" => fact.field_type.clone().map(|f| (text, f)),
            _ => None
        };
        if let Some((name, value)) = field {
            if !name.is_empty() {
                out.push((name, value));
            }
        }
    }
    out
}

fn show_skill(ctx: &Context, msg: &Message, skill: &Skill) -> Result<()> {
    let fields = skill_fields(skill);
    msg.channel_id.send_message(ctx, |m| m.embed(|e| {
        e.title(&skill.name);
        if let Some(d) = &skill.description {
            e.description(d);
        }
        if let Some(i) = &skill.icon {
            e.thumbnail(i);
        }
        e.fields(fields.into_iter().map(|(n, v)| (n, v, true)))
    }))?;
    Ok(())
}

pub struct SkillInfo;

impl Command for SkillInfo {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_plain_matches("skillinfo", args, &self.parser())?;
        let query = joined_values(&m, "skill");
        let matches = find_skills(&*global_connection()?, &query)?;
        with_choice(disp, ctx, msg, matches, &SKILL_SEARCH, Box::new(|ctx: &Context, msg: &Message, skill: Skill| {
            show_skill(ctx, msg, &skill)
        }))
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("skillinfo")
            .about(ABOUT)
            .arg(Arg::with_name("skill")
                .help("The skill's name, or part of it.")
                .required(true)
                .multiple(true))
    }
}

pub fn skill_module() -> Module {
    Module::with_name("skillinfo")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(SkillInfo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields() {
        let skill: Skill = serde_json::from_str(r#"{
            "id": 5548, "name": "Lava Font", "professions": ["Elementalist"],
            "facts": [
                {"text": "Recharge", "type": "Recharge", "value": 6},
                {"text": "Radius", "type": "Distance", "distance": 240, "value": 240},
                {"text": "Combo Field", "type": "ComboField", "field_type": "Fire"},
                {"text": "Damage", "type": "Damage", "hit_count": 1, "dmg_multiplier": 0.5}
            ]
        }"#).unwrap();
        assert_eq!(skill_fields(&skill), vec![
            ("Profession".to_string(), "Elementalist".to_string()),
            ("Cooldown".to_string(), "6".to_string()),
            ("Radius".to_string(), "240".to_string()),
            ("Combo Field".to_string(), "Fire".to_string()),
        ]);

        let shared: Skill = serde_json::from_str(r#"{
            "id": 1, "name": "Stomp",
            "professions": ["Guardian", "Warrior", "Engineer", "Ranger", "Thief", "Elementalist", "Mesmer", "Necromancer", "Revenant"]
        }"#).unwrap();
        assert_eq!(skill_fields(&shared), vec![("Professions".to_string(), "All".to_string())]);
    }

    #[test]
    fn parses_free_text() {
        let m = parse_plain_matches("skillinfo", Cow::Borrowed("Dragon's Maw"), &SkillInfo.parser()).unwrap();
        assert_eq!(joined_values(&m, "skill"), "Dragon's Maw");
    }
}
