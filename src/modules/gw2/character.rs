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

//! Character lists, details, equipment, Super Adventure Box progress and creation
//! anniversaries.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clap::{App, AppSettings, Arg, SubCommand};
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;
use serenity::utils::Colour;

use crate::args::{joined_values, parse_plain_matches};
use crate::dispatch::Dispatch;
use crate::gw2::gamedata::gamedata;
use crate::gw2::model::{Character, Equipment, GuildInfo, ItemDetails, ItemStat, SabProgress, Title};
use crate::gw2::{client, encode, ApiError};
use crate::modules::commands::{user_error, Command, Error, Result};
use crate::modules::Module;
use crate::util::{date_part, format_age, ordinal, parse_timestamp, say_chunked, title_case};

use super::{fetch_key, user_colour, CATEGORY};

const ABOUT: &str = "Shows your Guild Wars 2 characters.";
const SCOPES: &[&str] = &["characters"];
const SAB_SCOPES: &[&str] = &["characters", "progression"];

/// Equipment slots shown by `character gear`, in display order.
pub const GEAR_SLOTS: [&str; 16] = [
    "Helm", "Shoulders", "Coat", "Gloves", "Leggings", "Boots", "Ring1", "Ring2", "Amulet",
    "Accessory1", "Accessory2", "Backpack", "WeaponA1", "WeaponA2", "WeaponB1", "WeaponB2",
];

/// Collapses repeated names into `Name x2`, keeping first-seen order.
pub fn count_duplicates(names: &[String]) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for n in names {
        match counts.iter_mut().find(|(seen, _)| seen == n) {
            Some((_, c)) => *c += 1,
            None => counts.push((n, 1))
        }
    }
    counts.into_iter()
        .map(|(n, c)| if c == 1 { n.to_string() } else { format!("{} x{}", n, c) })
        .collect()
}

/// Embed fields for a character's gear: `{stats} {item} [{slot}]`, with the upgrades and
/// infusions slotted into it.
pub fn gear_fields(equipment: &[Equipment], items: &HashMap<u64, ItemDetails>, stats: &HashMap<u64, String>) -> Vec<(String, String)> {
    let name_of = |id: &u64| items.get(id).map_or_else(|| id.to_string(), |i| i.name.clone());
    GEAR_SLOTS.iter()
        .filter_map(|slot| {
            let piece = equipment.iter().find(|e| e.slot.as_deref() == Some(*slot))?;
            let stat_id = piece.stats.map(|s| s.id)
                .or_else(|| items.get(&piece.id).and_then(ItemDetails::stat_id));
            let stat = stat_id.and_then(|id| stats.get(&id)).map_or("", String::as_str);
            let name = format!("{} {} [{}]", stat, name_of(&piece.id), slot).trim_start().to_string();

            let upgrades: Vec<String> = piece.upgrades.iter().map(&name_of).collect();
            let infusions: Vec<String> = piece.infusions.iter().map(&name_of).collect();
            let mut slotted = count_duplicates(&upgrades);
            slotted.extend(count_duplicates(&infusions));
            let value = if slotted.is_empty() { "---".to_string() } else { slotted.join("\n") };
            Some((name, value))
        })
        .collect()
}

/// Everything unlocked in Super Adventure Box, readable.
pub fn sab_unlocks(p: &SabProgress) -> Vec<String> {
    p.unlocks.iter()
        .chain(p.songs.iter())
        .map(|u| title_case(&u.name))
        .collect()
}

/// The next anniversary of a character created at `created`, as `(ordinal, days until)`.
pub fn birthday(created: DateTime<Utc>, now: DateTime<Utc>) -> (String, i64) {
    let days = (now - created).num_days().max(0);
    let years = days / 365;
    (ordinal(years as u64 + 1), 365 - days % 365)
}

pub struct Characters;

impl Characters {
    fn list(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let key = fetch_key(msg, SCOPES)?;
        let chars: Vec<Character> = client().get_authed("characters?ids=all", &key.key)?;
        let lines = chars.iter()
            .map(|c| format!("{} ({})", c.name, c.profession))
            .collect::<Vec<_>>()
            .join("\n");
        msg.channel_id.say(ctx, format!("{}, your characters:", msg.author.mention()))?;
        say_chunked(ctx, msg.channel_id, &lines, true)?;
        Ok(())
    }

    fn info(&self, ctx: &Context, msg: &Message, name: &str) -> Result<()> {
        let key = fetch_key(msg, SCOPES)?;
        let c = self.character(&key.key, name)?;
        let guild = match &c.guild {
            Some(id) => Some(client().get::<GuildInfo>(&format!("guild/{}", id))?),
            None => None
        };
        let title = match c.title {
            Some(id) => client().get::<Title>(&format!("titles/{}", id)).ok(),
            None => None
        };

        let colour = Colour::new(gamedata().profession_color(&c.profession));
        msg.channel_id.send_message(ctx, |m| m.embed(|e| {
            e.title(&c.name)
                .description(format!("{} {} {}", c.race, c.gender, c.profession))
                .colour(colour)
                .field("Level", c.level, true)
                .field("Created", date_part(&c.created), true)
                .field("Played for", format_age(c.age), false)
                .field("Deaths", c.deaths, true)
                .field("Deaths per hour", format!("{:.1}", c.deaths_per_hour()), true);
            if let Some(t) = &title {
                e.field("Title", &t.name, true);
            }
            if let Some(g) = &guild {
                e.field("Representing", format!("[{}] {}", g.tag, g.name), false);
            }
            e.footer(|f| f.text(format!("A level {} {}", c.level, c.profession)))
        }))?;
        Ok(())
    }

    fn character(&self, key: &str, name: &str) -> Result<Character> {
        match client().get_authed(&format!("characters/{}", encode(name)), key) {
            Err(ApiError::NotFound) => user_error("Invalid character name"),
            r => Ok(r?)
        }
    }

    fn gear(&self, ctx: &Context, msg: &Message, name: &str) -> Result<()> {
        let key = fetch_key(msg, SCOPES)?;
        let c = self.character(&key.key, name)?;
        let equipped: Vec<&Equipment> = c.equipment.iter()
            .filter(|e| e.slot.as_deref().map_or(false, |s| GEAR_SLOTS.contains(&s)))
            .collect();
        if equipped.is_empty() {
            return user_error(format!("{} has nothing equipped.", c.name));
        }

        let mut ids: Vec<u64> = equipped.iter()
            .flat_map(|e| std::iter::once(e.id).chain(e.upgrades.iter().copied()).chain(e.infusions.iter().copied()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let items: HashMap<u64, ItemDetails> = client().get_many::<ItemDetails>("items", &ids)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        let mut stat_ids: Vec<u64> = equipped.iter()
            .filter_map(|e| e.stats.map(|s| s.id).or_else(|| items.get(&e.id).and_then(ItemDetails::stat_id)))
            .collect();
        stat_ids.sort_unstable();
        stat_ids.dedup();
        let stats: HashMap<u64, String> = client().get_many::<ItemStat>("itemstats", &stat_ids)?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let fields = gear_fields(&c.equipment, &items, &stats);
        let colour = Colour::new(gamedata().profession_color(&c.profession));
        msg.channel_id.send_message(ctx, |m| m.embed(|e| {
            e.author(|a| a.name(&c.name))
                .description("Gear")
                .colour(colour);
            for (name, value) in &fields {
                e.field(name, value, false);
            }
            e.footer(|f| f.text(format!("A level {} {}", c.level, c.profession.to_lowercase())))
        }))?;
        Ok(())
    }

    fn sab(&self, ctx: &Context, msg: &Message, name: &str) -> Result<()> {
        let key = fetch_key(msg, SAB_SCOPES)?;
        let progress: SabProgress = match client().get_authed(&format!("characters/{}/sab", encode(name)), &key.key) {
            Err(ApiError::NotFound) => return user_error("Invalid character name"),
            r => r?
        };
        let unlocks = sab_unlocks(&progress);
        if unlocks.is_empty() {
            return user_error(format!("{} hasn't unlocked anything in Super Adventure Box.", name));
        }

        let colour = user_colour(ctx, msg);
        msg.channel_id.send_message(ctx, |m| m.embed(|e| {
            e.title("SAB Character Info").colour(colour);
            // Embeds hold at most 25 fields.
            for u in unlocks.iter().take(25) {
                e.field(u, "Unlocked", true);
            }
            e
        }))?;
        Ok(())
    }

    fn birthdays(&self, ctx: &Context, msg: &Message) -> Result<()> {
        let key = fetch_key(msg, SCOPES)?;
        let chars: Vec<Character> = client().get_authed("characters?ids=all", &key.key)?;
        let now = Utc::now();
        let mut upcoming: Vec<(i64, String)> = chars.iter()
            .filter_map(|c| parse_timestamp(&c.created).map(|t| (c, t)))
            .map(|(c, t)| {
                let (nth, days) = birthday(t, now);
                (days, format!("{}: {} birthday in {} days", c.name, nth, days))
            })
            .collect();
        upcoming.sort();

        let text = upcoming.into_iter().map(|(_, l)| l).collect::<Vec<_>>().join("\n");
        msg.channel_id.say(ctx, format!("{}, upcoming character birthdays:", msg.author.mention()))?;
        say_chunked(ctx, msg.channel_id, &text, true)?;
        Ok(())
    }
}

impl Command for Characters {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_plain_matches("character", args, &self.parser())?;
        match m.subcommand() {
            ("list", _) => self.list(ctx, msg),
            ("info", Some(sub)) => self.info(ctx, msg, &joined_values(sub, "name")),
            ("gear", Some(sub)) => self.gear(ctx, msg, &joined_values(sub, "name")),
            ("sab", Some(sub)) => self.sab(ctx, msg, &joined_values(sub, "name")),
            ("birthdays", _) => self.birthdays(ctx, msg),
            _ => Err(Error::Other)
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("character")
            .about(ABOUT)
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("list")
                .about("Lists your characters."))
            .subcommand(SubCommand::with_name("info")
                .about("Shows details about one character.")
                .arg(Arg::with_name("name")
                    .required(true)
                    .multiple(true)))
            .subcommand(SubCommand::with_name("gear")
                .about("Shows what one of your characters is wearing.")
                .arg(Arg::with_name("name")
                    .required(true)
                    .multiple(true)))
            .subcommand(SubCommand::with_name("sab")
                .about("Shows what a character has unlocked in Super Adventure Box. Needs the progression scope too.")
                .arg(Arg::with_name("name")
                    .required(true)
                    .multiple(true)))
            .subcommand(SubCommand::with_name("birthdays")
                .about("Shows when your characters' creation anniversaries are."))
    }
}

pub fn character_module() -> Module {
    Module::with_name("character")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Characters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn birthdays() {
        let created = Utc.ymd(2015, 8, 27).and_hms(12, 0, 0);
        assert_eq!(birthday(created, created + chrono::Duration::days(10)), ("1st".to_string(), 355));
        assert_eq!(birthday(created, created + chrono::Duration::days(365 * 2 + 364)), ("3rd".to_string(), 1));
        assert_eq!(birthday(created, created), ("1st".to_string(), 365));
    }

    fn details(id: u64, name: &str, stat: Option<u64>) -> (u64, ItemDetails) {
        let json = match stat {
            Some(s) => format!(r#"{{"id": {}, "name": "{}", "details": {{"infix_upgrade": {{"id": {}}}}}}}"#, id, name, s),
            None => format!(r#"{{"id": {}, "name": "{}"}}"#, id, name),
        };
        (id, serde_json::from_str(&json).unwrap())
    }

    #[test]
    fn duplicates_are_counted() {
        let names: Vec<String> = vec!["Mighty Infusion", "Superior Rune of the Scholar", "Mighty Infusion"]
            .into_iter().map(String::from).collect();
        assert_eq!(count_duplicates(&names), vec!["Mighty Infusion x2", "Superior Rune of the Scholar"]);
        assert!(count_duplicates(&[]).is_empty());
    }

    #[test]
    fn gear() {
        let equipment: Vec<Equipment> = serde_json::from_str(r#"[
            {"id": 30, "slot": "WeaponA1", "upgrades": [24615], "stats": {"id": 161}},
            {"id": 10, "slot": "Helm", "upgrades": [24836], "infusions": [49432, 49432]},
            {"id": 20, "slot": "Boots"},
            {"id": 40, "slot": "Sickle"}
        ]"#).unwrap();
        let items: HashMap<u64, ItemDetails> = vec![
            details(10, "Exalted Masque", Some(1163)),
            details(20, "Plain Boots", None),
            details(30, "Twilight", None),
            details(24615, "Superior Sigil of Force", None),
            details(24836, "Superior Rune of the Scholar", None),
            details(49432, "+9 Agony Infusion", None),
        ].into_iter().collect();
        let stats: HashMap<u64, String> = vec![(1163, "Berserker's".to_string()), (161, "Berserker's".to_string())]
            .into_iter().collect();

        let fields = gear_fields(&equipment, &items, &stats);
        assert_eq!(fields, vec![
            ("Berserker's Exalted Masque [Helm]".to_string(), "Superior Rune of the Scholar\n+9 Agony Infusion x2".to_string()),
            ("Plain Boots [Boots]".to_string(), "---".to_string()),
            ("Berserker's Twilight [WeaponA1]".to_string(), "Superior Sigil of Force".to_string()),
        ]);
    }

    #[test]
    fn sab() {
        let p: SabProgress = serde_json::from_str(r#"{
            "zones": [{"id": 1, "mode": "normal", "world": 1, "zone": 1}],
            "unlocks": [{"id": 1, "name": "slingshot"}, {"id": 2, "name": "bow"}],
            "songs": [{"id": 1, "name": "secret_song"}]
        }"#).unwrap();
        assert_eq!(sab_unlocks(&p), vec!["Slingshot", "Bow", "Secret Song"]);
    }
}
