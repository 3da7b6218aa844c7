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

//! Response shapes for the API endpoints the bot uses. Only the fields the bot reads are
//! declared; everything else is ignored by serde.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An entry from `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub level: u32,
    pub rarity: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub chat_link: String,
}

/// `tokeninfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// `account`.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub name: String,
    pub world: u64,
    pub created: String,
    #[serde(default)]
    pub commander: bool,
    #[serde(default)]
    pub fractal_level: Option<u32>,
    #[serde(default)]
    pub wvw_rank: Option<u32>,
    #[serde(default)]
    pub guilds: Vec<String>,
    #[serde(default)]
    pub guild_leader: Option<Vec<String>>,
}

/// Game counts for a profession, a ladder, or everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WinLoss {
    pub wins: u64,
    pub losses: u64,
    pub desertions: u64,
    pub byes: u64,
    pub forfeits: u64,
}

impl WinLoss {
    /// Every game played, however it ended.
    pub fn total(&self) -> u64 {
        self.wins + self.losses + self.desertions + self.byes + self.forfeits
    }

    /// Byes count as wins.
    pub fn effective_wins(&self) -> u64 {
        self.wins + self.byes
    }

    /// Whole-number win percentage, zero when nothing was played.
    pub fn win_ratio(&self) -> u64 {
        match self.total() {
            0 => 0,
            t => self.effective_wins() * 100 / t
        }
    }
}

/// `pvp/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct PvpStats {
    pub pvp_rank: u32,
    #[serde(default)]
    pub pvp_rank_rollovers: u32,
    #[serde(default)]
    pub aggregate: WinLoss,
    #[serde(default)]
    pub professions: HashMap<String, WinLoss>,
    #[serde(default)]
    pub ladders: HashMap<String, WinLoss>,
}

impl PvpStats {
    /// Displayed rank, including rollovers past the cap.
    pub fn rank(&self) -> u32 {
        self.pvp_rank + self.pvp_rank_rollovers
    }
}

/// One stack of items in a bag, the bank, or shared inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ItemStack {
    pub id: u64,
    #[serde(default = "one")]
    pub count: u32,
}

fn one() -> u32 {
    1
}

/// A character's bag. Empty slots are `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct Bag {
    pub id: u64,
    #[serde(default)]
    pub inventory: Vec<Option<ItemStack>>,
}

/// An equipped item.
#[derive(Debug, Clone, Deserialize)]
pub struct Equipment {
    pub id: u64,
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub upgrades: Vec<u64>,
    #[serde(default)]
    pub infusions: Vec<u64>,
    /// Present when the stats were chosen rather than fixed by the item.
    #[serde(default)]
    pub stats: Option<StatChoice>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatChoice {
    pub id: u64,
}

/// The parts of a full `items` entry that say which stats an item has.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDetails {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub details: Option<ItemStatDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemStatDetails {
    #[serde(default)]
    pub infix_upgrade: Option<StatChoice>,
}

impl ItemDetails {
    /// The fixed stat set of the item, if it has one.
    pub fn stat_id(&self) -> Option<u64> {
        self.details.as_ref()
            .and_then(|d| d.infix_upgrade)
            .map(|s| s.id)
    }
}

/// `itemstats`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemStat {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// `characters/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Character {
    pub name: String,
    pub race: String,
    pub gender: String,
    pub profession: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub guild: Option<String>,
    pub age: u64,
    pub created: String,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub title: Option<u64>,
    #[serde(default)]
    pub bags: Vec<Option<Bag>>,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
}

impl Character {
    /// Deaths per hour played, rounded to one decimal.
    pub fn deaths_per_hour(&self) -> f64 {
        if self.age == 0 {
            return 0.0;
        }
        let dph = self.deaths as f64 / (self.age as f64 / 3600.0);
        (dph * 10.0).round() / 10.0
    }
}

/// `titles/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Title {
    pub name: String,
}

/// One line of `account/wallet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WalletEntry {
    pub id: u64,
    pub value: u64,
}

/// `currencies`.
#[derive(Debug, Clone, Deserialize)]
pub struct Currency {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// `guild/{id}`. Leader-only fields are absent for everyone else.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildInfo {
    pub id: String,
    pub name: String,
    pub tag: String,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub motd: Option<String>,
    #[serde(default)]
    pub influence: Option<u64>,
    #[serde(default)]
    pub aetherium: Option<u64>,
    #[serde(default)]
    pub resonance: Option<u64>,
    #[serde(default)]
    pub favor: Option<u64>,
    #[serde(default)]
    pub member_count: Option<u32>,
    #[serde(default)]
    pub member_capacity: Option<u32>,
}

/// `guild/{id}/members`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    pub name: String,
    pub rank: String,
}

/// `guild/{id}/ranks`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildRank {
    pub id: String,
    pub order: u32,
}

/// What a treasury item is needed for.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TreasuryNeed {
    pub upgrade_id: u64,
    pub count: u32,
}

/// `guild/{id}/treasury`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreasuryEntry {
    pub item_id: u64,
    pub count: u32,
    #[serde(default)]
    pub needed_by: Vec<TreasuryNeed>,
}

impl TreasuryEntry {
    /// Total count needed across every upgrade.
    pub fn needed(&self) -> u32 {
        self.needed_by.iter().map(|n| n.count).sum()
    }
}

/// `worlds`.
#[derive(Debug, Clone, Deserialize)]
pub struct World {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub population: String,
}

/// A value per WvW team.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Teams<T> {
    pub red: T,
    pub green: T,
    pub blue: T,
}

impl<T> Teams<T> {
    /// The value for `color`, one of red, green or blue.
    pub fn get(&self, color: &str) -> Option<&T> {
        match color {
            "red" => Some(&self.red),
            "green" => Some(&self.green),
            "blue" => Some(&self.blue),
            _ => None
        }
    }

    /// Every team as `(color, value)`.
    pub fn iter(&self) -> impl Iterator<Item=(&'static str, &T)> {
        vec![("red", &self.red), ("green", &self.green), ("blue", &self.blue)].into_iter()
    }
}

/// A capturable WvW objective.
#[derive(Debug, Clone, Deserialize)]
pub struct Objective {
    pub owner: String,
    #[serde(default)]
    pub points_tick: u64,
}

/// A map within a WvW match.
#[derive(Debug, Clone, Deserialize)]
pub struct WvwMap {
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

/// `wvw/matches?world={id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WvwMatch {
    pub id: String,
    pub all_worlds: Teams<Vec<u64>>,
    pub scores: Teams<u64>,
    pub kills: Teams<u64>,
    pub deaths: Teams<u64>,
    #[serde(default)]
    pub victory_points: Teams<u64>,
    #[serde(default)]
    pub maps: Vec<WvwMap>,
}

impl WvwMatch {
    /// The team color `world` plays on in this match.
    pub fn color_of(&self, world: u64) -> Option<&'static str> {
        self.all_worlds.iter()
            .find(|(_, ws)| ws.contains(&world))
            .map(|(c, _)| c)
    }

    /// Points per tick `color` earns from the objectives it holds.
    pub fn points_per_tick(&self, color: &str) -> u64 {
        self.maps.iter()
            .flat_map(|m| m.objectives.iter())
            .filter(|o| o.owner.eq_ignore_ascii_case(color))
            .map(|o| o.points_tick)
            .sum()
    }
}

/// Quantity and best price on one side of the trading post.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PriceInfo {
    pub quantity: u64,
    pub unit_price: u64,
}

/// `commerce/prices/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Prices {
    pub id: u64,
    pub buys: PriceInfo,
    pub sells: PriceInfo,
}

/// An outstanding order from `commerce/transactions/current/*`.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    pub item_id: u64,
    pub price: u64,
    pub quantity: u64,
    #[serde(default)]
    pub created: String,
}

/// `commerce/exchange/coins`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GemExchange {
    pub coins_per_gem: u64,
    pub quantity: u64,
}

/// `build`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Build {
    pub id: u64,
}

/// Level range a daily applies to.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LevelRange {
    pub min: u32,
    pub max: u32,
}

/// One daily achievement as listed by `achievements/daily`.
#[derive(Debug, Clone, Deserialize)]
pub struct Daily {
    pub id: u64,
    pub level: LevelRange,
    #[serde(default)]
    pub required_access: Value,
}

impl Daily {
    /// Whether the daily is for max level characters with the first expansion. The API has
    /// used both a list of products and a `{product, condition}` object for this.
    pub fn for_expansion_players(&self) -> bool {
        if self.level.max != 80 {
            return false;
        }
        match &self.required_access {
            Value::Array(products) => products.iter().any(|p| p == "HeartOfThorns"),
            Value::Object(o) => o.get("product").map_or(false, |p| p == "HeartOfThorns")
                && o.get("condition").map_or(true, |c| c == "HasAccess"),
            Value::Null => true,
            _ => false
        }
    }
}

/// `achievements/daily`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Dailies {
    pub pve: Vec<Daily>,
    pub pvp: Vec<Daily>,
    pub wvw: Vec<Daily>,
    pub fractals: Vec<Daily>,
}

impl Dailies {
    /// The dailies of one category: pve, pvp, wvw or fractals.
    pub fn category(&self, name: &str) -> Option<&[Daily]> {
        match name {
            "pve" => Some(&self.pve),
            "pvp" => Some(&self.pvp),
            "wvw" => Some(&self.wvw),
            "fractals" => Some(&self.fractals),
            _ => None
        }
    }
}

/// `achievements`.
#[derive(Debug, Clone, Deserialize)]
pub struct Achievement {
    pub id: u64,
    pub name: String,
}

/// One fact listed on a skill, such as its recharge or range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillFact {
    #[serde(rename = "type")]
    pub fact_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

/// `skills`. Most fields are missing on some skill or another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub professions: Vec<String>,
    #[serde(default)]
    pub facts: Vec<SkillFact>,
}

/// Something named in `characters/{name}/sab`.
#[derive(Debug, Clone, Deserialize)]
pub struct SabUnlock {
    pub name: String,
}

/// `characters/{name}/sab`.
#[derive(Debug, Clone, Deserialize)]
pub struct SabProgress {
    #[serde(default)]
    pub unlocks: Vec<SabUnlock>,
    #[serde(default)]
    pub songs: Vec<SabUnlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RaidEvent {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RaidWing {
    pub id: String,
    #[serde(default)]
    pub events: Vec<RaidEvent>,
}

/// `raids`.
#[derive(Debug, Clone, Deserialize)]
pub struct Raid {
    pub id: String,
    #[serde(default)]
    pub wings: Vec<RaidWing>,
}

/// `home/cats`.
#[derive(Debug, Clone, Deserialize)]
pub struct Cat {
    pub id: u64,
    #[serde(default)]
    pub hint: Option<String>,
}

/// One line of `account/home/cats`, which is a bare ID or a whole cat depending on the schema
/// version the API answers with.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UnlockedCat {
    Id(u64),
    Cat(Cat),
}

impl UnlockedCat {
    pub fn id(&self) -> u64 {
        match self {
            UnlockedCat::Id(id) => *id,
            UnlockedCat::Cat(c) => c.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_ratios() {
        let w: WinLoss = serde_json::from_str(r#"{"wins": 6, "losses": 3, "desertions": 0, "byes": 1, "forfeits": 0}"#).unwrap();
        assert_eq!(w.total(), 10);
        assert_eq!(w.effective_wins(), 7);
        assert_eq!(w.win_ratio(), 70);
        assert_eq!(WinLoss::default().win_ratio(), 0);

        let w = WinLoss { wins: 1, losses: 2, ..WinLoss::default() };
        assert_eq!(w.win_ratio(), 33);
    }

    #[test]
    fn wvw_match() {
        let m: WvwMatch = serde_json::from_str(r#"{
            "id": "1-1",
            "all_worlds": {"red": [1001, 1015], "green": [1002], "blue": [1003]},
            "scores": {"red": 10, "green": 20, "blue": 30},
            "kills": {"red": 100, "green": 50, "blue": 25},
            "deaths": {"red": 40, "green": 60, "blue": 80},
            "victory_points": {"red": 1, "green": 2, "blue": 3},
            "maps": [
                {"objectives": [{"owner": "Red", "points_tick": 5}, {"owner": "Blue", "points_tick": 2}]},
                {"objectives": [{"owner": "Red", "points_tick": 10}, {"owner": "Neutral"}]}
            ]
        }"#).unwrap();
        assert_eq!(m.color_of(1015), Some("red"));
        assert_eq!(m.color_of(1003), Some("blue"));
        assert_eq!(m.color_of(2001), None);
        assert_eq!(m.points_per_tick("red"), 15);
        assert_eq!(*m.scores.get("green").unwrap(), 20);
    }

    #[test]
    fn daily_filtering() {
        let d: Dailies = serde_json::from_str(r#"{
            "pve": [
                {"id": 1, "level": {"min": 80, "max": 80}, "required_access": ["GuildWars2", "HeartOfThorns"]},
                {"id": 2, "level": {"min": 1, "max": 79}, "required_access": ["GuildWars2", "HeartOfThorns"]},
                {"id": 3, "level": {"min": 80, "max": 80}, "required_access": ["GuildWars2"]},
                {"id": 4, "level": {"min": 80, "max": 80}, "required_access": {"product": "HeartOfThorns", "condition": "HasAccess"}},
                {"id": 5, "level": {"min": 80, "max": 80}, "required_access": {"product": "HeartOfThorns", "condition": "NoAccess"}}
            ]
        }"#).unwrap();
        let kept: Vec<u64> = d.category("pve").unwrap().iter()
            .filter(|x| x.for_expansion_players())
            .map(|x| x.id)
            .collect();
        assert_eq!(kept, vec![1, 4]);
        assert!(d.category("fractals").unwrap().is_empty());
        assert!(d.category("raids").is_none());
    }

    #[test]
    fn character_stats() {
        let c: Character = serde_json::from_str(r#"{
            "name": "Some Char", "race": "Norn", "gender": "Female", "profession": "Guardian",
            "level": 80, "age": 7200, "created": "2015-08-27T16:47:00Z", "deaths": 3,
            "bags": [null, {"id": 8932, "size": 20, "inventory": [null, {"id": 19976, "count": 4}]}]
        }"#).unwrap();
        assert_eq!(c.deaths_per_hour(), 1.5);
        assert!(c.guild.is_none());
        assert_eq!(c.bags.len(), 2);
    }
}
