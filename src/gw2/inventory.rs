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

//! Everything an account holds, and the counting done over it: item searches and the
//! Legendary Insight tally.

use std::collections::HashSet;

use crate::gw2::gamedata::Insights;
use crate::gw2::model::{Character, ItemStack};
use crate::gw2::{Client, Result};

/// Scopes needed to read [Holdings].
pub const HOLDINGS_SCOPES: &[&str] = &["inventories", "characters"];

/// The contents of an account's bank, material storage, shared slots and characters.
#[derive(Debug, Clone, Default)]
pub struct Holdings {
    pub bank: Vec<Option<ItemStack>>,
    pub materials: Vec<Option<ItemStack>>,
    pub shared: Vec<Option<ItemStack>>,
    pub characters: Vec<Character>,
}

fn stacks_of<'a>(slots: &'a [Option<ItemStack>], pred: &'a dyn Fn(u64) -> bool) -> impl Iterator<Item=u64> + 'a {
    slots.iter()
        .flatten()
        .filter(move |s| pred(s.id))
        .map(|s| u64::from(s.count))
}

impl Holdings {
    /// Reads everything with one request per storage.
    pub fn fetch(client: &Client, key: &str) -> Result<Self> {
        Ok(Holdings {
            bank: client.get_authed("account/bank", key)?,
            materials: client.get_authed("account/materials", key)?,
            shared: client.get_authed("account/inventory", key)?,
            characters: client.get_authed("characters?page=0", key)?,
        })
    }

    fn bag_count(c: &Character, pred: &dyn Fn(u64) -> bool) -> u64 {
        c.bags.iter()
            .flatten()
            .map(|b| stacks_of(&b.inventory, pred).sum::<u64>())
            .sum()
    }

    fn equipped_count(c: &Character, pred: &dyn Fn(u64) -> bool) -> u64 {
        c.equipment.iter().filter(|e| pred(e.id)).count() as u64
    }

    /// Stacked items matching `pred`, everywhere except equipment.
    pub fn stacked(&self, pred: &dyn Fn(u64) -> bool) -> u64 {
        stacks_of(&self.bank, pred).sum::<u64>()
            + stacks_of(&self.materials, pred).sum::<u64>()
            + stacks_of(&self.shared, pred).sum::<u64>()
            + self.characters.iter().map(|c| Self::bag_count(c, pred)).sum::<u64>()
    }

    /// Equipped items matching `pred`, one per slot.
    pub fn equipped(&self, pred: &dyn Fn(u64) -> bool) -> u64 {
        self.characters.iter().map(|c| Self::equipped_count(c, pred)).sum()
    }

    /// Where an item is, as `(place, count)` lines in display order, skipping empty places.
    /// Characters are listed by upper-cased name.
    pub fn locations(&self, item: u64) -> Vec<(String, u64)> {
        let pred = move |id: u64| id == item;
        let mut out = vec![
            ("BANK".to_string(), stacks_of(&self.bank, &pred).sum::<u64>()),
            ("MATERIAL STORAGE".to_string(), stacks_of(&self.materials, &pred).sum::<u64>()),
            ("SHARED".to_string(), stacks_of(&self.shared, &pred).sum::<u64>()),
        ];
        out.extend(self.characters.iter().map(|c| (
            c.name.to_uppercase(),
            Self::bag_count(c, &pred) + Self::equipped_count(c, &pred)
        )));
        out.retain(|(_, n)| *n > 0);
        out
    }
}

/// Counts of everything that is, or was crafted from, Legendary Insights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsightTally {
    /// Insights on hand.
    pub insights: u64,
    pub prowess: u64,
    pub insignia: u64,
    pub refined_armor: u64,
    pub perfected_armor: u64,
}

impl InsightTally {
    /// Counts everything in `h`. Armor counts whether stored or equipped; the other items
    /// can't be equipped.
    pub fn count(h: &Holdings, ids: &Insights) -> Self {
        let refined: HashSet<u64> = ids.refined_envoy_armor.values().copied().collect();
        let perfected: HashSet<u64> = ids.perfected_envoy_armor.values().copied().collect();
        let is_refined = |id: u64| refined.contains(&id);
        let is_perfected = |id: u64| perfected.contains(&id);

        InsightTally {
            insights: h.stacked(&|id: u64| id == ids.legendary_insight),
            prowess: h.stacked(&|id: u64| id == ids.gift_of_prowess),
            insignia: h.stacked(&|id: u64| id == ids.envoy_insignia),
            refined_armor: h.stacked(&is_refined) + h.equipped(&is_refined),
            perfected_armor: h.stacked(&is_perfected) + h.equipped(&is_perfected),
        }
    }

    pub fn li_prowess(&self) -> u64 {
        self.prowess * 25
    }

    pub fn li_insignia(&self) -> u64 {
        self.insignia * 25
    }

    /// The first refined set is free. Perfected pieces up to a full set stand in for the
    /// refined pieces they were made from.
    pub fn li_refined_armor(&self) -> u64 {
        (self.perfected_armor.min(6) + self.refined_armor).saturating_sub(6) * 25
    }

    /// The first perfected set costs half.
    pub fn li_perfected_armor(&self) -> u64 {
        self.perfected_armor.min(6) * 25 + self.perfected_armor.saturating_sub(6) * 50
    }

    /// Insights spent on crafting.
    pub fn crafted(&self) -> u64 {
        self.li_prowess() + self.li_insignia() + self.li_refined_armor() + self.li_perfected_armor()
    }

    /// Every insight earned, spent or not.
    pub fn total(&self) -> u64 {
        self.insights + self.crafted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn insights() -> Insights {
        let mut refined = HashMap::new();
        refined.insert("heavy_helm".to_string(), 100);
        refined.insert("heavy_boots".to_string(), 101);
        let mut perfected = HashMap::new();
        perfected.insert("heavy_helm".to_string(), 200);
        perfected.insert("heavy_boots".to_string(), 201);
        Insights {
            legendary_insight: 1,
            gift_of_prowess: 2,
            envoy_insignia: 3,
            refined_envoy_armor: refined,
            perfected_envoy_armor: perfected,
        }
    }

    fn holdings() -> Holdings {
        let chars: Vec<Character> = serde_json::from_str(r#"[
            {"name": "Tank", "race": "Norn", "gender": "Male", "profession": "Warrior", "age": 10,
             "created": "2015-08-27T16:47:00Z",
             "bags": [{"id": 9, "inventory": [{"id": 1, "count": 3}, null, {"id": 100, "count": 1}]}, null],
             "equipment": [{"id": 200, "slot": "Helm"}, {"id": 201, "slot": "Boots"}, {"id": 50}]},
            {"name": "Alt", "race": "Asura", "gender": "Female", "profession": "Mesmer", "age": 10,
             "created": "2016-01-01T00:00:00Z"}
        ]"#).unwrap();
        Holdings {
            bank: vec![Some(ItemStack { id: 1, count: 10 }), None, Some(ItemStack { id: 2, count: 1 })],
            materials: vec![Some(ItemStack { id: 1, count: 5 })],
            shared: vec![None, Some(ItemStack { id: 3, count: 2 })],
            characters: chars,
        }
    }

    #[test]
    fn tally() {
        let t = InsightTally::count(&holdings(), &insights());
        assert_eq!(t, InsightTally { insights: 18, prowess: 1, insignia: 2, refined_armor: 1, perfected_armor: 2 });
        assert_eq!(t.li_prowess(), 25);
        assert_eq!(t.li_insignia(), 50);
        assert_eq!(t.li_refined_armor(), 0);
        assert_eq!(t.li_perfected_armor(), 50);
        assert_eq!(t.crafted(), 125);
        assert_eq!(t.total(), 143);
    }

    #[test]
    fn armor_formula() {
        let full = InsightTally { perfected_armor: 6, refined_armor: 6, ..Default::default() };
        assert_eq!(full.li_perfected_armor(), 150);
        assert_eq!(full.li_refined_armor(), 150);

        let second_set = InsightTally { perfected_armor: 12, ..Default::default() };
        assert_eq!(second_set.li_perfected_armor(), 450);
        assert_eq!(second_set.li_refined_armor(), 0);

        let free_refined = InsightTally { refined_armor: 6, ..Default::default() };
        assert_eq!(free_refined.li_refined_armor(), 0);
        assert_eq!(free_refined.total(), 0);
    }

    #[test]
    fn locations() {
        let h = holdings();
        assert_eq!(h.locations(1), vec![
            ("BANK".to_string(), 10),
            ("MATERIAL STORAGE".to_string(), 5),
            ("TANK".to_string(), 3),
        ]);
        assert_eq!(h.locations(201), vec![("TANK".to_string(), 1)]);
        assert!(h.locations(999).is_empty());
    }
}
