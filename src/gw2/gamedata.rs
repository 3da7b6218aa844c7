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

//! Static game facts the API doesn't provide conveniently: item IDs for Legendary Insight
//! sources, profession and rarity colors, and how wallet currencies are grouped.
//!
//! A copy is bundled in the binary. `TYRIABOT_GAMEDATA` may point at a replacement file.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::data::resource_string;

/// Item IDs that count towards Legendary Insights.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Insights {
    pub legendary_insight: u64,
    pub gift_of_prowess: u64,
    pub envoy_insignia: u64,
    pub refined_envoy_armor: HashMap<String, u64>,
    pub perfected_envoy_armor: HashMap<String, u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profession {
    pub color: u32,
}

/// A currency shown by one of the wallet subcommands.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletCurrency {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletGroups {
    pub show: Vec<WalletCurrency>,
    pub tokens: Vec<WalletCurrency>,
    pub maps: Vec<WalletCurrency>,
}

/// Everything in `gamedata.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameData {
    pub insights: Insights,
    pub professions: HashMap<String, Profession>,
    pub rarity_colors: HashMap<String, u32>,
    pub wallet: WalletGroups,
}

impl GameData {
    /// Embed color for a profession, by name in any case.
    pub fn profession_color(&self, profession: &str) -> u32 {
        self.professions.get(&profession.to_lowercase())
            .map_or(0, |p| p.color)
    }

    /// Whether `name` is a profession, in any case.
    pub fn is_profession(&self, name: &str) -> bool {
        self.professions.contains_key(&name.to_lowercase())
    }

    /// Embed color for an item rarity.
    pub fn rarity_color(&self, rarity: &str) -> u32 {
        self.rarity_colors.get(rarity).copied().unwrap_or(0)
    }
}

fn load() -> GameData {
    if let Ok(path) = std::env::var("TYRIABOT_GAMEDATA") {
        let loaded = std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| serde_json::from_str(&s).map_err(anyhow::Error::from));
        match loaded {
            Ok(d) => {
                info!("Loaded game data from {}", path);
                return d;
            }
            Err(e) => error!("Couldn't load game data from {}, using the bundled copy: {}", path, e)
        }
    }

    resource_string("gamedata.json")
        .and_then(|s| serde_json::from_str(&s)
            .map_err(|e| error!("Bundled game data is malformed: {}", e))
            .ok())
        .unwrap_or_default()
}

static GAMEDATA: Lazy<GameData> = Lazy::new(load);

/// The game data, loaded on first use.
pub fn gamedata() -> &'static GameData {
    &GAMEDATA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_data_is_complete() {
        let s = resource_string("gamedata.json").unwrap();
        let d: GameData = serde_json::from_str(&s).unwrap();
        assert_eq!(d.insights.legendary_insight, 77302);
        assert_eq!(d.insights.refined_envoy_armor.len(), 18);
        assert_eq!(d.insights.perfected_envoy_armor.len(), 18);
        assert!(d.is_profession("Guardian"));
        assert_ne!(d.profession_color("NECROMANCER"), 0);
        assert_eq!(d.rarity_color("Legendary"), 0x4C139D);
        assert_eq!(d.wallet.show[0].id, 1);
    }
}
