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

//! Account overview and the Legendary Insight count.

use std::borrow::Cow;

use clap::App;
use serenity::model::channel::Message;
use serenity::model::misc::Mentionable;
use serenity::prelude::Context;

use crate::dispatch::Dispatch;
use crate::gw2::client;
use crate::gw2::gamedata::gamedata;
use crate::gw2::inventory::{Holdings, InsightTally};
use crate::gw2::model::{Account, PvpStats, World};
use crate::modules::commands::{Command, Result};
use crate::modules::Module;
use crate::util::date_part;

use super::{fetch_key, user_colour, CATEGORY};

const ACCOUNT_ABOUT: &str = "Shows information about your Guild Wars 2 account.";
const LI_ABOUT: &str = "Counts the Legendary Insights you have earned.";

const LI_COLOUR: u32 = 0x4C139D;
const LI_ICON: &str = "https://render.guildwars2.com/file/6D33B7387BAF2E2CC9B5D37D1D1B01246AB6FA22/1302744.png";

pub struct AccountInfo;

impl Command for AccountInfo {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        crate::args::parse_app_matches("account", args, &self.parser())?;
        let key = fetch_key(msg, &["account"])?;
        let account: Account = client().get_authed("account", &key.key)?;
        let world: World = client().get(&format!("worlds?id={}", account.world))?;
        let pvp_rank = if key.has_scope("pvp") {
            let stats: PvpStats = client().get_authed("pvp/stats", &key.key)?;
            Some(stats.rank())
        } else {
            None
        };

        let colour = user_colour(ctx, msg);
        msg.channel_id.send_message(ctx, |m| m.embed(|e| {
            e.author(|a| a.name(&account.name))
                .colour(colour)
                .field("World", &world.name, true)
                .field("Created account on", date_part(&account.created), true)
                .field("Has commander tag", if account.commander { "Yes" } else { "No" }, false);
            if let Some(f) = account.fractal_level {
                e.field("Fractal level", f, true);
            }
            if let Some(r) = account.wvw_rank {
                e.field("WvW rank", r, true);
            }
            if let Some(r) = pvp_rank {
                e.field("PVP rank", r, true);
            }
            e
        }))?;
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("account").about(ACCOUNT_ABOUT)
    }
}

/// Embed fields for the non-zero parts of a tally, as `(name, value)`.
pub fn insight_fields(t: &InsightTally) -> Vec<(String, String)> {
    let parts = [
        (t.perfected_armor, "Perfected Envoy Armor Pieces", t.li_perfected_armor()),
        (t.refined_armor, "Refined Envoy Armor Pieces", t.li_refined_armor()),
        (t.prowess, "Gifts of Prowess", t.li_prowess()),
        (t.insignia, "Envoy Insignia", t.li_insignia()),
    ];
    parts.iter()
        .filter(|(n, _, _)| *n > 0)
        .map(|(n, what, li)| (format!("{} {}", n, what), format!("Representing {} Legendary Insights", li)))
        .collect()
}

pub struct Insights;

impl Command for Insights {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        crate::args::parse_app_matches("li", args, &self.parser())?;
        let key = fetch_key(msg, &["account", "inventories", "characters"])?;
        let mut status = msg.channel_id.say(ctx, "Getting legendary insights, this might take a while...")?;

        let holdings = Holdings::fetch(client(), &key.key)?;
        let tally = InsightTally::count(&holdings, &gamedata().insights);
        debug!("Insight tally for {}: {:?}", key.account_name, tally);

        let fields = insight_fields(&tally);
        let (name, avatar) = (msg.author.name.clone(), msg.author.face());
        status.edit(ctx, |m| m
            .content(format!("{}, here are your Legendary Insights", msg.author.mention()))
            .embed(|e| e
                .title(format!("{} Legendary Insights Earned", tally.total()))
                .description(format!("{} on hand, {} used in crafting", tally.insights, tally.crafted()))
                .colour(LI_COLOUR)
                .thumbnail(LI_ICON)
                .author(|a| a.name(&name).icon_url(&avatar))
                .fields(fields.into_iter().map(|(n, v)| (n, v, false)))))?;
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("li").about(LI_ABOUT)
    }
}

pub fn account_module() -> Module {
    Module::with_name("account")
        .with_description(ACCOUNT_ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(AccountInfo)
}

pub fn li_module() -> Module {
    Module::with_name("li")
        .with_description(LI_ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Insights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_categories_are_skipped() {
        let t = InsightTally { insights: 10, prowess: 2, perfected_armor: 8, ..InsightTally::default() };
        let fields = insight_fields(&t);
        assert_eq!(fields, vec![
            ("8 Perfected Envoy Armor Pieces".to_string(), "Representing 250 Legendary Insights".to_string()),
            ("2 Gifts of Prowess".to_string(), "Representing 50 Legendary Insights".to_string()),
        ]);
        assert!(insight_fields(&InsightTally::default()).is_empty());
    }
}
