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

//! Prunes members who haven't been seen in a while, after asking for confirmation.

use std::borrow::Cow;
use std::time::Duration;

use clap::{App, Arg};
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::args::{parse_app_matches, parse_value};
use crate::dispatch::Dispatch;
use crate::error::SerenityError;
use crate::modules::commands::{user_error, Command, Result};
use crate::modules::hook;
use crate::modules::Module;

const ABOUT: &str = "Kicks members who haven't been online for a number of days.";

/// Inactivity used when none is given.
pub const DEFAULT_PRUNE_DAYS: u16 = 14;
/// The longest inactivity Discord accepts.
pub const MAX_PRUNE_DAYS: u16 = 30;
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(45);
const DECLINED: &str = "Ok, No pruning then.";

fn check_days(days: u16) -> Result<u16> {
    if (1..=MAX_PRUNE_DAYS).contains(&days) {
        Ok(days)
    } else {
        user_error(format!("Days must be between 1 and {}.", MAX_PRUNE_DAYS))
    }
}

fn confirms(reply: &str) -> bool {
    reply.trim().eq_ignore_ascii_case("yes")
}

/// The prune command.
pub struct Prune;

impl Command for Prune {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("prune", args, &self.parser())?;
        let days = check_days(parse_value::<u16>(&m, "days")?.unwrap_or(DEFAULT_PRUNE_DAYS))?;
        let guild = msg.guild_id.ok_or(hook::Error::Denied)?;

        let estimate = guild.prune_count(ctx, days)?;
        msg.channel_id.say(ctx, format!(
            "You are about to prune {} members. Reply `Yes` within 45 seconds to proceed.",
            estimate.pruned
        ))?;

        disp.pending().expect_reply(
            ctx.http.clone(),
            msg.channel_id,
            msg.author.id,
            CONFIRM_TIMEOUT,
            DECLINED,
            Box::new(move |_disp: &Dispatch, ctx: &Context, reply: &Message| {
                if confirms(&reply.content) {
                    info!("{} is pruning {} after {} days of inactivity.", reply.author.tag(), guild, days);
                    guild.start_prune(ctx, days).map_err(SerenityError::from)?;
                    reply.channel_id.say(ctx, "Prune running.").map_err(SerenityError::from)?;
                } else {
                    reply.channel_id.say(ctx, DECLINED).map_err(SerenityError::from)?;
                }
                Ok(())
            }),
        );
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("prune")
            .about(ABOUT)
            .arg(Arg::with_name("days")
                .value_name("DAYS")
                .help("Members inactive for at least this many days are removed. Between 1 and 30, 14 by default."))
    }
}

/// Creates the prune [Module].
pub fn prune_module() -> Module {
    Module::with_name("prune")
        .with_description(ABOUT)
        .with_category("Moderation")
        .with_command(Prune)
        .with_sensitivity(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_range() {
        assert_eq!(check_days(1).unwrap(), 1);
        assert_eq!(check_days(30).unwrap(), 30);
        assert!(check_days(0).is_err());
        assert_eq!(check_days(31).unwrap_err().to_string(), "Days must be between 1 and 30.");
    }

    #[test]
    fn confirmation() {
        assert!(confirms("Yes"));
        assert!(confirms(" yEs \n"));
        assert!(!confirms("yes please"));
        assert!(!confirms("no"));
    }
}
