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

//! Contains generic hooks that should be run before every command.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serenity::model::prelude::Message;
use serenity::prelude::Context;

use crate::db::guild_conn::COMMAND_PREFIX_KEY;
use crate::dispatch::Dispatch;
use crate::modules::{config, hook, Module};

/// Max length for messages to be passed to commands.
pub const MAX_COMMAND_INVOCATION_LENGTH: usize = 1500;

/// Prohibits commands of more than [MAX_COMMAND_INVOCATION_LENGTH] bytes from being processed.
pub fn length_hook<'a, 'b, 'c, 'd>(_disp: &'a Dispatch, _ctx: &'b Context, msg: &'c Message, name: Cow<'d, str>) -> hook::Result<Cow<'d, str>> {
    check_length(&msg.content)?;
    Ok(name)
}

fn check_length(content: &str) -> hook::Result<()> {
    if content.len() > MAX_COMMAND_INVOCATION_LENGTH {
        let message = format!("Argument string was too long ({} bytes). Must be less than {} bytes (not characters).",
                              content.len(),
                              MAX_COMMAND_INVOCATION_LENGTH);
        Err(hook::Error::DeniedWithReason(Cow::from(message)))
    } else {
        Ok(())
    }
}

/// Settings live per guild, so commands are rejected outside of one.
pub fn reject_dm_command_hook<'a, 'b, 'c, 'd>(_disp: &'a Dispatch, _ctx: &'b Context, msg: &'c Message, name: Cow<'d, str>) -> hook::Result<Cow<'d, str>> {
    if msg.guild_id.is_none() {
        Err(hook::Error::DeniedWithReason(Cow::from("Commands must be run from inside a guild.")))
    } else {
        Ok(name)
    }
}

fn validate_command_prefix(s: &str) -> bool {
    static COMMAND_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{Math Symbol}\p{Currency Symbol}\p{Punctuation}]$").unwrap());
    COMMAND_PREFIX_RE.is_match(s)
}

/// Returns a module with hook functionality not related to any particular command module.
pub fn base_hooks() -> Module {
    Module::with_name("base_hooks")
        .with_command_hook(reject_dm_command_hook)
        .with_command_hook(length_hook)
        .with_config_value(config::Value::new(COMMAND_PREFIX_KEY,
                                              "The single character before a command.",
                                              validate_command_prefix,
                                              Some("!")))
        .clear_dependencies()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        assert!(validate_command_prefix("!"));
        assert!(validate_command_prefix("$"));
        assert!(validate_command_prefix("+"));
        assert!(!validate_command_prefix("a"));
        assert!(!validate_command_prefix("!!"));
    }

    #[test]
    fn lengths() {
        assert!(check_length(&"a".repeat(MAX_COMMAND_INVOCATION_LENGTH)).is_ok());
        let e = check_length(&"a".repeat(MAX_COMMAND_INVOCATION_LENGTH + 1)).unwrap_err();
        assert_eq!(e.to_string(), "Argument string was too long (1501 bytes). Must be less than 1500 bytes (not characters).");
    }
}
