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

//! The config module manages per-guild configuration values.

use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use itertools::Itertools;
use once_cell::unsync::Lazy;
use serenity::model::channel::Message;
use serenity::prelude::Context;
use serenity::utils::MessageBuilder;

use crate::args::parse_app_matches;
use crate::db::cache::get_cached_connection;
use crate::db::DatabaseError;
use crate::dispatch::Dispatch;
use crate::error::BotError;
use crate::modules::commands::Command as Cmd;
use crate::modules::Module;

/// A validation function for config values. Should return true if the value would be valid input.
pub type ConfigValidatorFn = fn(&str) -> bool;

/// Alias for config validation failures.
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned when reading or validating a config key fails.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// There is no key with that name.
    #[error("No such configuration key: {0}")]
    NoSuchKey(String),
    /// The given input is not valid for that key.
    #[error("Config value is invalid: {0}")]
    InvalidValue(&'static str),
    /// There is no default value for the given value.
    #[error("There is no default value for that.")]
    NoDefault,
    /// The key has no value and no default.
    #[error("{0} is not set. Set it with the config command.")]
    NotSet(String),
    /// The database couldn't be read.
    #[error("{0}")]
    Database(#[from] DatabaseError),
}

impl From<Error> for super::commands::Error {
    fn from(e: Error) -> Self {
        super::commands::Error::RuntimeFailure(e.into())
    }
}

impl BotError for Error {
    fn is_user_error(&self) -> bool {
        !matches!(self, Error::Database(_))
    }
}

/// The validation registry for validating config options.
#[derive(Default)]
pub struct Validator {
    validators: HashMap<&'static str, Value>
}

impl Validator {
    /// Creates a new, empty validator.
    pub fn new() -> Self {
        Validator {
            validators: HashMap::new()
        }
    }

    /// Validates the config value
    pub fn validate(&self, config_name: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        let cval = self.validators.get(config_name.as_ref())
            .ok_or_else(|| Error::NoSuchKey(config_name.as_ref().to_string()))?;
        if cval.is_valid(value.as_ref()) {
            Ok(())
        } else {
            Err(Error::InvalidValue(cval.name))
        }
    }

    /// Checks to see if this is a valid config key.
    pub fn check_key(&self, key: impl AsRef<str>) -> Result<()> {
        if self.validators.contains_key(key.as_ref()) {
            Ok(())
        } else {
            Err(Error::NoSuchKey(key.as_ref().to_string()))
        }
    }

    /// Adds a new config value
    pub fn add_value(&mut self, v: Value) {
        self.validators.insert(v.name, v);
    }

    /// Retrieves the default value for the key
    pub fn default_for(&self, key: impl AsRef<str>) -> Result<&String> {
        self.validators.get(key.as_ref())
            .and_then(|v| v.default())
            .ok_or(Error::NoDefault)
    }

    /// Retrieves the help for the given key.
    pub fn help_for(&self, key: impl AsRef<str>) -> Result<&'static str> {
        self.validators.get(key.as_ref())
            .map(|v| v.help)
            .ok_or_else(|| Error::NoSuchKey(key.as_ref().to_string()))
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<&'static str> {
        self.validators.keys().copied().sorted().collect()
    }
}

/// Represents a validatable config value.
#[derive(Clone)]
pub struct Value {
    name: &'static str,
    help: &'static str,
    validator: ConfigValidatorFn,
    default: Option<String>,
}

impl Value {
    /// Creates a new Value.
    pub fn new(name: &'static str, help: &'static str, validator: ConfigValidatorFn, default: Option<impl Into<String>>) -> Self {
        Value { name, help, validator, default: default.map(|x| x.into()) }
    }

    /// Returns the name of the config key.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the help string for the config key.
    pub fn help(&self) -> &'static str {
        self.help
    }

    /// Returns whether or not the given value is a valid config value
    pub fn is_valid(&self, s: &str) -> bool {
        (self.validator)(s)
    }

    /// Returns an optional default setting for this config value.
    pub fn default(&self) -> Option<&String> {
        self.default.as_ref()
    }
}

/// Helper function to validate boolean config values.
pub fn valid_bool(s: &str) -> bool {
    valid_parseable::<bool>(s)
}

/// Helper function to validate any parseable ([FromStr]) config values.
pub fn valid_parseable<T: FromStr>(s: &str) -> bool {
    s.parse::<T>().is_ok()
}

/// Function for creating clap validators for parseable types
pub fn fallible_validator<T: FromStr<Err=E>, E: std::fmt::Display>(s: String) -> std::result::Result<(), String> {
    s.parse::<T>().map_err(|e| format!("{}", e)).map(|_| ())
}

/// The config command structure. Contains the parser for command arguments.
pub struct Command;

const ABOUT: &str = "View and change this server's configuration values.";

thread_local! {
static PARSER: Lazy<App<'static, 'static>> = Lazy::new (
    || {
        let key_arg = Arg::with_name("config-key")
            .required(true)
            .help("The name of the configuration value to change.")
            .takes_value(true)
            .value_name("CONFIG_KEY");
        App::new("config")
            .about(ABOUT)
            .subcommand(SubCommand::with_name("set")
                .arg(key_arg.clone())
                .arg(Arg::with_name("value")
                    .required(true)
                    .takes_value(true)
                    .help("The new value to set the config key to.")
                    .value_name("VALUE")
                )
                .about("Sets CONFIG_KEY to the given value.")
            )
            .subcommand(
                SubCommand::with_name("get")
                    .arg(key_arg.clone())
                    .about("Retrieves the value of CONFIG_KEY for this guild.")
            )
            .subcommand(
                SubCommand::with_name("help")
                    .arg(key_arg.clone())
                    .about("Displays help for the given config value.")
            )
            .subcommand(
                SubCommand::with_name("list")
                    .about("Lists every config key.")
            )
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .setting(AppSettings::DisableHelpSubcommand)
    }
);
}

impl Cmd for Command {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> crate::modules::commands::Result<()> {
        let m: ArgMatches = PARSER.with(|p|
            parse_app_matches("config", args, &p)
        )?;
        let guild = msg.guild_id.ok_or(super::hook::Error::Denied)?;

        let reply = match m.subcommand() {
            ("help", Some(subm)) => {
                let key = subm.value_of("config-key").unwrap_or_default();
                let help = disp.config_validator().help_for(key)?;
                format!("{}: {}", key, help)
            }
            ("get", Some(subm)) => {
                let key = subm.value_of("config-key").unwrap_or_default();
                let conn = get_cached_connection(guild)?;
                let rl = conn.borrow();
                let val = disp.get_config(&rl, key)?;

                format!("{} is set to {}", key, val)
            }
            ("set", Some(subm)) => {
                let key = subm.value_of("config-key").unwrap_or_default();
                let val = subm.value_of("value").unwrap_or_default();
                let conn = get_cached_connection(guild)?;
                let rl = conn.borrow();
                disp.set_config(&rl, key, val)?;

                format!("Set {} to {}", key, val)
            }
            ("list", _) => {
                disp.config_validator().keys().join("\n")
            }
            _ => return Err(crate::modules::commands::Error::Other)
        };

        msg.channel_id.say(ctx, MessageBuilder::new()
            .push_codeblock_safe(reply, None)
            .build()
        )?;
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        PARSER.with(|p| (*p).clone())
    }
}

/// Creates a config [Module].
pub fn config_module() -> Module {
    Module::with_name("config")
        .with_description(ABOUT)
        .with_category("Moderation")
        .with_command(Command)
        .with_sensitivity(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        let mut v = Validator::new();
        v.add_value(Value::new("raid_members", "Threshold.", valid_parseable::<u32>, Some("4")));
        v.add_value(Value::new("admin_role", "The admin role.", valid_parseable::<u64>, Option::<String>::None));
        v
    }

    #[test]
    fn validation() {
        let v = validator();
        assert!(v.validate("raid_members", "10").is_ok());
        assert!(matches!(v.validate("raid_members", "ten"), Err(Error::InvalidValue("raid_members"))));
        assert!(matches!(v.validate("nope", "1"), Err(Error::NoSuchKey(_))));
        assert_eq!(v.default_for("raid_members").unwrap(), "4");
        assert!(matches!(v.default_for("admin_role"), Err(Error::NoDefault)));
        assert_eq!(v.keys(), vec!["admin_role", "raid_members"]);
        assert_eq!(v.help_for("admin_role").unwrap(), "The admin role.");
    }

    #[test]
    fn clap_validators() {
        assert!(fallible_validator::<u16, _>("30".to_string()).is_ok());
        assert!(fallible_validator::<u16, _>("-1".to_string()).is_err());
        assert!(valid_bool("true"));
        assert!(!valid_bool("yes"));
    }
}
