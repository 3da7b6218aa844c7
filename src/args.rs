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

//! Argument parsing for chat commands. Each command owns a clap [App]; the raw argument string is
//! split shell-style and fed to it.

use std::str::FromStr;

use clap::{App, ArgMatches};
use serenity::model::id::ChannelId;

use crate::error::BotError;

/// Errors related to parsing command arguments.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// There was a non-help error involving a [clap::Error].
    #[error("{0}")]
    Clap(clap::Error),
    /// The argument string couldn't be split, usually because of an unclosed quote.
    #[error("An error occurred while parsing the arguments string: {0}")]
    Splitter(#[from] shell_words::ParseError),
    /// The help message ended up being displayed.
    #[error("{0}")]
    DisplayHelp(String),
    /// A value was present but couldn't be interpreted.
    #[error("Invalid value for {name}: {value}")]
    BadValue {
        /// The argument name.
        name: &'static str,
        /// What the user typed.
        value: String,
    },
}

impl BotError for ParseError {
    fn is_user_error(&self) -> bool {
        true
    }
}

impl From<clap::Error> for ParseError {
    fn from(e: clap::Error) -> Self {
        match e.kind {
            clap::ErrorKind::HelpDisplayed | clap::ErrorKind::VersionDisplayed => ParseError::DisplayHelp(e.message),
            _ => ParseError::Clap(e)
        }
    }
}

impl From<ParseError> for crate::modules::commands::Error {
    fn from(e: ParseError) -> Self {
        crate::modules::commands::Error::RuntimeFailure(e.into())
    }
}

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, ParseError>;

/// Splits `s` and matches it against a clone of `a`, using `name` as the program name.
pub fn parse_app_matches<'a, 'b>(name: impl AsRef<str>, s: impl AsRef<str>, a: &App<'a, 'b>) -> Result<ArgMatches<'a>> {
    let parts = shell_words::split(s.as_ref())?;
    let app = a.clone();
    let matches = app.get_matches_from_safe(
        std::iter::once(name.as_ref())
            .chain(parts.iter().map(|s| s.as_str())))?;
    Ok(matches)
}

/// Like [parse_app_matches], but splits only on whitespace. Used by commands that take free text
/// such as item names or reasons, where apostrophes are common.
pub fn parse_plain_matches<'a, 'b>(name: impl AsRef<str>, s: impl AsRef<str>, a: &App<'a, 'b>) -> Result<ArgMatches<'a>> {
    let app = a.clone();
    let matches = app.get_matches_from_safe(
        std::iter::once(name.as_ref())
            .chain(s.as_ref().split_whitespace()))?;
    Ok(matches)
}

/// Reads a channel given as a mention (`<#123>`) or a bare ID.
pub fn channel_arg(s: &str) -> Option<ChannelId> {
    serenity::utils::parse_channel(s)
        .or_else(|| s.parse::<u64>().ok())
        .map(ChannelId)
}

/// Pulls a value out of matches and parses it.
pub fn parse_value<T: FromStr>(m: &ArgMatches, name: &'static str) -> Result<Option<T>> {
    match m.value_of(name) {
        None => Ok(None),
        Some(v) => v.parse::<T>()
            .map(Some)
            .map_err(|_| ParseError::BadValue { name, value: v.to_string() })
    }
}

/// Joins every value of a multi-valued argument with spaces, e.g. for item names.
pub fn joined_values(m: &ArgMatches, name: &str) -> String {
    m.values_of(name)
        .map(|v| v.collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, SubCommand, AppSettings};

    fn app() -> App<'static, 'static> {
        App::new("test")
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .subcommand(SubCommand::with_name("price")
                .arg(Arg::with_name("item").multiple(true).required(true)))
            .subcommand(SubCommand::with_name("gems")
                .arg(Arg::with_name("count").default_value("400")))
    }

    #[test]
    fn splits_and_joins() {
        let m = parse_app_matches("test", "price Mystic \"Coin of\" doom", &app()).unwrap();
        let (_, sub) = m.subcommand();
        assert_eq!(joined_values(sub.unwrap(), "item"), "Mystic Coin of doom");
    }

    #[test]
    fn typed_values() {
        let m = parse_app_matches("test", "gems", &app()).unwrap();
        let sub = m.subcommand_matches("gems").unwrap();
        assert_eq!(parse_value::<u64>(sub, "count").unwrap(), Some(400));

        let m = parse_app_matches("test", "gems lots", &app()).unwrap();
        let sub = m.subcommand_matches("gems").unwrap();
        assert!(parse_value::<u64>(sub, "count").is_err());
    }

    #[test]
    fn free_text() {
        let m = parse_plain_matches("test", "price Zojja's  Claymore", &app()).unwrap();
        let sub = m.subcommand_matches("price").unwrap();
        assert_eq!(joined_values(sub, "item"), "Zojja's Claymore");
    }

    #[test]
    fn channels() {
        assert_eq!(channel_arg("<#1234>"), Some(ChannelId(1234)));
        assert_eq!(channel_arg("1234"), Some(ChannelId(1234)));
        assert_eq!(channel_arg("general"), None);
    }

    #[test]
    fn help_is_reported() {
        let e = parse_app_matches("test", "", &app()).unwrap_err();
        assert!(matches!(e, ParseError::DisplayHelp(_) | ParseError::Clap(_)));
        let e = parse_app_matches("test", "\"unclosed", &app()).unwrap_err();
        assert!(matches!(e, ParseError::Splitter(_)));
    }
}
