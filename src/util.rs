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

//! Assorted helpers shared across modules.

use std::borrow::Cow;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use clap::App;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use serenity::utils::MessageBuilder;

/// The largest chunk of text sent in a single message by the chunking helpers.
pub const MESSAGE_CHUNK_SIZE: usize = 1750;

/// Extension trait for results whose errors should just be logged.
pub trait LogErrorExt {
    /// Logs the error, if any, at the error level.
    fn log_error(&self);
}

impl<T, E: Display> LogErrorExt for Result<T, E> {
    fn log_error(&self) {
        if let Err(e) = self {
            error!("{}", e);
        }
    }
}

/// Converts embedded file contents into a string, replacing any invalid UTF-8.
pub fn string_from_cow(s: Cow<'static, [u8]>) -> String {
    String::from_utf8_lossy(&s).into_owned()
}

/// Renders the help text of a clap app.
pub fn help_str(app: &App) -> String {
    let mut buf = Vec::new();
    match app.write_help(&mut buf) {
        Ok(_) => String::from_utf8_lossy(&buf).into_owned(),
        Err(e) => e.message
    }
}

/// Renders the help text of one subcommand of a clap app, or `None` if the app has no such
/// subcommand.
pub fn subcommand_help(app: &App, name: &str, sub: &str) -> Option<String> {
    match app.clone().get_matches_from_safe(vec![name, sub, "--help"]) {
        Err(clap::Error { kind: clap::ErrorKind::HelpDisplayed, message, .. }) => Some(message),
        _ => None
    }
}

/// Whether a clap app lists any subcommands in its help.
pub fn has_subcommands(app: &App) -> bool {
    help_str(app).contains("SUBCOMMANDS:")
}

/// Splits text into chunks of at most `max` bytes, preferring to break on line boundaries.
pub fn chunk_message(s: &str, max: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for line in s.split_inclusive('\n') {
        if current.len() + line.len() > max && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }

        if line.len() > max {
            // A single enormous line gets hard-split on char boundaries.
            let mut rest = line;
            while rest.len() > max {
                let mut cut = max;
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                out.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            current.push_str(rest);
        } else {
            current.push_str(line);
        }
    }

    if !current.trim().is_empty() {
        out.push(current);
    }
    out
}

/// Sends long text as several messages, optionally wrapping each one in a code block.
pub fn say_chunked(http: impl AsRef<Http>, channel: ChannelId, text: &str, code: bool) -> serenity::Result<()> {
    for chunk in chunk_message(text, MESSAGE_CHUNK_SIZE) {
        let content = if code {
            MessageBuilder::new().push_codeblock_safe(chunk, None).build()
        } else {
            chunk
        };
        channel.say(&http, content)?;
    }
    Ok(())
}

/// Truncates a string to `max` characters, marking the cut with `...`.
pub fn truncate_with_ellipsis(s: &str, max: usize) -> Cow<str> {
    if s.chars().count() <= max {
        Cow::Borrowed(s)
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        Cow::Owned(format!("{}...", kept))
    }
}

/// Uppercases the first character.
pub fn capitalized(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        Some(f) => f.to_uppercase().chain(c).collect(),
        None => String::new()
    }
}

/// Turns an API identifier like `super_adventure_box` into `Super Adventure Box`.
pub fn title_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| capitalized(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `n` with its English ordinal suffix, e.g. `2nd` or `13th`.
pub fn ordinal(n: u64) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th"
    };
    format!("{}{}", n, suffix)
}

/// Formats a duration in seconds as "{d} days, {h} hours, {m} minutes, and {s} seconds",
/// leaving out the days when there are none.
pub fn format_age(seconds: u64) -> String {
    let (minutes, s) = (seconds / 60, seconds % 60);
    let (hours, m) = (minutes / 60, minutes % 60);
    let (d, h) = (hours / 24, hours % 24);
    if d > 0 {
        format!("{} days, {} hours, {} minutes, and {} seconds", d, h, m, s)
    } else {
        format!("{} hours, {} minutes, and {} seconds", h, m, s)
    }
}

/// Parses an RFC 3339 timestamp as returned by the game API.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Returns the date part of an RFC 3339 timestamp.
pub fn date_part(s: &str) -> &str {
    s.split('T').next().unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_limit() {
        let line = "a".repeat(40);
        let text = std::iter::repeat(line.as_str()).take(100).collect::<Vec<_>>().join("\n");
        let chunks = chunk_message(&text, 1750);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= 1750));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunks_split_long_lines() {
        let text = "é".repeat(1000);
        let chunks = chunk_message(&text, 101);
        assert!(chunks.iter().all(|c| c.len() <= 101));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_with_ellipsis("short", 64), "short");
        let long = "x".repeat(100);
        let t = truncate_with_ellipsis(&long, 64);
        assert_eq!(t.chars().count(), 64);
        assert!(t.ends_with("..."));
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(112), "112th");
    }

    #[test]
    fn casing() {
        assert_eq!(capitalized("fractals"), "Fractals");
        assert_eq!(capitalized(""), "");
        assert_eq!(title_case("moto_breath"), "Moto Breath");
        assert_eq!(title_case("SHATTERED_observatory"), "Shattered Observatory");
    }

    #[test]
    fn ages() {
        assert_eq!(format_age(59), "0 hours, 0 minutes, and 59 seconds");
        assert_eq!(format_age(90061), "1 days, 1 hours, 1 minutes, and 1 seconds");
    }

    #[test]
    fn dates() {
        assert_eq!(date_part("2015-08-27T16:47:00Z"), "2015-08-27");
        assert!(parse_timestamp("2015-08-27T16:47:00Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
