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

//! Converting between copper amounts and the `12g 34s 56c` notation players use.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::error::BotError;

#[derive(Parser)]
#[grammar = "../resources/coins.pest"]
struct CoinParser;

/// Copper in a silver.
pub const SILVER: u64 = 100;
/// Copper in a gold.
pub const GOLD: u64 = 100 * SILVER;

/// A coin amount the user typed that couldn't be understood.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CoinError {
    /// The text wasn't a coin amount at all.
    #[error("{0:?} isn't an amount of coins. Try something like `12g 34s 56c`.")]
    Malformed(String),
    /// The amount doesn't fit.
    #[error("That's more money than exists in Tyria.")]
    TooLarge,
}

impl BotError for CoinError {
    fn is_user_error(&self) -> bool {
        true
    }
}

impl From<CoinError> for crate::modules::commands::Error {
    fn from(e: CoinError) -> Self {
        crate::modules::commands::Error::RuntimeFailure(e.into())
    }
}

/// Formats copper as `{g}g {s}s {c}c`, leaving out zero parts.
pub fn gold_to_coins(copper: u64) -> String {
    let (g, rest) = (copper / GOLD, copper % GOLD);
    let (s, c) = (rest / SILVER, rest % SILVER);
    let parts: Vec<String> = [(g, 'g'), (s, 's'), (c, 'c')].iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect();
    if parts.is_empty() {
        "0c".to_string()
    } else {
        parts.join(" ")
    }
}

fn number(p: Pair<Rule>) -> Result<u64, CoinError> {
    let digits: String = p.as_str().chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().map_err(|_| CoinError::TooLarge)
}

/// Parses a coin amount into copper. Accepts `,` and spaces as thousands separators, and
/// `g`, `s`, `c` suffixes; a bare number is copper.
pub fn coins_to_gold(s: &str) -> Result<u64, CoinError> {
    let malformed = || CoinError::Malformed(s.to_string());
    if s.trim().is_empty() {
        return Err(malformed());
    }

    let coins = CoinParser::parse(Rule::coins, s)
        .map_err(|_| malformed())?
        .next()
        .ok_or_else(malformed)?;

    let mut total: u64 = 0;
    for part in coins.into_inner() {
        match part.as_rule() {
            Rule::plain => {
                let n = part.into_inner().next().ok_or_else(malformed)?;
                total = number(n)?;
            }
            Rule::denominated => {
                for d in part.into_inner() {
                    let unit = match d.as_rule() {
                        Rule::gold => GOLD,
                        Rule::silver => SILVER,
                        _ => 1
                    };
                    let n = d.into_inner().next().ok_or_else(malformed)?;
                    total = number(n)?
                        .checked_mul(unit)
                        .and_then(|v| v.checked_add(total))
                        .ok_or(CoinError::TooLarge)?;
                }
            }
            _ => {}
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting() {
        assert_eq!(gold_to_coins(10003), "1g 3c");
        assert_eq!(gold_to_coins(12345678), "1234g 56s 78c");
        assert_eq!(gold_to_coins(500), "5s");
        assert_eq!(gold_to_coins(0), "0c");
    }

    #[test]
    fn parsing() {
        assert_eq!(coins_to_gold("1,234g 56s 78c"), Ok(12345678));
        assert_eq!(coins_to_gold("1 234 567"), Ok(1234567));
        assert_eq!(coins_to_gold("1g 3c"), Ok(10003));
        assert_eq!(coins_to_gold("250G"), Ok(2500000));
        assert_eq!(coins_to_gold("75"), Ok(75));
        assert_eq!(coins_to_gold("12s"), Ok(1200));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(coins_to_gold(""), Err(CoinError::Malformed(_))));
        assert!(matches!(coins_to_gold("lots"), Err(CoinError::Malformed(_))));
        assert!(matches!(coins_to_gold("3c 1g"), Err(CoinError::Malformed(_))));
        assert_eq!(coins_to_gold("99999999999999999999999g"), Err(CoinError::TooLarge));
    }
}
