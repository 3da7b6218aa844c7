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

//! Contains constants describing some meta info about this binary.

/// The name of the binary, used by the CLI.
pub const BIN_NAME: &str = "tyriabot";
/// Comma separated list of the authors.
pub const AUTHOR_NAME: &str = env!("CARGO_PKG_AUTHORS");
/// Short string with the license of the project.
pub const LICENSE: &str = env!("CARGO_PKG_LICENSE");
/// Short version of the copyright header.
pub const LICENSE_HEADER: &str = r#"Tyriabot - A Guild Wars 2 and moderation bot for Discord.
Copyright (C) 2020 Nick Samson

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version."#;
/// The version from the Cargo.toml used to compile this version of tyriabot.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
