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

//! Tyriabot is a Discord bot with Guild Wars 2 API lookups and a few moderation tools.

#![deny(unused_must_use)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate rusqlite;

pub mod about;
pub mod args;
pub mod data;
pub mod db;
pub mod dev;
pub mod dispatch;
pub mod error;
pub mod gw2;
pub mod logging;
pub mod modules;
pub mod pollers;
pub mod util;
