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

//! Quaggans.

use std::borrow::Cow;

use clap::{App, Arg};
use rand::seq::SliceRandom;
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::args::parse_app_matches;
use crate::dispatch::Dispatch;
use crate::gw2::client;
use crate::modules::commands::{Command, Result};
use crate::modules::Module;

use super::{user_colour, CATEGORY};

const ABOUT: &str = "Posts a quaggan. Coo!";
const IMAGE_BASE: &str = "https://static.staticwars.com/quaggans/";

pub fn quaggan_url(name: &str) -> String {
    format!("{}{}.jpg", IMAGE_BASE, name)
}

#[derive(Debug, PartialEq, Eq)]
pub enum Request<'a> {
    List,
    Show(&'a str),
    Unknown,
}

/// Works out what was asked for. `random` picks with `rng`.
pub fn request<'a, R: rand::Rng>(arg: Option<&str>, names: &'a [String], rng: &mut R) -> Request<'a> {
    match arg.map(str::to_lowercase).as_deref() {
        Some("list") => Request::List,
        None | Some("random") => names.choose(rng).map_or(Request::Unknown, |n| Request::Show(n)),
        Some(wanted) => names.iter()
            .find(|n| n.as_str() == wanted)
            .map_or(Request::Unknown, |n| Request::Show(n))
    }
}

pub struct Quaggan;

impl Quaggan {
    fn list(&self, ctx: &Context, msg: &Message, names: &[String], preface: &str) -> Result<()> {
        let colour = user_colour(ctx, msg);
        msg.channel_id.send_message(ctx, |m| {
            if !preface.is_empty() {
                m.content(preface);
            }
            m.embed(|e| e
                .title("Available quaggans")
                .colour(colour)
                .description(names.join(", ")))
        })?;
        Ok(())
    }
}

impl Command for Quaggan {
    fn invoke(&self, _disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        let m = parse_app_matches("quaggan", args, &self.parser())?;
        let names: Vec<String> = client().get("quaggans")?;
        match request(m.value_of("quaggan"), &names, &mut rand::thread_rng()) {
            Request::List => self.list(ctx, msg, &names, ""),
            Request::Unknown => self.list(ctx, msg, &names,
                                          "I couldn't find the requested quaggan. List of all available quaggans:"),
            Request::Show(name) => {
                let colour = user_colour(ctx, msg);
                msg.channel_id.send_message(ctx, |m| m.embed(|e| e
                    .colour(colour)
                    .image(quaggan_url(name))))?;
                Ok(())
            }
        }
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("quaggan")
            .about(ABOUT)
            .arg(Arg::with_name("quaggan")
                .help("A quaggan's name, `list` to see them all, or `random`."))
    }
}

pub fn quaggan_module() -> Module {
    Module::with_name("quaggan")
        .with_description(ABOUT)
        .with_category(CATEGORY)
        .with_sensitivity(false)
        .with_command(Quaggan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests() {
        let names: Vec<String> = vec!["404".to_string(), "bear".to_string(), "party".to_string()];
        let mut rng = rand::thread_rng();
        assert_eq!(request(Some("list"), &names, &mut rng), Request::List);
        assert_eq!(request(Some("Bear"), &names, &mut rng), Request::Show("bear"));
        assert_eq!(request(Some("shark"), &names, &mut rng), Request::Unknown);
        assert!(matches!(request(None, &names, &mut rng), Request::Show(_)));
        assert_eq!(request(None, &[], &mut rng), Request::Unknown);
        assert_eq!(quaggan_url("bear"), "https://static.staticwars.com/quaggans/bear.jpg");
    }
}
