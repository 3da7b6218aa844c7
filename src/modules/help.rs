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

//! Help built from module metadata: a command list by category, a category listing, or a
//! command's own usage text.

use std::borrow::Cow;
use std::collections::BTreeMap;

use clap::{App, Arg};
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::args::parse_app_matches;
use crate::db::cache::get_cached_connection;
use crate::dispatch::Dispatch;
use crate::modules::commands::{user_error, Command, Result};
use crate::modules::privilege::{is_guild_admin, may_run};
use crate::modules::Module;
use crate::util::{chunk_message, say_chunked, truncate_with_ellipsis, MESSAGE_CHUNK_SIZE};

const ABOUT: &str = "Shows what commands exist and how to use them.";
const MAX_DESCRIPTION: usize = 64;

/// What the person asking for help may run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer {
    pub owner: bool,
    pub admin: bool,
}

impl Viewer {
    fn can_see(self, m: &Module) -> bool {
        m.command_handler().is_some() && may_run(m, self.owner, self.admin)
    }
}

fn by_category<'a>(modules: impl IntoIterator<Item=&'a Module>, viewer: Viewer) -> BTreeMap<&'static str, Vec<&'a Module>> {
    let mut out: BTreeMap<&'static str, Vec<&'a Module>> = BTreeMap::new();
    for m in modules.into_iter().filter(|m| viewer.can_see(m)) {
        out.entry(m.category()).or_default().push(m);
    }
    for ms in out.values_mut() {
        ms.sort_by(|a, b| a.name().cmp(b.name()));
    }
    out
}

/// Every command the viewer may run, grouped by category.
pub fn command_list<'a>(modules: impl IntoIterator<Item=&'a Module>, prefix: char, viewer: Viewer) -> String {
    let mut out = format!("Use `{}help <command>` for details on a command.\n\n", prefix);
    for (category, ms) in by_category(modules, viewer) {
        out.push_str(&format!("**{}**\n", category));
        for m in ms {
            if m.description().is_empty() {
                out.push_str(&format!("\t\t**{}{}**\n", prefix, m.name()));
            } else {
                out.push_str(&format!("\t\t**{}{}**: {}\n",
                                      prefix, m.name(), truncate_with_ellipsis(m.description(), MAX_DESCRIPTION)));
            }
        }
    }
    out
}

/// The commands in one category, matched case-insensitively, or `None` if no loaded module
/// has that category.
pub fn category_listing<'a>(modules: impl IntoIterator<Item=&'a Module> + Clone, category: &str, viewer: Viewer) -> Option<String> {
    let name = modules.clone().into_iter()
        .map(Module::category)
        .find(|c| c.eq_ignore_ascii_case(category))?;

    let mut out = format!("**{}**:\n\n**Commands**:\n", name);
    let listed = by_category(modules, viewer).remove(name).unwrap_or_default();
    for m in listed {
        out.push_str(&format!("\t{}: {}\n", m.name(), m.description()));
    }
    Some(out)
}

/// The help command.
pub struct Help;

impl Help {
    fn viewer(disp: &Dispatch, ctx: &Context, msg: &Message) -> Result<Viewer> {
        let owner = msg.author.id == disp.owner();
        let admin = match msg.guild_id {
            Some(g) => is_guild_admin(ctx, g, msg.author.id)?,
            None => false
        };
        Ok(Viewer { owner, admin })
    }

    fn send_list(disp: &Dispatch, ctx: &Context, msg: &Message) -> Result<()> {
        let prefix = match msg.guild_id {
            Some(g) => get_cached_connection(g)?.borrow().command_prefix()?,
            None => crate::db::guild_conn::DEFAULT_COMMAND_PREFIX
        };
        let viewer = Self::viewer(disp, ctx, msg)?;
        let text = command_list(disp.modules().values(), prefix, viewer);

        let mut notice = match msg.guild_id {
            Some(_) => Some(msg.channel_id.say(ctx, "I am sending you help in dms!")?),
            None => None
        };

        let dm = msg.author.id.create_dm_channel(ctx)?;
        for chunk in chunk_message(&text, MESSAGE_CHUNK_SIZE) {
            dm.say(ctx, chunk)?;
        }

        if let Some(n) = notice.as_mut() {
            n.edit(ctx, |m| m.content("I've sent you help in dms!"))?;
        }
        Ok(())
    }
}

impl Command for Help {
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()> {
        trace!("Help wanted from user {:?}", msg.author.id);
        let m = parse_app_matches("help", args, &self.parser())?;
        let words: Vec<&str> = m.values_of("topic").map(|v| v.collect()).unwrap_or_default();

        let first = match words.first() {
            Some(w) => w.to_lowercase(),
            None => return Self::send_list(disp, ctx, msg)
        };

        if let Some(cmd) = disp.resolve_command(&first) {
            let text = match words.get(1) {
                None => cmd.help(),
                Some(_) if !cmd.has_subcommands() => return user_error("That command has no subcommands."),
                Some(sub) => match cmd.subcommand_help(sub) {
                    Some(h) => h,
                    None => return user_error("That is not a valid subcommand.")
                }
            };
            say_chunked(ctx, msg.channel_id, &text, true)?;
            return Ok(());
        }

        let viewer = Self::viewer(disp, ctx, msg)?;
        match category_listing(disp.modules().values(), &words.join(" "), viewer) {
            Some(listing) => say_chunked(ctx, msg.channel_id, &listing, false)?,
            None => return user_error("That's not a valid command nor a category.")
        }
        Ok(())
    }

    fn parser(&self) -> App<'static, 'static> {
        App::new("help")
            .about(ABOUT)
            .arg(Arg::with_name("topic")
                .multiple(true)
                .value_name("COMMAND_OR_CATEGORY")
                .help("A command, optionally followed by a subcommand, or a category."))
    }
}

/// Creates the help [Module].
pub fn help_module() -> Module {
    Module::with_name("help")
        .with_description(ABOUT)
        .with_command(Help)
        .with_sensitivity(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::config::config_module;
    use crate::modules::prune::prune_module;

    fn modules() -> Vec<Module> {
        vec![
            help_module(),
            config_module(),
            prune_module(),
            Module::with_name("secret")
                .with_command(Help)
                .with_owner_only(true)
                .with_category("Owner")
                .with_description(Box::leak("x".repeat(100).into_boxed_str())),
        ]
    }

    #[test]
    fn list_filters_by_privilege() {
        let ms = modules();
        let everyone = command_list(&ms, '$', Viewer::default());
        assert!(everyone.contains("**$help**: Shows what commands exist"));
        assert!(!everyone.contains("$config"));
        assert!(!everyone.contains("$secret"));

        let admin = command_list(&ms, '!', Viewer { owner: false, admin: true });
        assert!(admin.contains("**Moderation**"));
        assert!(admin.contains("**!prune**"));
        assert!(!admin.contains("!secret"));

        let owner = command_list(&ms, '!', Viewer { owner: true, admin: false });
        let line = owner.lines().find(|l| l.contains("!secret")).unwrap();
        assert!(line.ends_with("..."));
        assert_eq!(line.trim_start().len(), "**!secret**: ".len() + 64);
        assert!(owner.contains("**!prune**"));
        assert!(owner.contains("**!config**"));
    }

    #[test]
    fn categories() {
        let ms = modules();
        let listing = category_listing(&ms, "moderation", Viewer { owner: false, admin: true }).unwrap();
        assert!(listing.starts_with("**Moderation**:\n\n**Commands**:\n"));
        assert!(listing.contains("\tconfig: "));
        assert!(listing.contains("\tprune: "));
        assert!(category_listing(&ms, "nonsense", Viewer::default()).is_none());
    }
}
