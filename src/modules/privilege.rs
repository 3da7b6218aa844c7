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

//! Keeps users from running commands they aren't allowed to.
//!
//! Sensitive modules need the guild's admin role, the Manage Server permission, or guild
//! ownership. Owner-only modules need the bot owner, who also passes every other check.

use std::borrow::Cow;

use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::model::prelude::Message;
use serenity::prelude::Context;

use crate::db::cache::get_cached_connection;
use crate::dispatch::Dispatch;
use crate::error::{BotResult, SerenityError};
use crate::modules::commands;
use crate::modules::hook::Error::{DeniedWithReason, NeedRole};
use crate::modules::{config, hook, Module};

/// Config key for the role allowed to run sensitive commands.
pub const ADMIN_KEY: &str = "admin_role";

/// Reads the guild's admin role, if one is configured.
pub fn admin_role(guild: GuildId) -> BotResult<Option<RoleId>> {
    let conn = get_cached_connection(guild)?;
    let rconn = conn.borrow();
    Ok(rconn.get_value(ADMIN_KEY)?
        .and_then(|v| v.parse::<RoleId>().ok()))
}

/// Whether `user` counts as a guild admin: the owner, a holder of Manage Server, or a member
/// of the admin role.
pub fn is_guild_admin(ctx: &Context, guild: GuildId, user: UserId) -> BotResult<bool> {
    if let Some(g) = guild.to_guild_cached(ctx) {
        let rg = g.read();
        if rg.owner_id == user {
            trace!("User is server owner.");
            return Ok(true);
        }
        if rg.member_permissions(user).manage_guild() {
            trace!("User has manage server.");
            return Ok(true);
        }
    }

    match admin_role(guild)? {
        Some(role) => {
            let has = user.to_user(ctx).map_err(SerenityError::from)?
                .has_role(ctx, guild, role).map_err(SerenityError::from)?;
            Ok(has)
        }
        None => Ok(false)
    }
}

/// Guards admin-only subcommands of commands anyone may otherwise run.
pub fn require_admin(ctx: &Context, msg: &Message) -> commands::Result<()> {
    let guild = msg.guild_id.ok_or(hook::Error::Denied)?;
    if is_guild_admin(ctx, guild, msg.author.id)? {
        Ok(())
    } else {
        Err(commands::Error::InsufficientUserPerms(msg.author.id))
    }
}

/// Whether someone may run `module`'s command. The bot owner may run everything, and guild
/// admins may run everything that isn't owner-only.
pub fn may_run(module: &Module, owner: bool, admin: bool) -> bool {
    owner || (!module.is_owner_only() && (!module.is_sensitive() || admin))
}

fn privilege_hook<'a, 'b, 'c, 'd>(disp: &'a Dispatch, ctx: &'b Context, msg: &'c Message, name: Cow<'d, str>) -> hook::Result<Cow<'d, str>> {
    trace!("Applying privilege hook.");
    let module = match disp.modules().get(name.as_ref()) {
        Some(m) => m,
        // Unknown commands are reported by dispatch.
        None => return Ok(name)
    };

    let owner = msg.author.id == disp.owner();
    if may_run(module, owner, false) {
        trace!("Command not sensitive, or user is the bot owner.");
        return Ok(name);
    }

    if module.is_owner_only() {
        return Err(DeniedWithReason("Only the bot owner can use that command.".into()));
    }

    let guild = msg.guild_id.ok_or(hook::Error::Denied)?;
    if is_guild_admin(ctx, guild, msg.author.id)? {
        return Ok(name);
    }

    trace!("Command is sensitive and user is not admin or owner.");
    let role = admin_role(guild)?
        .ok_or_else(|| DeniedWithReason("That command is restricted to admins, and this server has no admin_role configured.".into()))?;
    let role_name = role.to_role_cached(ctx)
        .map(|r| r.name)
        .unwrap_or_else(|| role.to_string());
    Err(NeedRole(vec![role_name]))
}

/// Creates the privilege [Module].
pub fn privilege_module() -> Module {
    Module::with_name("privilege")
        .with_dependency("config")
        .with_config_value(config::Value::new(
            ADMIN_KEY,
            "The role which should be allowed to run restricted commands.",
            config::valid_parseable::<RoleId>,
            Option::<String>::None,
        ))
        .with_command_hook(privilege_hook)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn who_may_run_what() {
        let open = Module::with_name("open").with_sensitivity(false);
        let sensitive = Module::with_name("sensitive");
        let owner_only = Module::with_name("owner_only").with_owner_only(true);

        assert!(may_run(&open, false, false));
        assert!(!may_run(&sensitive, false, false));
        assert!(may_run(&sensitive, false, true));
        assert!(may_run(&sensitive, true, false));
        assert!(!may_run(&owner_only, false, true));
        assert!(may_run(&owner_only, true, false));
    }
}
