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

//! Contains types related to command and event hooks for modules.

use std::borrow::Cow;

use serenity::model::prelude::{GuildId, Member, Message, User};
use serenity::prelude::Context;

use crate::db::DatabaseError;
use crate::dispatch::Dispatch;
use crate::error::{AnyError, BotError, BotResult, SerenityError};

/// Errors that can result from the application of a hook.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The user who triggered the event cannot perform this action, for some reason other than needing a role.
    #[error("The action is forbidden.")]
    Denied,
    /// Denies an action with a reason.
    #[error("{0}")]
    DeniedWithReason(Cow<'static, str>),
    /// The user needed one of the specified roles (given by name) to perform the action.
    #[error("You need one of these roles to perform that action: {0:?}")]
    NeedRole(Vec<String>),
    /// The command specified does not exist.
    #[error("Command not found: {0}")]
    CommandNotFound(String),
    /// The action failed for some backend reason.
    #[error("Failed while processing event. {0}")]
    Failed(AnyError),
}

impl From<AnyError> for Error {
    fn from(e: AnyError) -> Self {
        Error::Failed(e)
    }
}

impl From<Error> for crate::modules::commands::Error {
    fn from(e: Error) -> Self {
        crate::modules::commands::Error::RuntimeFailure(e.into())
    }
}

impl From<serenity::Error> for Error {
    fn from(e: serenity::Error) -> Self {
        Error::Failed(SerenityError::from(e).into())
    }
}

impl From<DatabaseError> for Error {
    fn from(e: DatabaseError) -> Self {
        Error::Failed(e.into())
    }
}

impl From<super::config::Error> for Error {
    fn from(e: super::config::Error) -> Self {
        Error::Failed(e.into())
    }
}

impl BotError for Error {
    fn is_user_error(&self) -> bool {
        match self {
            Error::Failed(e) => e.is_user_error(),
            _ => true
        }
    }
}

/// The hook results alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A function that will be called on every command invocation.
/// Example function signature:
/// ```ignore
/// fn length_hook<'a, 'b, 'c, 'd>(disp: &'a Dispatch, ctx: &'b Context, msg: &'c Message, name: Cow<'d, str>) -> hook::Result<Cow<'d, str>>
/// ```
pub type CommandHookFn = for<'command> fn(&Dispatch, &Context, &Message, Cow<'command, str>) -> Result<Cow<'command, str>>;

/// Called when a member joins a guild.
pub type MemberJoinHookFn = fn(&Dispatch, &Context, GuildId, &Member) -> BotResult<()>;

/// What happened to a user in a [BanHookFn].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanAction {
    /// The user was banned.
    Ban,
    /// The user was unbanned.
    Unban,
}

impl BanAction {
    /// Display name, as used in case messages.
    pub fn as_str(self) -> &'static str {
        match self {
            BanAction::Ban => "Ban",
            BanAction::Unban => "Unban",
        }
    }
}

/// Called when a user is banned or unbanned.
pub type BanHookFn = fn(&Dispatch, &Context, GuildId, &User, BanAction) -> BotResult<()>;

/// Called once, on the first ready event.
pub type ReadyHookFn = fn(&Dispatch, &Context) -> BotResult<()>;
