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

//! Contains functionality related to processing commands from users.

use std::borrow::Cow;

use clap::App;
use serenity::model::channel::Message;
use serenity::model::id::UserId;
use serenity::prelude::Context;

use crate::dispatch::Dispatch;
use crate::error::{AnyError, BotError, SerenityError, UserError};
use crate::util::{has_subcommands, help_str, subcommand_help};

/// Error types for running commands based on user input.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The user did not have permission to perform the specified action.
    #[error("User {0} is not authorized to perform that action.")]
    InsufficientUserPerms(UserId),
    /// The bot did not have sufficient permissions to perform that action.
    #[error("Tyriabot is missing required permissions to perform that action.")]
    InsufficientBotPerms,
    /// The command failed for some other reason unrelated to permissions.
    #[error("{0}")]
    RuntimeFailure(AnyError),
    /// A backend failure with extra context attached.
    #[error("{0:#}")]
    Backend(#[from] anyhow::Error),
    /// The command failed for some reason which should not be revealed to the user.
    #[error("An unspecified error occurred while performing the action.")]
    Other,
}

impl BotError for Error {
    fn is_user_error(&self) -> bool {
        match self {
            Error::InsufficientUserPerms(_) | Error::InsufficientBotPerms => true,
            Error::RuntimeFailure(e) => e.is_user_error(),
            Error::Backend(_) | Error::Other => false,
        }
    }
}

impl From<serenity::Error> for Error {
    fn from(e: serenity::Error) -> Self {
        Error::RuntimeFailure(SerenityError::from(e).into())
    }
}

impl From<UserError> for Error {
    fn from(e: UserError) -> Self {
        Error::RuntimeFailure(e.into())
    }
}

impl From<AnyError> for Error {
    fn from(e: AnyError) -> Self {
        Error::RuntimeFailure(e)
    }
}

/// Shorthand for failing a command with a message shown to the user.
pub fn user_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(UserError::new(msg).into())
}

/// Alias for result of running commands.
pub type Result<T> = std::result::Result<T, Error>;

/// The trait from which commands are derived. Each module can have one command, which may have
/// subcommands as appropriate.
pub trait Command: Send + Sync {
    /// The primary entry point for the command.
    fn invoke(&self, disp: &Dispatch, ctx: &Context, msg: &Message, args: Cow<str>) -> Result<()>;

    /// The argument parser for the command, used to render help.
    fn parser(&self) -> App<'static, 'static>;

    /// Full help text for the command.
    fn help(&self) -> Cow<'static, str> {
        help_str(&self.parser()).into()
    }

    /// Help text for one subcommand, if the command has a subcommand by that name.
    fn subcommand_help(&self, sub: &str) -> Option<Cow<'static, str>> {
        let app = self.parser();
        let name = app.get_name().to_string();
        subcommand_help(&app, &name, sub).map(Cow::Owned)
    }

    /// Whether the command is split into subcommands at all.
    fn has_subcommands(&self) -> bool {
        has_subcommands(&self.parser())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{AppSettings, Arg, SubCommand};

    struct WithSubs;
    struct Flat;

    impl Command for WithSubs {
        fn invoke(&self, _: &Dispatch, _: &Context, _: &Message, _: Cow<str>) -> Result<()> {
            Ok(())
        }

        fn parser(&self) -> App<'static, 'static> {
            App::new("things")
                .about("Does things.")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(SubCommand::with_name("list").about("Lists the things."))
        }
    }

    impl Command for Flat {
        fn invoke(&self, _: &Dispatch, _: &Context, _: &Message, _: Cow<str>) -> Result<()> {
            Ok(())
        }

        fn parser(&self) -> App<'static, 'static> {
            App::new("flat").arg(Arg::with_name("days").required(false))
        }
    }

    #[test]
    fn subcommand_detection() {
        assert!(WithSubs.has_subcommands());
        assert!(!Flat.has_subcommands());
        assert!(WithSubs.subcommand_help("list").unwrap().contains("Lists the things."));
        assert!(WithSubs.subcommand_help("nope").is_none());
        assert!(WithSubs.help().contains("Does things."));
    }

    #[test]
    fn error_visibility() {
        assert!(Error::InsufficientBotPerms.is_user_error());
        assert!(!Error::Other.is_user_error());
        assert!(!Error::from(anyhow::anyhow!("db exploded")).is_user_error());
        let e: Error = UserError::new("bad input").into();
        assert!(e.is_user_error());
        assert_eq!(e.to_string(), "bad input");
    }
}
