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

//! Error plumbing shared by every module.
//!
//! Errors are split into user errors, which are echoed back to the invoking user, and backend
//! errors, which are logged and replaced with a generic message.

use std::fmt;

use serenity::model::ModelError;

/// Trait for errors which know whether they should be shown to users.
pub trait BotError: std::error::Error + Send + 'static {
    /// Returns true if the error is the user's fault and its message is safe to show them.
    fn is_user_error(&self) -> bool;
}

/// Type-erased [BotError]. Any [BotError] converts into this with `?`.
pub struct AnyError(Box<dyn BotError>);

impl AnyError {
    /// Boxes up a [BotError].
    pub fn boxed<E: BotError>(e: E) -> Self {
        AnyError(Box::new(e))
    }

    /// Whether or not the wrapped error is a user error.
    pub fn is_user_error(&self) -> bool {
        self.0.is_user_error()
    }
}

impl<E: BotError> From<E> for AnyError {
    fn from(e: E) -> Self {
        AnyError::boxed(e)
    }
}

impl fmt::Debug for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AnyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Result type for anything the dispatcher runs.
pub type BotResult<T> = std::result::Result<T, AnyError>;

/// Wrapper around errors coming out of serenity.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct SerenityError(#[from] serenity::Error);

impl BotError for SerenityError {
    fn is_user_error(&self) -> bool {
        // Model errors are things like missing permissions, which the user can fix.
        match &self.0 {
            serenity::Error::Model(ModelError::MessageTooLong(_)) => false,
            serenity::Error::Model(_) => true,
            _ => false
        }
    }
}

/// A generic user-facing error carrying a message.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct UserError(pub String);

impl UserError {
    /// Creates a new user error from anything string-like.
    pub fn new(s: impl Into<String>) -> Self {
        UserError(s.into())
    }
}

impl BotError for UserError {
    fn is_user_error(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_error_keeps_user_flag() {
        let e: AnyError = UserError::new("nope").into();
        assert!(e.is_user_error());
        assert_eq!(e.to_string(), "nope");

        let e: AnyError = SerenityError::from(serenity::Error::Other("boom")).into();
        assert!(!e.is_user_error());
    }
}
