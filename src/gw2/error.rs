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

//! Errors from talking to the Guild Wars 2 API.

use std::borrow::Cow;

use reqwest::StatusCode;

use crate::error::BotError;

/// Alias for API results.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Everything that can go wrong with an API call.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// HTTP 400. The API uses it for empty transaction lists, among other things.
    #[error("API has responded with the following error: `No ongoing transactions`")]
    BadRequest,
    /// HTTP 401, the API doesn't recognize the key.
    #[error("API has responded with the following error: `Invalid access token`")]
    InvalidKey,
    /// HTTP 403, usually a key without access.
    #[error("API has responded with the following error: `Access denied`")]
    Forbidden,
    /// HTTP 404.
    #[error("API has responded with the following error: `Not found`")]
    NotFound,
    /// Rate limits and other unexpected statuses.
    #[error("API has responded with the following error: `{0}`")]
    Connection(Cow<'static, str>),
    /// The user has no key, or their key lacks scopes.
    #[error("{0}")]
    Key(String),
    /// The request never made it.
    #[error("Couldn't reach the API: {0}")]
    Http(#[from] reqwest::Error),
    /// The response wasn't shaped as expected.
    #[error("Unexpected response from the API: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Maps a non-success HTTP status onto an error, or `None` for 200 and 206.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            200 | 206 => None,
            400 => Some(ApiError::BadRequest),
            401 => Some(ApiError::InvalidKey),
            403 => Some(ApiError::Forbidden),
            404 => Some(ApiError::NotFound),
            429 => {
                warn!("API call limit reached");
                Some(ApiError::Connection("Requests limit has been achieved. Try again later.".into()))
            }
            _ => Some(ApiError::Connection(status.to_string().into()))
        }
    }
}

impl BotError for ApiError {
    fn is_user_error(&self) -> bool {
        match self {
            ApiError::Http(_) | ApiError::Decode(_) => false,
            _ => true
        }
    }
}

impl From<ApiError> for crate::modules::commands::Error {
    fn from(e: ApiError) -> Self {
        crate::modules::commands::Error::RuntimeFailure(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(ApiError::from_status(StatusCode::OK).is_none());
        assert!(ApiError::from_status(StatusCode::PARTIAL_CONTENT).is_none());
        assert!(matches!(ApiError::from_status(StatusCode::BAD_REQUEST), Some(ApiError::BadRequest)));
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED), Some(ApiError::InvalidKey)));
        assert!(matches!(ApiError::from_status(StatusCode::FORBIDDEN), Some(ApiError::Forbidden)));
        assert!(matches!(ApiError::from_status(StatusCode::NOT_FOUND), Some(ApiError::NotFound)));
        let limited = ApiError::from_status(StatusCode::TOO_MANY_REQUESTS).unwrap();
        assert_eq!(limited.to_string(),
                   "API has responded with the following error: `Requests limit has been achieved. Try again later.`");
        assert!(limited.is_user_error());
        assert!(matches!(ApiError::from_status(StatusCode::BAD_GATEWAY), Some(ApiError::Connection(_))));
    }
}
