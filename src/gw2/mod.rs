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

//! A small blocking client for the Guild Wars 2 web API, plus the game-specific logic that
//! doesn't need Discord.

use std::time::Duration;

use itertools::Itertools;
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::RequestBuilder;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;

pub mod coins;
pub mod error;
pub mod feeds;
pub mod gamedata;
pub mod inventory;
pub mod model;

pub use error::{ApiError, Result};

/// Root of every API endpoint.
pub const API_BASE: &str = "https://api.guildwars2.com/v2/";
/// The official news RSS feed.
pub const NEWS_FEED_URL: &str = "https://www.guildwars2.com/en/feed/";
/// The ArcDPS download page.
pub const ARCDPS_URL: &str = "https://www.deltaconnected.com/arcdps/";
/// The most IDs the API accepts in a single `ids=` lookup.
pub const MAX_IDS_PER_REQUEST: usize = 200;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Everything but unreserved characters gets escaped in paths and query values.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

static CLIENT: Lazy<Client> = Lazy::new(|| Client::new(API_BASE));

/// The shared API client.
pub fn client() -> &'static Client {
    &CLIENT
}

/// Escapes a user-provided string for use in a URL path or query value.
pub fn encode(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT).to_string()
}

/// Blocking HTTP client preconfigured for the API.
pub struct Client {
    http: reqwest::blocking::Client,
    base: String,
}

impl Client {
    /// Creates a client rooted at `base`.
    pub fn new(base: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("A GW2 Discord bot"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to a default HTTP client: {}", e);
                reqwest::blocking::Client::new()
            });

        Client { http, base: base.into() }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base, endpoint)
    }

    /// Calls a public endpoint, e.g. `commerce/prices/19976`.
    pub fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        trace!("GET {}", endpoint);
        decode(self.http.get(&self.url(endpoint)))
    }

    /// Calls an endpoint with an API key.
    pub fn get_authed<T: DeserializeOwned>(&self, endpoint: &str, key: &str) -> Result<T> {
        trace!("GET {} (authed)", endpoint);
        decode(self.http.get(&self.url(endpoint)).bearer_auth(key))
    }

    /// Looks up many IDs on an endpoint, in batches the API accepts.
    pub fn get_many<T: DeserializeOwned>(&self, endpoint: &str, ids: &[u64]) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let sep = if endpoint.contains('?') { '&' } else { '?' };
            let url = format!("{}{}ids={}", endpoint, sep, chunk.iter().join(","));
            let mut batch: Vec<T> = self.get(&url)?;
            out.append(&mut batch);
        }
        Ok(out)
    }

    /// Fetches a page outside the API, such as the news feed, as text.
    pub fn fetch_page(&self, url: &str) -> Result<String> {
        trace!("GET {}", url);
        let resp = self.http.get(url)
            .header(ACCEPT, "*/*")
            .send()?;
        if let Some(e) = ApiError::from_status(resp.status()) {
            return Err(e);
        }
        Ok(resp.text()?)
    }
}

fn decode<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send()?;
    if let Some(e) = ApiError::from_status(resp.status()) {
        return Err(e);
    }
    let body = resp.text()?;
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding() {
        assert_eq!(encode("Some Guild"), "Some%20Guild");
        assert_eq!(encode("Zoë Déjà"), "Zo%C3%AB%20D%C3%A9j%C3%A0");
        assert_eq!(encode("a-b_c.d~"), "a-b_c.d~");
    }

    #[test]
    fn urls() {
        let c = Client::new("http://localhost/v2/");
        assert_eq!(c.url("account"), "http://localhost/v2/account");
    }
}
