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

//! Locations of on-disk data and resources embedded in the binary.

use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Files from the `resources` directory, compiled into the binary.
#[derive(rust_embed::RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/resources/"]
pub struct Resources;

/// The data directory, taken from `TYRIABOT_DIR` if set.
pub static DATA_FOLDER: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("TYRIABOT_DIR")
        .map(|d| PathBuf::from(shellexpand::full(&d).map(|e| e.into_owned()).unwrap_or(d)))
        .unwrap_or_else(|_| default_folder())
});

/// The directory used when `TYRIABOT_DIR` isn't set.
pub fn default_folder() -> PathBuf {
    let mut base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("tyriabot");
    base
}

/// Returns the data directory, creating it if needed.
pub fn ensure_data_folder() -> std::io::Result<&'static PathBuf> {
    std::fs::create_dir_all(DATA_FOLDER.as_path())?;
    Ok(&DATA_FOLDER)
}

/// Reads an embedded resource as a string.
pub fn resource_string(name: &str) -> Option<String> {
    Resources::get(name).map(crate::util::string_from_cow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_are_embedded() {
        for f in &["conn_prelude.sql", "gamedata.json", "log4rs.yaml", "coins.pest"] {
            assert!(resource_string(f).is_some(), "missing {}", f);
        }
    }
}
