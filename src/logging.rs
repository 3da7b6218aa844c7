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

//! Sets up log4rs, either from `TYRIABOT_LOG_CONFIG` or from the bundled default config.

use log4rs::config::Config;
use log4rs::file::{Deserializers, RawConfig};

use crate::data::resource_string;

const DEFAULT_CONFIG: &str = "log4rs.yaml";

/// Initializes the global logger.
pub fn init() -> anyhow::Result<()> {
    if let Ok(path) = std::env::var("TYRIABOT_LOG_CONFIG") {
        log4rs::init_file(&path, Deserializers::default())
            .map_err(|e| anyhow::anyhow!("Couldn't load log config {}: {}", path, e))?;
        return Ok(());
    }

    let config = default_config()?;
    log4rs::init_config(config)?;
    Ok(())
}

fn crate_level() -> &'static str {
    if cfg!(feature = "development") {
        "debug"
    } else {
        "info"
    }
}

/// Builds the bundled logging config.
pub fn default_config() -> anyhow::Result<Config> {
    let yaml = resource_string(DEFAULT_CONFIG)
        .ok_or_else(|| anyhow::anyhow!("Missing bundled {}", DEFAULT_CONFIG))?
        .replace("CRATE_LEVEL", crate_level());
    let raw: RawConfig = serde_yaml::from_str(&yaml)?;

    let (appenders, errors) = raw.appenders_lossy(&Deserializers::default());
    for e in errors {
        eprintln!("Failed to build log appender: {}", e);
    }

    Config::builder()
        .appenders(appenders)
        .loggers(raw.loggers())
        .build(raw.root())
        .map_err(|e| anyhow::anyhow!("{}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_config_builds() {
        let config = default_config().unwrap();
        assert!(config.loggers().iter().any(|l| l.name() == "tyriabot"));
    }
}
