pub mod config;
pub mod run;
pub mod search;
pub mod watchlist;

use color_eyre::Result;
use moviebot_config::{PathManager, Settings};

/// Effective settings from the default locations, with env overrides applied
pub fn load_settings() -> Result<(PathManager, Settings)> {
    let paths = PathManager::default();
    let settings = Settings::load(&paths)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load configuration: {:#}", e))?;
    Ok((paths, settings))
}
