pub mod config;
pub mod export;

pub use export::run_export;

use anyhow::{Context, Result};
use std::path::PathBuf;
use trackmap_etl::Config;

/// Load the effective configuration, applying a `--root` override.
pub fn load_config(root: Option<PathBuf>) -> Result<Config> {
    let config = match root {
        Some(root) => Config::load_with_root(root),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    tracing::debug!(?config, "effective configuration");
    Ok(config)
}
