use std::path::{Path, PathBuf};

use anyhow::Result;
use legislature::LegislatureConfig;

/// Resolve the effective configuration.
///
/// Order: built-in defaults, then the TOML file (if given), then
/// `LEGISLATURE_*` environment variables, then command-line flags.
pub fn resolve(config_path: Option<&Path>, database: Option<PathBuf>) -> Result<LegislatureConfig> {
    let mut config = match config_path {
        Some(path) => LegislatureConfig::load(path)?,
        None => LegislatureConfig::from_env(),
    };
    if let Some(path) = database {
        config.database_path = path;
    }
    config.validate()?;
    Ok(config)
}
