//! CLI command implementations.

use std::path::{Path, PathBuf};

use gofunc::Config;

pub mod extract;
pub mod resolve;

/// Load the configuration file and apply command-line overrides.
pub fn load_config(
    dir: &Path,
    config_path: Option<&Path>,
    modcache: Option<PathBuf>,
    template: Option<PathBuf>,
) -> Result<Config, gofunc::Error> {
    let mut config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::discover(dir)?,
    };

    if modcache.is_some() {
        config.module_cache = modcache;
    }
    if template.is_some() {
        config.template = template;
    }
    Ok(config)
}
