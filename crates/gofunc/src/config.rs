//! Configuration for gofunc.
//!
//! Settings come from an optional `.gofunc.yaml` file; command-line flags
//! override them.
//!
//! ```yaml
//! module_cache: /home/me/go/pkg/mod
//! go_binary: /usr/local/go/bin/go
//! template: prompts/unit-test.tera
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the configuration file looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = ".gofunc.yaml";

/// Extraction settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Module cache root; when unset, `GOMODCACHE` or `go env` is consulted
    pub module_cache: Option<PathBuf>,
    /// `go` binary used to query the module cache; found on `PATH` when unset
    pub go_binary: Option<PathBuf>,
    /// Tera template replacing the built-in one
    pub template: Option<PathBuf>,
}

impl Config {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if it is not valid YAML for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        debug!(config = %path.display(), "Loaded configuration");
        Ok(config.relative_to(base))
    }

    /// Load `.gofunc.yaml` from `dir` if present, else the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`] when the file exists.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn relative_to(self, base: &Path) -> Self {
        let anchor = |p: Option<PathBuf>| p.map(|p| if p.is_relative() { base.join(p) } else { p });
        Self {
            module_cache: anchor(self.module_cache),
            go_binary: anchor(self.go_binary),
            template: anchor(self.template),
        }
    }
}
