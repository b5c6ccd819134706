//! Extraction sessions.
//!
//! A [`Session`] owns everything one module's extractions share: the parsed
//! go.mod, the module cache location (looked up at most once) and a reusable
//! parser. Nothing is cached between extractions beyond that.

use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::expander::Expander;
use crate::extractor::{extract_calls, extract_signature};
use crate::gomod::find_manifest;
use crate::locator::{ScanMode, locate_function};
use crate::parser::GoParser;
use crate::resolver::{ModuleCache, ModuleResolver};
use crate::types::FunctionBundle;

/// Extraction state for one Go module.
#[derive(Debug)]
pub struct Session {
    resolver: ModuleResolver,
    parser: GoParser,
}

impl Session {
    /// Open a session for the module containing `dir`.
    ///
    /// # Errors
    ///
    /// Fails when no go.mod is found above `dir`, when it cannot be parsed,
    /// or when the Go grammar cannot be loaded.
    pub fn open(dir: &Path, config: &Config) -> Result<Self> {
        let (manifest_dir, manifest) = find_manifest(dir)?;
        let cache = ModuleCache::new(config.module_cache.clone(), config.go_binary.clone());
        Self::with_resolver(ModuleResolver::new(manifest_dir, manifest, cache))
    }

    /// Open a session around an existing resolver.
    ///
    /// # Errors
    ///
    /// Fails when the Go grammar cannot be loaded.
    pub fn with_resolver(resolver: ModuleResolver) -> Result<Self> {
        Ok(Self {
            resolver,
            parser: GoParser::new()?,
        })
    }

    /// The session's import resolver.
    #[must_use]
    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// Extract function `name` from the sources below `dir`.
    ///
    /// `name` is a function name or `Receiver.Method` for a pointer-receiver
    /// method. The first match in walk order is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FunctionNotFound`] when no declaration matches, and
    /// [`Error::Parse`] or [`Error::Io`] when any file visited during the
    /// search cannot be read or parsed.
    pub fn extract(&mut self, dir: &Path, name: &str) -> Result<FunctionBundle> {
        let target = locate_function(&mut self.parser, dir, name, ScanMode::Strict)?.ok_or_else(
            || Error::FunctionNotFound {
                name: name.to_string(),
                dir: dir.to_path_buf(),
            },
        )?;
        info!(function = %name, file = %target.file().path().display(), "Found target function");

        let package_dir = target.file().path().parent().unwrap_or(dir).to_path_buf();
        let imports = target.file().imports();
        let calls = extract_calls(&target);
        let (params, returns) = extract_signature(&target);
        debug!(
            calls = calls.len(),
            params = params.len(),
            returns = returns.len(),
            "Extracted target signature"
        );

        let mut expander = Expander::new(&mut self.parser, &self.resolver);
        let params = expander.expand_types(&params, &package_dir, &imports)?;
        let returns = expander.expand_types(&returns, &package_dir, &imports)?;
        let funcs = expander.expand_calls(&calls, &package_dir, &imports)?;

        Ok(FunctionBundle {
            module: self.resolver.manifest().module.clone(),
            package: target.file().package_name().unwrap_or_default(),
            code: target.source_text(),
            params,
            returns,
            funcs,
        })
    }
}
