//! # gofunc: Go Function Context Extraction
//!
//! gofunc pulls a single Go function out of a module together with what a
//! reader needs to understand it: the struct declarations behind its
//! parameter and result types, and the signatures of every function it
//! calls. Calls and types are resolved one level deep through the module's
//! go.mod, into sibling packages, `replace` targets and the module cache.
//! The result is rendered into a text template, typically a prompt for
//! generating unit tests.
//!
//! ## Design Philosophy
//!
//! - **Syntax, not types** - Everything is found by parsing with tree-sitter
//!   and walking directories; there is no type checker
//! - **First match wins** - A directory walk stops at the first matching
//!   declaration
//! - **Degrade, don't fail** - A dependency that cannot be found is rendered
//!   as its type text; only a missing manifest or a broken target search
//!   aborts
//! - **One hop** - Called functions are described but never expanded further
//!
//! ## Quick Start
//!
//! ```no_run
//! use gofunc::{Config, Renderer, Session};
//! use std::path::Path;
//!
//! let dir = Path::new("/path/to/module/service");
//! let mut session = Session::open(dir, &Config::default())?;
//!
//! let bundle = session.extract(dir, "Server.Start")?;
//! println!("{} calls {} functions", bundle.package, bundle.funcs.len());
//!
//! let prompt = Renderer::default().render(&bundle)?;
//! # Ok::<(), gofunc::Error>(())
//! ```

mod config;
mod error;
mod expander;
mod extractor;
mod gomod;
mod languages;
mod locator;
mod parser;
mod render;
mod resolver;
mod session;
mod types;

use std::path::Path;

pub use config::{CONFIG_FILE_NAME, Config};
pub use error::{Error, Result, ScanError, ScanErrorKind};
pub use expander::Expander;
pub use extractor::{
    BLACKLISTED_PACKAGES, BUILTIN_FUNCS, PREDECLARED_TYPES, extract_calls, extract_signature,
    is_blacklisted_package, is_builtin, is_predeclared_type,
};
pub use gomod::{
    MANIFEST_FILE_NAME, Manifest, ModuleVersion, Replacement, Requirement, find_manifest,
};
pub use locator::{DeclKind, Located, ScanMode, SourceWalk, locate_function, locate_struct};
pub use parser::{GoParser, SourceFile};
pub use render::{DEFAULT_TEMPLATE, Renderer, render_json};
pub use resolver::{MODCACHE_ENV, ModuleCache, ModuleResolver, escape_module_path};
pub use session::Session;
pub use types::{FunctionBundle, FunctionInfo, ImportEntry, NamedValue, TypeShape, TypeTarget};

/// Extract function `name` from the sources below `dir` in a fresh session.
///
/// # Errors
///
/// See [`Session::open`] and [`Session::extract`].
pub fn extract_function(dir: &Path, name: &str, config: &Config) -> Result<FunctionBundle> {
    Session::open(dir, config)?.extract(dir, name)
}
