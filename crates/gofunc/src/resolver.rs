//! Import path resolution for Go modules.
//!
//! Maps an import path to the directory holding its sources:
//!
//! - packages of a required module live in the module cache at
//!   `<root>/<module>@<version>/<subpackage>`, unless a replace rule redirects
//!   them to another module version or to a local directory
//! - packages of the current module live below the manifest directory
//! - anything else (the standard library, or a qualifier that is really a
//!   local variable) does not resolve

use std::cell::OnceCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::gomod::{Manifest, Replacement, subpackage_suffix};

/// Environment variable that overrides the module cache location.
pub const MODCACHE_ENV: &str = "GOMODCACHE";

/// Source of the module cache root, resolved at most once.
///
/// Lookup order: an explicit root, then `GOMODCACHE`, then
/// `go env GOMODCACHE`. The first successful answer is kept for the lifetime
/// of the value.
#[derive(Debug, Default)]
pub struct ModuleCache {
    explicit: Option<PathBuf>,
    go_binary: Option<PathBuf>,
    root: OnceCell<PathBuf>,
}

impl ModuleCache {
    /// Create a cache locator with optional explicit root and `go` binary.
    #[must_use]
    pub fn new(explicit: Option<PathBuf>, go_binary: Option<PathBuf>) -> Self {
        Self {
            explicit,
            go_binary,
            root: OnceCell::new(),
        }
    }

    /// A cache rooted at a fixed directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(Some(root.into()), None)
    }

    /// The module cache root, discovering it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleCache`] when no override is set and the `go`
    /// toolchain cannot be found or does not report a cache directory.
    pub fn root(&self) -> Result<&Path> {
        if let Some(root) = self.root.get() {
            return Ok(root);
        }
        let discovered = self.discover()?;
        Ok(self.root.get_or_init(|| discovered))
    }

    fn discover(&self) -> Result<PathBuf> {
        self.discover_with(std::env::var_os(MODCACHE_ENV))
    }

    /// Discovery with the `GOMODCACHE` value passed in rather than read.
    fn discover_with(&self, env_root: Option<OsString>) -> Result<PathBuf> {
        if let Some(root) = &self.explicit {
            debug!(root = %root.display(), "Using configured module cache");
            return Ok(root.clone());
        }

        if let Some(root) = env_root.filter(|v| !v.is_empty()) {
            let root = PathBuf::from(root);
            debug!(root = %root.display(), "Using module cache from {MODCACHE_ENV}");
            return Ok(root);
        }

        self.query_toolchain()
    }

    fn query_toolchain(&self) -> Result<PathBuf> {
        let go = match &self.go_binary {
            Some(path) => path.clone(),
            None => which::which("go").map_err(|e| {
                Error::ModuleCache(format!(
                    "{MODCACHE_ENV} is not set and the go toolchain was not found: {e}"
                ))
            })?,
        };

        let output = Command::new(&go)
            .args(["env", MODCACHE_ENV])
            .output()
            .map_err(|e| {
                Error::ModuleCache(format!(
                    "failed to run `{} env {MODCACHE_ENV}`: {e}",
                    go.display()
                ))
            })?;

        if !output.status.success() {
            return Err(Error::ModuleCache(format!(
                "`{} env {MODCACHE_ENV}` exited with {}: {}",
                go.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(Error::ModuleCache(format!(
                "`{} env {MODCACHE_ENV}` printed nothing",
                go.display()
            )));
        }

        debug!(root = %root, "Module cache reported by go toolchain");
        Ok(PathBuf::from(root))
    }
}

/// Translates import paths into source directories for one module.
#[derive(Debug)]
pub struct ModuleResolver {
    manifest_dir: PathBuf,
    manifest: Manifest,
    cache: ModuleCache,
}

impl ModuleResolver {
    /// Create a resolver for the module whose go.mod lives in `manifest_dir`.
    #[must_use]
    pub fn new(manifest_dir: PathBuf, manifest: Manifest, cache: ModuleCache) -> Self {
        Self {
            manifest_dir,
            manifest,
            cache,
        }
    }

    /// The parsed manifest.
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Directory containing go.mod.
    #[must_use]
    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    /// Resolve an import path to a directory.
    ///
    /// Returns `Ok(None)` for paths that belong neither to a requirement nor to
    /// the current module. The returned directory is not checked for
    /// existence; a missing cache entry shows up later as a declaration that
    /// cannot be found.
    ///
    /// # Errors
    ///
    /// Fails only when an external module needs the module cache and its root
    /// cannot be determined.
    pub fn resolve(&self, import_path: &str) -> Result<Option<PathBuf>> {
        let Some(req) = self.manifest.requirement_for(import_path) else {
            return Ok(self.resolve_intra_module(import_path));
        };
        let suffix = subpackage_suffix(import_path, &req.path).unwrap_or_default();

        let (module_path, version) = match self.manifest.replacement_for(&req.path, &req.version)
        {
            Some(rep) if rep.is_local() => {
                let dir = join_suffix(self.manifest_dir.join(&rep.new_path), suffix);
                debug!(
                    import = %import_path,
                    replacement = %rep.new_path,
                    dir = %dir.display(),
                    "Resolved import through local replace"
                );
                return Ok(Some(dir));
            }
            Some(Replacement {
                new_path,
                new_version: Some(new_version),
                ..
            }) => (new_path.as_str(), new_version),
            _ => (req.path.as_str(), &req.version),
        };

        let module_dir = format!(
            "{}@{}",
            escape_module_path(module_path),
            escape_module_path(version.as_str())
        );
        let dir = join_suffix(self.cache.root()?.join(module_dir), suffix);
        debug!(
            import = %import_path,
            module = %module_path,
            version = %version,
            dir = %dir.display(),
            "Resolved import into module cache"
        );
        Ok(Some(dir))
    }

    fn resolve_intra_module(&self, import_path: &str) -> Option<PathBuf> {
        let Some(suffix) = subpackage_suffix(import_path, &self.manifest.module) else {
            trace!(import = %import_path, "Import is not part of any known module");
            return None;
        };
        let dir = join_suffix(self.manifest_dir.clone(), suffix);
        debug!(
            import = %import_path,
            dir = %dir.display(),
            "Resolved import inside current module"
        );
        Some(dir)
    }
}

fn join_suffix(base: PathBuf, suffix: &str) -> PathBuf {
    if suffix.is_empty() { base } else { base.join(suffix) }
}

/// Apply the module cache's case encoding: each upper-case letter becomes
/// `!` followed by its lower-case form.
#[must_use]
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(ch.to_ascii_lowercase());
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MANIFEST: &str = r"
module example.com/app

go 1.22

require (
	github.com/acme/widgets v1.4.0
	github.com/acme/gadgets v0.3.1
	github.com/Azure/go-autorest v14.2.0+incompatible
	github.com/local/fork v1.0.0
)

replace github.com/acme/gadgets => github.com/acme/gadgets v0.5.0
replace github.com/local/fork => ../fork
";

    fn resolver() -> ModuleResolver {
        let manifest =
            Manifest::parse(Path::new("go.mod"), MANIFEST).expect("test manifest should parse");
        ModuleResolver::new(
            PathBuf::from("/work/app"),
            manifest,
            ModuleCache::with_root("/cache"),
        )
    }

    #[rstest]
    #[case::required_module("github.com/acme/widgets", "/cache/github.com/acme/widgets@v1.4.0")]
    #[case::required_subpackage(
        "github.com/acme/widgets/sprocket/v2",
        "/cache/github.com/acme/widgets@v1.4.0/sprocket/v2"
    )]
    #[case::versioned_replace("github.com/acme/gadgets", "/cache/github.com/acme/gadgets@v0.5.0")]
    #[case::escaped_case(
        "github.com/Azure/go-autorest/autorest",
        "/cache/github.com/!azure/go-autorest@v14.2.0+incompatible/autorest"
    )]
    #[case::local_replace("github.com/local/fork", "/work/app/../fork")]
    #[case::local_replace_subpackage("github.com/local/fork/util", "/work/app/../fork/util")]
    #[case::intra_module("example.com/app/internal/bar", "/work/app/internal/bar")]
    #[case::module_root("example.com/app", "/work/app")]
    fn resolves_import_paths(#[case] import_path: &str, #[case] expected: &str) {
        let resolved = resolver()
            .resolve(import_path)
            .expect("resolution should not fail");
        assert_eq!(resolved, Some(PathBuf::from(expected)));
    }

    #[rstest]
    #[case::standard_library("strings")]
    #[case::unknown_module("github.com/unknown/thing")]
    #[case::sibling_of_module("example.com/application")]
    fn unrelated_imports_do_not_resolve(#[case] import_path: &str) {
        let resolved = resolver()
            .resolve(import_path)
            .expect("resolution should not fail");
        assert_eq!(resolved, None);
    }

    #[test]
    fn resolving_twice_yields_same_directory() {
        let resolver = resolver();
        let first = resolver.resolve("github.com/acme/widgets/sprocket").unwrap();
        let second = resolver.resolve("github.com/acme/widgets/sprocket").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn intra_module_resolution_does_not_need_cache() {
        let manifest = Manifest::parse(Path::new("go.mod"), "module example.com/app\n").unwrap();
        let resolver = ModuleResolver::new(
            PathBuf::from("/work/app"),
            manifest,
            ModuleCache::new(None, Some(PathBuf::from("/nonexistent/go"))),
        );

        assert_eq!(
            resolver.resolve("example.com/app/pkg").unwrap(),
            Some(PathBuf::from("/work/app/pkg"))
        );
    }

    #[test]
    fn explicit_cache_root_is_memoised() {
        let cache = ModuleCache::with_root("/cache");
        let first = cache.root().unwrap().to_path_buf();
        let second = cache.root().unwrap().to_path_buf();
        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("/cache"));
    }

    #[test]
    fn missing_go_binary_is_a_module_cache_error() {
        let cache = ModuleCache::new(None, Some(PathBuf::from("/nonexistent/bin/go")));
        assert!(matches!(
            cache.discover_with(None),
            Err(Error::ModuleCache(_))
        ));
    }

    #[test]
    fn environment_root_is_used_when_set() {
        let cache = ModuleCache::new(None, Some(PathBuf::from("/nonexistent/bin/go")));
        let root = cache
            .discover_with(Some(OsString::from("/env/modcache")))
            .expect("environment root should win over the toolchain");
        assert_eq!(root, PathBuf::from("/env/modcache"));
    }

    #[test]
    fn empty_environment_root_falls_through_to_toolchain() {
        let cache = ModuleCache::new(None, Some(PathBuf::from("/nonexistent/bin/go")));
        assert!(matches!(
            cache.discover_with(Some(OsString::new())),
            Err(Error::ModuleCache(_))
        ));
    }

    #[test]
    fn explicit_root_beats_environment() {
        let cache = ModuleCache::with_root("/configured");
        let root = cache
            .discover_with(Some(OsString::from("/env/modcache")))
            .expect("explicit root");
        assert_eq!(root, PathBuf::from("/configured"));
    }

    #[cfg(unix)]
    fn fake_go(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("go");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write fake go");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make fake go executable");
        path
    }

    #[cfg(unix)]
    #[test]
    fn toolchain_reports_cache_root() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let go = fake_go(
            dir.path(),
            "[ \"$1 $2\" = \"env GOMODCACHE\" ] && echo /toolchain/modcache",
        );
        let cache = ModuleCache::new(None, Some(go));

        let root = cache.discover_with(None).expect("toolchain should report a root");
        assert_eq!(root, PathBuf::from("/toolchain/modcache"));
    }

    #[cfg(unix)]
    #[test]
    fn toolchain_is_queried_at_most_once() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let runs = dir.path().join("runs");
        let go = fake_go(
            dir.path(),
            &format!(
                "echo run >> '{0}'; echo /toolchain/$(wc -l < '{0}' | tr -d ' ')",
                runs.display()
            ),
        );
        let cache = ModuleCache::new(None, Some(go));

        let first = cache.root().expect("first lookup").to_path_buf();
        let second = cache.root().expect("second lookup").to_path_buf();

        assert_eq!(first, second);
        // No run at all when GOMODCACHE is set in the test environment.
        let count = std::fs::read_to_string(&runs).map_or(0, |s| s.lines().count());
        assert!(count <= 1, "toolchain queried {count} times");
    }

    #[cfg(unix)]
    #[rstest]
    #[case::failing_exit("echo boom >&2; exit 3")]
    #[case::empty_output("exit 0")]
    fn toolchain_without_cache_root_is_an_error(#[case] script: &str) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cache = ModuleCache::new(None, Some(fake_go(dir.path(), script)));

        assert!(matches!(
            cache.discover_with(None),
            Err(Error::ModuleCache(_))
        ));
    }

    #[rstest]
    #[case("github.com/acme/widgets", "github.com/acme/widgets")]
    #[case("github.com/BurntSushi/toml", "github.com/!burnt!sushi/toml")]
    #[case("v1.0.0-RC1", "v1.0.0-!r!c1")]
    fn escapes_upper_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_module_path(input), expected);
    }
}
