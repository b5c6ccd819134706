//! go.mod discovery and parsing.
//!
//! This module locates the manifest governing a directory and parses the
//! subset of the go.mod grammar that module resolution depends on: the module
//! path, requirements, and replace directives. The remaining directives are
//! validated for shape and otherwise ignored.
//!
//! Lexing follows the go toolchain's own go.mod lexer (`golang.org/x/mod/modfile`):
//! one directive per line, `//` comments, double- and back-quoted tokens,
//! and `(` / `)` opening and closing directive blocks.

use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Name of the manifest file searched for in ancestor directories.
pub const MANIFEST_FILE_NAME: &str = "go.mod";

/// A module version as written in go.mod (`v1.2.3`, pseudo-versions,
/// `v2.0.0+incompatible`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersion {
    raw: String,
    semver: Version,
}

impl ModuleVersion {
    /// Parse a canonical Go module version.
    ///
    /// Returns `None` unless the string is `v` followed by a full semantic
    /// version. Numeric pre-release identifiers with leading zeros, as in the
    /// zero pseudo-version `v0.0.0-00010101000000-000000000000`, are accepted
    /// and compared by value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let bare = raw.strip_prefix('v')?;
        let semver = Version::parse(bare)
            .or_else(|_| Version::parse(&trim_prerelease_zeros(bare)))
            .ok()?;
        Some(Self {
            raw: raw.to_string(),
            semver,
        })
    }

    /// The version exactly as written in the manifest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed semantic version, used for ordering.
    #[must_use]
    pub fn semver(&self) -> &Version {
        &self.semver
    }
}

fn trim_prerelease_zeros(version: &str) -> String {
    let (main, build) = match version.split_once('+') {
        Some((main, build)) => (main, Some(build)),
        None => (version, None),
    };
    let Some((core, pre)) = main.split_once('-') else {
        return version.to_string();
    };

    let pre: Vec<&str> = pre
        .split('.')
        .map(|ident| {
            if ident.len() > 1 && ident.bytes().all(|b| b.is_ascii_digit()) {
                let trimmed = ident.trim_start_matches('0');
                if trimmed.is_empty() { "0" } else { trimmed }
            } else {
                ident
            }
        })
        .collect();

    let mut normalized = format!("{core}-{}", pre.join("."));
    if let Some(build) = build {
        normalized.push('+');
        normalized.push_str(build);
    }
    normalized
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Module path of the dependency
    pub path: String,
    /// Required version
    pub version: ModuleVersion,
    /// Whether the entry carries an `// indirect` comment
    pub indirect: bool,
}

/// A `replace` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Module path being replaced
    pub old_path: String,
    /// Only this version is replaced when present
    pub old_version: Option<ModuleVersion>,
    /// Replacement module path, or a filesystem path when `new_version` is absent
    pub new_path: String,
    /// Replacement version
    pub new_version: Option<ModuleVersion>,
}

impl Replacement {
    /// Whether the replacement points at a directory rather than a module.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.new_version.is_none()
    }
}

/// A parsed go.mod file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// The module's own import path
    pub module: String,
    /// Value of the `go` directive, if any
    pub go_version: Option<String>,
    /// Requirements in file order
    pub requires: Vec<Requirement>,
    /// Replace rules in file order
    pub replaces: Vec<Replacement>,
}

/// Directives that can open a parenthesised block.
const BLOCK_DIRECTIVES: &[&str] = &[
    "require", "replace", "exclude", "retract", "tool", "ignore", "godebug",
];

impl Manifest {
    /// Read and parse a go.mod file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] if the file cannot be read or does not
    /// parse.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Manifest {
            path: path.to_path_buf(),
            line: 0,
            message: format!("cannot read manifest: {e}"),
        })?;
        Self::parse(path, &text)
    }

    /// Parse go.mod text. `path` is used only for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] with the offending line for unknown
    /// directives, malformed `require`/`replace` entries, invalid versions,
    /// unterminated blocks and a missing `module` line.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut builder = ManifestBuilder::default();
        let mut open_block: Option<(String, usize)> = None;

        for (idx, raw_line) in text.lines().enumerate() {
            let line = idx + 1;
            let err = |message: String| Error::Manifest {
                path: path.to_path_buf(),
                line,
                message,
            };

            let (tokens, comment) = tokenize(raw_line).map_err(err)?;
            if tokens.is_empty() {
                continue;
            }

            if let Some((verb, _)) = &open_block {
                if tokens.len() == 1 && tokens[0] == ")" {
                    open_block = None;
                } else {
                    builder
                        .directive(verb, &tokens, comment.as_deref())
                        .map_err(err)?;
                }
                continue;
            }

            let verb = tokens[0].as_str();
            if tokens.len() == 2 && tokens[1] == "(" {
                if !BLOCK_DIRECTIVES.contains(&verb) {
                    return Err(err(format!("directive `{verb}` cannot open a block")));
                }
                open_block = Some((verb.to_string(), line));
                continue;
            }

            builder
                .directive(verb, &tokens[1..], comment.as_deref())
                .map_err(err)?;
        }

        if let Some((verb, line)) = open_block {
            return Err(Error::Manifest {
                path: path.to_path_buf(),
                line,
                message: format!("unterminated `{verb}` block"),
            });
        }

        builder.finish().ok_or_else(|| Error::Manifest {
            path: path.to_path_buf(),
            line: 0,
            message: "no module directive found".to_string(),
        })
    }

    /// Find the requirement that provides `import_path`.
    ///
    /// An exact module path match wins; otherwise the requirement whose path is
    /// the longest path-segment prefix of `import_path`. When a module is
    /// required more than once the highest version is selected.
    #[must_use]
    pub fn requirement_for(&self, import_path: &str) -> Option<&Requirement> {
        let exact = highest(self.requires.iter().filter(|r| r.path == import_path));
        if exact.is_some() {
            return exact;
        }

        let longest = self
            .requires
            .iter()
            .filter(|r| subpackage_suffix(import_path, &r.path).is_some())
            .map(|r| r.path.len())
            .max()?;

        highest(self.requires.iter().filter(|r| {
            r.path.len() == longest && subpackage_suffix(import_path, &r.path).is_some()
        }))
    }

    /// Find the replace rule for a module at a given version.
    ///
    /// A rule naming the exact version wins over a rule for all versions; among
    /// equally specific rules the last one in the file applies.
    #[must_use]
    pub fn replacement_for(&self, path: &str, version: &ModuleVersion) -> Option<&Replacement> {
        let candidates = || self.replaces.iter().rev().filter(|r| r.old_path == path);
        candidates()
            .find(|r| r.old_version.as_ref() == Some(version))
            .or_else(|| candidates().find(|r| r.old_version.is_none()))
    }
}

/// Return the part of `import_path` below `module_path`.
///
/// `Some("")` when they are equal, `Some("sub/pkg")` for a package inside the
/// module, and `None` when `import_path` is not within `module_path`. Matching
/// is by whole path segments, so `example.com/foo` does not contain
/// `example.com/foobar`.
#[must_use]
pub fn subpackage_suffix<'a>(import_path: &'a str, module_path: &str) -> Option<&'a str> {
    let rest = import_path.strip_prefix(module_path)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

fn highest<'a>(reqs: impl Iterator<Item = &'a Requirement>) -> Option<&'a Requirement> {
    reqs.max_by(|a, b| a.version.semver().cmp(b.version.semver()))
}

/// Walk up from `start` to the nearest directory containing a go.mod.
///
/// Returns the directory holding the manifest together with the parsed
/// manifest. Missing and malformed manifests are both fatal.
///
/// # Errors
///
/// Returns [`Error::Io`] if `start` does not exist, [`Error::ManifestNotFound`]
/// if no ancestor holds a go.mod, and [`Error::Manifest`] if the nearest one
/// cannot be read or parsed.
pub fn find_manifest(start: &Path) -> Result<(PathBuf, Manifest)> {
    let start = start.canonicalize().map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("search directory not found: {}", start.display()),
        ))
    })?;

    for dir in start.ancestors() {
        let candidate = dir.join(MANIFEST_FILE_NAME);
        if candidate.is_file() {
            let manifest = Manifest::load(&candidate)?;
            debug!(
                manifest = %candidate.display(),
                module = %manifest.module,
                requires = manifest.requires.len(),
                replaces = manifest.replaces.len(),
                "Loaded go.mod"
            );
            return Ok((dir.to_path_buf(), manifest));
        }
    }

    Err(Error::ManifestNotFound { start })
}

#[derive(Default)]
struct ManifestBuilder {
    module: Option<String>,
    go_version: Option<String>,
    requires: Vec<Requirement>,
    replaces: Vec<Replacement>,
}

impl ManifestBuilder {
    fn directive(
        &mut self,
        verb: &str,
        args: &[String],
        comment: Option<&str>,
    ) -> std::result::Result<(), String> {
        match verb {
            "module" => {
                let [path] = args else {
                    return Err("usage: module module/path".to_string());
                };
                if self.module.is_some() {
                    return Err("repeated module statement".to_string());
                }
                self.module = Some(path.clone());
            }
            "go" => {
                let [version] = args else {
                    return Err("usage: go 1.23".to_string());
                };
                self.go_version = Some(version.clone());
            }
            "require" => self.requires.push(parse_requirement(args, comment)?),
            "replace" => self.replaces.push(parse_replacement(args)?),
            "toolchain" | "godebug" | "exclude" | "retract" | "tool" | "ignore" => {
                if args.is_empty() {
                    return Err(format!("`{verb}` directive requires arguments"));
                }
                trace!(directive = verb, "Ignoring go.mod directive");
            }
            other => return Err(format!("unknown directive: {other}")),
        }
        Ok(())
    }

    fn finish(self) -> Option<Manifest> {
        Some(Manifest {
            module: self.module?,
            go_version: self.go_version,
            requires: self.requires,
            replaces: self.replaces,
        })
    }
}

fn parse_requirement(
    args: &[String],
    comment: Option<&str>,
) -> std::result::Result<Requirement, String> {
    let [path, version] = args else {
        return Err("usage: require module/path v1.2.3".to_string());
    };
    let indirect = comment.is_some_and(|c| {
        let c = c.trim();
        c == "indirect" || c.starts_with("indirect;")
    });
    Ok(Requirement {
        path: path.clone(),
        version: parse_version(version)?,
        indirect,
    })
}

fn parse_replacement(args: &[String]) -> std::result::Result<Replacement, String> {
    const USAGE: &str = "usage: replace module/path [v1.2.3] => other/module v1.4\n\
                         \t or replace module/path [v1.2.3] => ../local/directory";

    let arrow = args
        .iter()
        .position(|t| t == "=>")
        .ok_or_else(|| USAGE.to_string())?;
    let (old, new) = (&args[..arrow], &args[arrow + 1..]);

    let (old_path, old_version) = match old {
        [path] => (path.clone(), None),
        [path, version] => (path.clone(), Some(parse_version(version)?)),
        _ => return Err(USAGE.to_string()),
    };
    let (new_path, new_version) = match new {
        [path] => (path.clone(), None),
        [path, version] => (path.clone(), Some(parse_version(version)?)),
        _ => return Err(USAGE.to_string()),
    };

    if new_version.is_none() && !is_directory_path(&new_path) {
        return Err(format!(
            "replacement module without version must be directory path \
             (rooted or starting with ./ or ../): {new_path}"
        ));
    }

    Ok(Replacement {
        old_path,
        old_version,
        new_path,
        new_version,
    })
}

fn parse_version(raw: &str) -> std::result::Result<ModuleVersion, String> {
    ModuleVersion::parse(raw).ok_or_else(|| format!("invalid module version: {raw}"))
}

fn is_directory_path(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
        || Path::new(path).is_absolute()
}

/// Split a go.mod line into tokens and a trailing `//` comment.
///
/// Double-quoted and back-quoted tokens are unquoted; parentheses are
/// standalone tokens.
fn tokenize(line: &str) -> std::result::Result<(Vec<String>, Option<String>), String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.char_indices().peekable();

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.is_empty() {
            tokens.push(std::mem::take(current));
        }
    };

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '/' if chars.peek().is_some_and(|&(_, next)| next == '/') => {
                flush(&mut current, &mut tokens);
                return Ok((tokens, Some(line[idx + 2..].to_string())));
            }
            '(' | ')' => {
                flush(&mut current, &mut tokens);
                tokens.push(ch.to_string());
            }
            '"' => {
                flush(&mut current, &mut tokens);
                let mut quoted = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, escaped)) => quoted.push(escaped),
                            None => return Err("unterminated quoted string".to_string()),
                        },
                        Some((_, c)) => quoted.push(c),
                        None => return Err("unterminated quoted string".to_string()),
                    }
                }
                tokens.push(quoted);
            }
            '`' => {
                flush(&mut current, &mut tokens);
                let mut quoted = String::new();
                loop {
                    match chars.next() {
                        Some((_, '`')) => break,
                        Some((_, c)) => quoted.push(c),
                        None => return Err("unterminated raw string".to_string()),
                    }
                }
                tokens.push(quoted);
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);

    Ok((tokens, None))
}
