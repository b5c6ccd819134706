//! Declaration lookup by directory walk.
//!
//! A lookup walks a directory tree depth-first in lexical order, parsing one
//! `.go` file at a time and stopping at the first file that declares the
//! requested name. Files after the match are never read. There is no cache:
//! asking twice walks twice.

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::error::{Result, ScanError, ScanErrorKind};
use crate::languages::LanguageSupport;
use crate::languages::go::{self, GoLanguage};
use crate::languages::tree_sitter_utils::field_text;
use crate::parser::{GoParser, SourceFile};

/// How a lookup treats files it cannot read or parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Any unreadable or unparsable file aborts the lookup
    Strict,
    /// Problem files are logged and skipped; a missing root is "not found"
    Lenient,
}

impl ScanMode {
    fn handle(self, err: ScanError) -> Result<()> {
        match self {
            Self::Strict => Err(err.into()),
            Self::Lenient => {
                warn!(
                    path = %err.path.display(),
                    kind = %err.kind,
                    message = %err.message,
                    "Skipping file during dependency scan"
                );
                Ok(())
            }
        }
    }
}

/// Kind of declaration a [`Located`] handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// A function or method declaration
    Function,
    /// A `type Name struct { ... }` spec
    Struct,
}

/// A declaration found by a lookup, together with the file declaring it.
///
/// The handle owns its file; it is used to regenerate the declaration's
/// source and to read the file's package name and imports.
#[derive(Debug)]
pub struct Located {
    file: SourceFile,
    kind: DeclKind,
    node_kind: &'static str,
    range: Range<usize>,
}

impl Located {
    /// The declaring file.
    #[must_use]
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// What was found.
    #[must_use]
    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    /// The declaration's syntax node.
    #[must_use]
    pub fn node(&self) -> tree_sitter::Node<'_> {
        let root = self.file.root();
        let mut node = root
            .descendant_for_byte_range(self.range.start, self.range.end)
            .unwrap_or(root);
        while node.byte_range() != self.range || node.kind() != self.node_kind {
            match node.parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }
        node
    }

    /// Source text of the declaration.
    ///
    /// Struct specs are prefixed with `type` so a spec taken from a grouped
    /// declaration is still a complete declaration.
    #[must_use]
    pub fn source_text(&self) -> String {
        let text = self.file.source().get(self.range.clone()).unwrap_or_default();
        match self.kind {
            DeclKind::Function => text.to_string(),
            DeclKind::Struct => format!("type {text}"),
        }
    }
}

/// Lazy depth-first walk over Go source files in lexical order.
///
/// Directories the go tool ignores (names starting with `.` or `_`, and
/// `testdata`) are not entered.
pub struct SourceWalk {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

impl SourceWalk {
    /// Start a walk at `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            inner: WalkDir::new(root).sort_by_file_name().into_iter(),
        }
    }
}

impl Iterator for SourceWalk {
    type Item = std::result::Result<PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                    return Some(Err(ScanError::new(
                        path,
                        ScanErrorKind::IoError,
                        e.to_string(),
                    )));
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() > 0 && is_ignored_dir(&entry.file_name().to_string_lossy()) {
                    trace!(dir = %entry.path().display(), "Skipping ignored directory");
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if GoLanguage.handles(entry.path()) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}

fn is_ignored_dir(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_') || name == "testdata"
}

/// Find the first function or method matching `name` below `dir`.
///
/// `name` is either a bare function name or `Receiver.Method` for a method
/// with a pointer receiver.
///
/// # Errors
///
/// In [`ScanMode::Strict`], any walk, read or parse failure is returned.
pub fn locate_function(
    parser: &mut GoParser,
    dir: &Path,
    name: &str,
    mode: ScanMode,
) -> Result<Option<Located>> {
    locate(parser, dir, name, mode, DeclKind::Function, |file| {
        let source = file.source();
        go::function_declarations(&file.root())
            .into_iter()
            .find(|decl| go::function_name(decl, source).as_deref() == Some(name))
            .map(|decl| (decl.kind(), decl.byte_range()))
    })
}

/// Find the first top-level struct type named `name` below `dir`.
///
/// # Errors
///
/// In [`ScanMode::Strict`], any walk, read or parse failure is returned.
pub fn locate_struct(
    parser: &mut GoParser,
    dir: &Path,
    name: &str,
    mode: ScanMode,
) -> Result<Option<Located>> {
    locate(parser, dir, name, mode, DeclKind::Struct, |file| {
        let source = file.source();
        go::struct_type_specs(&file.root())
            .into_iter()
            .find(|spec| field_text(spec, "name", source) == Some(name))
            .map(|spec| (spec.kind(), spec.byte_range()))
    })
}

fn locate(
    parser: &mut GoParser,
    dir: &Path,
    name: &str,
    mode: ScanMode,
    kind: DeclKind,
    find: impl Fn(&SourceFile) -> Option<(&'static str, Range<usize>)>,
) -> Result<Option<Located>> {
    if mode == ScanMode::Lenient && !dir.is_dir() {
        debug!(dir = %dir.display(), "Search directory does not exist");
        return Ok(None);
    }

    for entry in SourceWalk::new(dir) {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                mode.handle(e)?;
                continue;
            }
        };

        let file = match parser.parse_file(&path) {
            Ok(file) => file,
            Err(e) => {
                mode.handle(e)?;
                continue;
            }
        };

        if let Some((node_kind, range)) = find(&file) {
            let located = Located {
                file,
                kind,
                node_kind,
                range,
            };
            debug!(
                name = %name,
                file = %located.file.path().display(),
                kind = ?kind,
                "Located declaration"
            );
            return Ok(Some(located));
        }
    }

    trace!(name = %name, dir = %dir.display(), kind = ?kind, "No matching declaration");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    fn tree_with_files(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().expect("should create temp dir");
        for (path, content) in files {
            let full_path = dir.path().join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).expect("should create parent dirs");
            }
            fs::write(&full_path, content).expect("should write file");
        }
        dir
    }

    fn parser() -> GoParser {
        GoParser::new().expect("Go grammar should load")
    }

    #[test]
    fn walk_is_lexical_and_skips_ignored_directories() {
        let dir = tree_with_files(&[
            ("b.go", "package p\n"),
            ("a.go", "package p\n"),
            ("sub/c.go", "package sub\n"),
            ("testdata/d.go", "package x\n"),
            (".git/e.go", "package x\n"),
            ("_vendor/f.go", "package x\n"),
            ("notes.txt", "not go"),
        ]);

        let files: Vec<_> = SourceWalk::new(dir.path())
            .map(|r| r.expect("walk should succeed"))
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();

        assert_eq!(files, vec!["a.go", "b.go", "sub/c.go"]);
    }

    #[test]
    fn first_match_wins() {
        let dir = tree_with_files(&[
            ("a.go", "package p\n\nfunc Foo() int { return 1 }\n"),
            ("b.go", "package p\n\nfunc Foo() int { return 2 }\n"),
        ]);

        let found = locate_function(&mut parser(), dir.path(), "Foo", ScanMode::Strict)
            .expect("lookup should succeed")
            .expect("Foo should be found");

        assert!(found.file().path().ends_with("a.go"));
        assert!(found.source_text().contains("return 1"));
    }

    #[test]
    fn files_after_match_are_not_parsed() {
        // A strict scan fails on any broken file it parses, so reaching the
        // broken file would turn this into an error.
        let dir = tree_with_files(&[
            ("a.go", "package p\n\nfunc Foo() {}\n"),
            ("z.go", "package p\n\nfunc Broken( {\n"),
        ]);

        let found = locate_function(&mut parser(), dir.path(), "Foo", ScanMode::Strict)
            .expect("lookup should stop before the broken file");
        assert!(found.is_some());
    }

    #[test]
    fn strict_scan_fails_on_broken_file_before_match() {
        let dir = tree_with_files(&[
            ("a.go", "package p\n\nfunc Broken( {\n"),
            ("b.go", "package p\n\nfunc Foo() {}\n"),
        ]);

        let result = locate_function(&mut parser(), dir.path(), "Foo", ScanMode::Strict);
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn lenient_scan_skips_broken_file() {
        let dir = tree_with_files(&[
            ("a.go", "package p\n\nfunc Broken( {\n"),
            ("b.go", "package p\n\nfunc Foo() {}\n"),
        ]);

        let found = locate_function(&mut parser(), dir.path(), "Foo", ScanMode::Lenient)
            .expect("lenient scan should not fail");
        assert!(found.is_some_and(|f| f.file().path().ends_with("b.go")));
    }

    #[test]
    fn lenient_scan_of_missing_directory_is_not_found() {
        let dir = tree_with_files(&[]);
        let missing = dir.path().join("cache/example.com/mod@v1.0.0");

        let found = locate_struct(&mut parser(), &missing, "Config", ScanMode::Lenient)
            .expect("missing directory should not be an error");
        assert!(found.is_none());
    }

    #[test]
    fn strict_scan_of_missing_directory_is_an_error() {
        let dir = tree_with_files(&[]);
        let missing = dir.path().join("nope");

        let result = locate_function(&mut parser(), &missing, "Foo", ScanMode::Strict);
        assert!(result.is_err());
    }

    #[test]
    fn finds_pointer_method_by_qualified_name_only() {
        let dir = tree_with_files(&[(
            "server.go",
            "package p\n\ntype Server struct{}\n\nfunc (s *Server) Start() error { return nil }\n",
        )]);

        let mut parser = parser();
        let qualified =
            locate_function(&mut parser, dir.path(), "Server.Start", ScanMode::Strict).unwrap();
        let bare = locate_function(&mut parser, dir.path(), "Start", ScanMode::Strict).unwrap();

        let found = qualified.expect("qualified name should match");
        assert_eq!(found.node().kind(), "method_declaration");
        assert!(bare.is_none());
    }

    #[test]
    fn finds_struct_in_subdirectory_and_renders_type_keyword() {
        let dir = tree_with_files(&[
            ("main.go", "package p\n\ntype Other struct{}\n"),
            (
                "model/types.go",
                "package model\n\ntype (\n\tConfig struct {\n\t\tName string\n\t}\n)\n",
            ),
        ]);

        let found = locate_struct(&mut parser(), dir.path(), "Config", ScanMode::Strict)
            .unwrap()
            .expect("Config should be found");

        assert_eq!(found.kind(), DeclKind::Struct);
        assert_eq!(found.node().kind(), "type_spec");
        assert!(found.source_text().starts_with("type Config struct {"));
        assert_eq!(found.file().package_name().as_deref(), Some("model"));
    }

    #[test]
    fn non_struct_types_are_not_matched() {
        let dir = tree_with_files(&[(
            "types.go",
            "package p\n\ntype Config interface{ Load() }\n",
        )]);

        let found = locate_struct(&mut parser(), dir.path(), "Config", ScanMode::Strict).unwrap();
        assert!(found.is_none());
    }
}
