//! Tree-sitter parsing coordination.
//!
//! [`GoParser`] owns a reusable tree-sitter parser configured for Go and turns
//! files on disk into owned [`SourceFile`]s. A syntax tree containing error
//! or missing nodes counts as a failed parse; the caller decides whether that
//! is fatal (target search) or a file to skip (dependency search).

use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ScanError};
use crate::languages::LanguageSupport;
use crate::languages::go::{self, GoLanguage};
use crate::types::ImportEntry;

/// A parsed Go source file.
pub struct SourceFile {
    path: PathBuf,
    source: String,
    tree: tree_sitter::Tree,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("len", &self.source.len())
            .finish_non_exhaustive()
    }
}

impl SourceFile {
    /// Path the file was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node of the syntax tree.
    #[must_use]
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Name from the `package` clause, if present.
    #[must_use]
    pub fn package_name(&self) -> Option<String> {
        go::package_name(&self.root(), &self.source)
    }

    /// The file's imports in declaration order.
    #[must_use]
    pub fn imports(&self) -> Vec<ImportEntry> {
        go::extract_imports(&self.root(), &self.source)
    }
}

/// Reusable Go parser.
pub struct GoParser {
    parser: tree_sitter::Parser,
}

impl std::fmt::Debug for GoParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoParser").finish_non_exhaustive()
    }
}

impl GoParser {
    /// Create a parser with the Go grammar loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parser`] if the grammar is incompatible with the
    /// linked tree-sitter runtime.
    pub fn new() -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&GoLanguage.tree_sitter_language())
            .map_err(|e| Error::Parser(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Read and parse a file.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] when the file cannot be read, is not UTF-8,
    /// or contains syntax errors.
    pub fn parse_file(&mut self, path: &Path) -> std::result::Result<SourceFile, ScanError> {
        let bytes = std::fs::read(path).map_err(|e| ScanError::io_error(path.to_path_buf(), &e))?;
        let source =
            String::from_utf8(bytes).map_err(|_| ScanError::encoding_error(path.to_path_buf()))?;
        self.parse_source(path.to_path_buf(), source)
    }

    /// Parse source text already in memory.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] when the source contains syntax errors.
    pub fn parse_source(
        &mut self,
        path: PathBuf,
        source: String,
    ) -> std::result::Result<SourceFile, ScanError> {
        let Some(tree) = self.parser.parse(&source, None) else {
            return Err(ScanError::parse_failed(path, "parser produced no tree"));
        };

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(&root).unwrap_or(0);
            return Err(ScanError::parse_failed(
                path,
                format!("syntax error near line {line}"),
            ));
        }

        Ok(SourceFile { path, source, tree })
    }
}

fn first_error_line(node: &tree_sitter::Node<'_>) -> Option<u32> {
    use crate::languages::tree_sitter_utils::node_line;

    if node.is_error() || node.is_missing() {
        return Some(node_line(node));
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .iter()
        .filter(|child| child.has_error())
        .find_map(first_error_line)
}
