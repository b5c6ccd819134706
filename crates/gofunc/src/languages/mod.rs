//! Language-specific syntax support.
//!
//! Each supported language implements the `LanguageSupport` trait, which tells
//! the walker which files to consider and the parser which grammar to load.
//! Only Go is supported; the declaration helpers in [`go`] interpret its
//! syntax trees.

pub mod go;
pub mod tree_sitter_utils;

/// Trait for language-specific parsing configuration.
pub trait LanguageSupport: Send + Sync {
    /// File extensions this language handles (without the leading dot).
    fn extensions(&self) -> &[&str];

    /// Get the tree-sitter language for parsing.
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Whether `path` has one of this language's extensions.
    fn handles(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }
}
