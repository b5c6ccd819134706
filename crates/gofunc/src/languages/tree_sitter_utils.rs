//! Shared tree-sitter utilities for language support modules.
//!
//! Provides common functions for extracting text and positions from tree-sitter nodes.

// Tree-sitter returns usize for positions; line numbers are reported as u32.
#![allow(clippy::cast_possible_truncation)]

/// Get text content of a tree-sitter node.
///
/// Returns `None` if the node's byte range does not fall on character
/// boundaries of `source`.
pub fn node_text<'s>(node: &tree_sitter::Node<'_>, source: &'s str) -> Option<&'s str> {
    match node.utf8_text(source.as_bytes()) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::trace!(
                byte_range = ?node.byte_range(),
                error = %e,
                node_kind = %node.kind(),
                "Failed to decode node text as UTF-8"
            );
            None
        }
    }
}

/// Text of a named field of `node`, if the field is present.
pub fn field_text<'s>(node: &tree_sitter::Node<'_>, field: &str, source: &'s str) -> Option<&'s str> {
    let child = node.child_by_field_name(field)?;
    node_text(&child, source)
}

/// 1-indexed line on which `node` starts.
pub fn node_line(node: &tree_sitter::Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// Collect the named children of `node` into a vector.
pub fn named_children<'t>(node: &tree_sitter::Node<'t>) -> Vec<tree_sitter::Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}
