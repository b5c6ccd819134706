//! Go language support.
//!
//! Reads package clauses, import lists and top-level declarations out of
//! tree-sitter-go syntax trees.

use super::LanguageSupport;
use super::tree_sitter_utils::{field_text, named_children, node_text};
use crate::types::ImportEntry;

/// Tree-sitter node kind constants for the Go grammar.
pub mod node_kinds {
    // Top-level declarations
    pub const PACKAGE_CLAUSE: &str = "package_clause";
    pub const PACKAGE_IDENTIFIER: &str = "package_identifier";
    pub const IMPORT_DECLARATION: &str = "import_declaration";
    pub const IMPORT_SPEC: &str = "import_spec";
    pub const IMPORT_SPEC_LIST: &str = "import_spec_list";
    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const METHOD_DECLARATION: &str = "method_declaration";
    pub const TYPE_DECLARATION: &str = "type_declaration";
    pub const TYPE_SPEC: &str = "type_spec";

    // Parameters
    pub const PARAMETER_LIST: &str = "parameter_list";
    pub const PARAMETER_DECLARATION: &str = "parameter_declaration";
    pub const VARIADIC_PARAMETER_DECLARATION: &str = "variadic_parameter_declaration";

    // Types
    pub const TYPE_IDENTIFIER: &str = "type_identifier";
    pub const QUALIFIED_TYPE: &str = "qualified_type";
    pub const POINTER_TYPE: &str = "pointer_type";
    pub const SLICE_TYPE: &str = "slice_type";
    pub const ARRAY_TYPE: &str = "array_type";
    pub const IMPLICIT_LENGTH_ARRAY_TYPE: &str = "implicit_length_array_type";
    pub const PARENTHESIZED_TYPE: &str = "parenthesized_type";
    pub const STRUCT_TYPE: &str = "struct_type";

    // Expressions
    pub const CALL_EXPRESSION: &str = "call_expression";
    pub const SELECTOR_EXPRESSION: &str = "selector_expression";
    pub const IDENTIFIER: &str = "identifier";
}

/// Go language support implementation.
pub struct GoLanguage;

impl LanguageSupport for GoLanguage {
    fn extensions(&self) -> &[&str] {
        &["go"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }
}

/// Name from the file's `package` clause.
pub fn package_name(root: &tree_sitter::Node<'_>, source: &str) -> Option<String> {
    use node_kinds::{PACKAGE_CLAUSE, PACKAGE_IDENTIFIER};

    let clause = named_children(root)
        .into_iter()
        .find(|n| n.kind() == PACKAGE_CLAUSE)?;
    let ident = named_children(&clause)
        .into_iter()
        .find(|n| n.kind() == PACKAGE_IDENTIFIER)?;
    node_text(&ident, source).map(str::to_string)
}

/// Extract the file's import list in declaration order.
pub fn extract_imports(root: &tree_sitter::Node<'_>, source: &str) -> Vec<ImportEntry> {
    use node_kinds::{IMPORT_DECLARATION, IMPORT_SPEC, IMPORT_SPEC_LIST};

    let mut imports = Vec::new();
    for decl in named_children(root) {
        if decl.kind() != IMPORT_DECLARATION {
            continue;
        }
        for child in named_children(&decl) {
            match child.kind() {
                IMPORT_SPEC => imports.extend(parse_import_spec(&child, source)),
                IMPORT_SPEC_LIST => imports.extend(
                    named_children(&child)
                        .iter()
                        .filter(|spec| spec.kind() == IMPORT_SPEC)
                        .filter_map(|spec| parse_import_spec(spec, source)),
                ),
                _ => {}
            }
        }
    }
    imports
}

fn parse_import_spec(spec: &tree_sitter::Node<'_>, source: &str) -> Option<ImportEntry> {
    let raw_path = field_text(spec, "path", source)?;
    let path = raw_path.trim_matches(|c| c == '"' || c == '`').to_string();
    let alias = field_text(spec, "name", source).map(str::to_string);
    Some(ImportEntry { alias, path })
}

/// The name a function declaration is looked up by.
///
/// Plain functions use their own name. Methods on a pointer receiver of a
/// named type are `Receiver.Method`; any other method (value receiver,
/// generic receiver) is known only by its bare method name.
pub fn function_name(node: &tree_sitter::Node<'_>, source: &str) -> Option<String> {
    use node_kinds::{FUNCTION_DECLARATION, METHOD_DECLARATION};

    let name = field_text(node, "name", source)?;
    match node.kind() {
        FUNCTION_DECLARATION => Some(name.to_string()),
        METHOD_DECLARATION => match pointer_receiver_type(node, source) {
            Some(receiver) => Some(format!("{receiver}.{name}")),
            None => Some(name.to_string()),
        },
        _ => None,
    }
}

fn pointer_receiver_type<'s>(method: &tree_sitter::Node<'_>, source: &'s str) -> Option<&'s str> {
    use node_kinds::{PARAMETER_DECLARATION, POINTER_TYPE, TYPE_IDENTIFIER};

    let receiver = method.child_by_field_name("receiver")?;
    let param = named_children(&receiver)
        .into_iter()
        .find(|n| n.kind() == PARAMETER_DECLARATION)?;
    let ty = param.child_by_field_name("type")?;
    if ty.kind() != POINTER_TYPE {
        return None;
    }
    let pointee = ty.named_child(0)?;
    if pointee.kind() != TYPE_IDENTIFIER {
        return None;
    }
    node_text(&pointee, source)
}

/// Top-level function and method declarations, in source order.
pub fn function_declarations<'t>(root: &tree_sitter::Node<'t>) -> Vec<tree_sitter::Node<'t>> {
    use node_kinds::{FUNCTION_DECLARATION, METHOD_DECLARATION};

    named_children(root)
        .into_iter()
        .filter(|n| matches!(n.kind(), FUNCTION_DECLARATION | METHOD_DECLARATION))
        .collect()
}

/// Top-level `type` specs whose underlying type is a struct, in source order.
///
/// Specs inside grouped `type ( ... )` declarations are included.
pub fn struct_type_specs<'t>(root: &tree_sitter::Node<'t>) -> Vec<tree_sitter::Node<'t>> {
    use node_kinds::{STRUCT_TYPE, TYPE_DECLARATION, TYPE_SPEC};

    named_children(root)
        .into_iter()
        .filter(|n| n.kind() == TYPE_DECLARATION)
        .flat_map(|decl| named_children(&decl))
        .filter(|spec| {
            spec.kind() == TYPE_SPEC
                && spec
                    .child_by_field_name("type")
                    .is_some_and(|t| t.kind() == STRUCT_TYPE)
        })
        .collect()
}
