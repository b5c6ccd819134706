//! Call and signature extraction for located functions.
//!
//! - [`extract_calls`] lists what a function body calls, in first-call order,
//!   without duplicates and without builtins or calls into blacklisted
//!   utility packages.
//! - [`extract_signature`] classifies each parameter and result type into a
//!   [`TypeShape`] so the expander knows what, if anything, to look up.
//!
//! A selector call `x.Y()` is always read as a call into package `x`. Calls
//! through values are not told apart from package calls; they resolve only
//! if an import happens to share the variable's name.

use indexmap::IndexSet;

use crate::languages::go::node_kinds;
use crate::languages::tree_sitter_utils::{named_children, node_text};
use crate::locator::Located;
use crate::types::{NamedValue, TypeShape};

/// Go builtin functions and predeclared type conversions.
pub const BUILTIN_FUNCS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover", "any", "bool", "byte",
    "complex64", "complex128", "error", "float32", "float64", "int", "int8", "int16", "int32",
    "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr",
];

/// Packages whose functions are never worth surfacing.
pub const BLACKLISTED_PACKAGES: &[&str] = &["fmt", "log", "errors"];

/// Predeclared type names; they have no declaration to find.
pub const PREDECLARED_TYPES: &[&str] = &[
    "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32", "float64",
    "int", "int8", "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr",
];

/// Whether `name` is a builtin function or conversion.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_FUNCS.contains(&name)
}

/// Whether calls into package `name` are ignored.
#[must_use]
pub fn is_blacklisted_package(name: &str) -> bool {
    BLACKLISTED_PACKAGES.contains(&name)
}

/// Whether `name` is a predeclared Go type.
#[must_use]
pub fn is_predeclared_type(name: &str) -> bool {
    PREDECLARED_TYPES.contains(&name)
}

/// Names called from the located function's body.
///
/// Bare calls yield `name`, selector calls on an identifier yield
/// `qualifier.Name`. Calls inside closures count; calls whose callee is any
/// other expression (`a.b.c()`, `f()()`, conversions to composite types) are
/// ignored.
#[must_use]
pub fn extract_calls(function: &Located) -> Vec<String> {
    let node = function.node();
    let source = function.file().source();
    let mut calls = IndexSet::new();

    if let Some(body) = node.child_by_field_name("body") {
        collect_calls(&body, source, &mut calls);
    }

    calls.into_iter().collect()
}

fn collect_calls(node: &tree_sitter::Node<'_>, source: &str, calls: &mut IndexSet<String>) {
    use node_kinds::CALL_EXPRESSION;

    if node.kind() == CALL_EXPRESSION
        && let Some(callee) = node.child_by_field_name("function")
        && let Some(name) = call_name(&callee, source)
    {
        calls.insert(name);
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_calls(&child, source, calls);
    }
}

fn call_name(callee: &tree_sitter::Node<'_>, source: &str) -> Option<String> {
    use node_kinds::{IDENTIFIER, SELECTOR_EXPRESSION};

    match callee.kind() {
        IDENTIFIER => {
            let name = node_text(callee, source)?;
            (!is_builtin(name)).then(|| name.to_string())
        }
        SELECTOR_EXPRESSION => {
            let operand = callee.child_by_field_name("operand")?;
            if operand.kind() != IDENTIFIER {
                return None;
            }
            let qualifier = node_text(&operand, source)?;
            let field = node_text(&callee.child_by_field_name("field")?, source)?;
            if is_builtin(field) || is_blacklisted_package(qualifier) {
                return None;
            }
            Some(format!("{qualifier}.{field}"))
        }
        _ => None,
    }
}

/// Parameter and result types of the located function, in declaration order.
///
/// A parameter declaration naming several identifiers (`a, b int`) yields a
/// single value, since only the type is of interest.
#[must_use]
pub fn extract_signature(function: &Located) -> (Vec<NamedValue>, Vec<NamedValue>) {
    let node = function.node();
    let source = function.file().source();

    let params = node
        .child_by_field_name("parameters")
        .map(|list| parameter_types(&list, source))
        .unwrap_or_default();

    let returns = match node.child_by_field_name("result") {
        Some(result) if result.kind() == node_kinds::PARAMETER_LIST => {
            parameter_types(&result, source)
        }
        Some(result) => vec![named_value(&result, source)],
        None => Vec::new(),
    };

    (params, returns)
}

fn parameter_types(list: &tree_sitter::Node<'_>, source: &str) -> Vec<NamedValue> {
    use node_kinds::{PARAMETER_DECLARATION, VARIADIC_PARAMETER_DECLARATION};

    named_children(list)
        .iter()
        .filter_map(|param| {
            let ty = param.child_by_field_name("type")?;
            match param.kind() {
                PARAMETER_DECLARATION => Some(named_value(&ty, source)),
                VARIADIC_PARAMETER_DECLARATION => {
                    let text = format!("...{}", node_text(&ty, source)?);
                    Some(NamedValue::new(
                        TypeShape::Sequence(Box::new(classify_type(&ty, source))),
                        text,
                    ))
                }
                _ => None,
            }
        })
        .collect()
}

fn named_value(ty: &tree_sitter::Node<'_>, source: &str) -> NamedValue {
    let text = node_text(ty, source).unwrap_or_default();
    NamedValue::new(classify_type(ty, source), text)
}

/// Classify a type expression node.
#[must_use]
pub fn classify_type(ty: &tree_sitter::Node<'_>, source: &str) -> TypeShape {
    use node_kinds::{
        ARRAY_TYPE, IMPLICIT_LENGTH_ARRAY_TYPE, PARENTHESIZED_TYPE, POINTER_TYPE, QUALIFIED_TYPE,
        SLICE_TYPE, TYPE_IDENTIFIER,
    };

    let unsupported = || TypeShape::Unsupported {
        kind: ty.kind().to_string(),
    };

    match ty.kind() {
        TYPE_IDENTIFIER => node_text(ty, source)
            .map_or_else(unsupported, |name| TypeShape::Ident(name.to_string())),
        QUALIFIED_TYPE => {
            let package = ty
                .child_by_field_name("package")
                .and_then(|n| node_text(&n, source));
            let name = ty
                .child_by_field_name("name")
                .and_then(|n| node_text(&n, source));
            match (package, name) {
                (Some(package), Some(name)) => TypeShape::Qualified {
                    package: package.to_string(),
                    name: name.to_string(),
                },
                _ => unsupported(),
            }
        }
        POINTER_TYPE => ty.named_child(0).map_or_else(unsupported, |inner| {
            TypeShape::Pointer(Box::new(classify_type(&inner, source)))
        }),
        SLICE_TYPE | ARRAY_TYPE | IMPLICIT_LENGTH_ARRAY_TYPE => ty
            .child_by_field_name("element")
            .map_or_else(unsupported, |element| {
                TypeShape::Sequence(Box::new(classify_type(&element, source)))
            }),
        PARENTHESIZED_TYPE => ty
            .named_child(0)
            .map_or_else(unsupported, |inner| classify_type(&inner, source)),
        _ => unsupported(),
    }
}
