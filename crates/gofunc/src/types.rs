//! Core domain types for gofunc.
//!
//! These types describe what an extraction produces (the bundle and its
//! dependency descriptors) and the small amount of syntax the resolver needs
//! to understand (imports and parameter/return type shapes).

use serde::{Deserialize, Serialize};

/// Everything needed to understand one Go function and its direct
/// dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBundle {
    /// Module path from go.mod
    pub module: String,
    /// Package name of the file declaring the function
    pub package: String,
    /// Source of the function declaration
    pub code: String,
    /// One snippet per parameter: the struct declaration when found, else the type text
    pub params: Vec<String>,
    /// One snippet per result, resolved like `params`
    pub returns: Vec<String>,
    /// Functions called from the body, in first-call order
    pub funcs: Vec<FunctionInfo>,
}

/// A function called by the target, with its resolved signature snippets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Called name as written (`helper` or `pkg.Helper`)
    pub name: String,
    /// Parameter snippets; empty when the declaration was not found
    pub params: Vec<String>,
    /// Result snippets; empty when the declaration was not found
    pub returns: Vec<String>,
}

/// One entry of a file's import list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportEntry {
    /// Explicit local name (`cfg "example.com/config"`), including `_` and `.`
    pub alias: Option<String>,
    /// Import path without quotes
    pub path: String,
}

impl ImportEntry {
    /// Create an import entry.
    #[must_use]
    pub fn new(alias: Option<&str>, path: &str) -> Self {
        Self {
            alias: alias.map(str::to_string),
            path: path.to_string(),
        }
    }

    /// The identifier the package is referred to by in the importing file.
    ///
    /// This is the alias when one is given. Otherwise it is the last path
    /// segment, skipping a trailing major-version segment (`/v2`) and
    /// stripping a `gopkg.in` style `.vN` suffix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }

        let mut segments = self.path.rsplit('/');
        let last = segments.next().unwrap_or(&self.path);
        let name = if is_major_version(last) {
            segments.next().unwrap_or(last)
        } else {
            last
        };

        match name.rsplit_once(".v") {
            Some((base, major)) if !base.is_empty() && is_digits(major) => base,
            _ => name,
        }
    }

    /// Whether a call or type qualifier refers to this import.
    ///
    /// Blank (`_`) and dot (`.`) imports never match.
    #[must_use]
    pub fn matches(&self, qualifier: &str) -> bool {
        match self.alias.as_deref() {
            Some("_" | ".") => false,
            _ => self.local_name() == qualifier,
        }
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| is_digits(rest) && rest != "0" && rest != "1")
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Find the import a qualifier refers to.
#[must_use]
pub fn find_import<'a>(qualifier: &str, imports: &'a [ImportEntry]) -> Option<&'a ImportEntry> {
    imports.iter().find(|import| import.matches(qualifier))
}

/// The shape of a parameter or result type, as far as resolution cares.
///
/// Everything the resolver cannot look up (maps, channels, function types,
/// inline struct or interface literals, generic instantiations) is
/// `Unsupported` and is rendered from its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// A bare type name (`Config`, `int`, `error`)
    Ident(String),
    /// A package-qualified type name (`bar.Config`)
    Qualified {
        /// Package qualifier
        package: String,
        /// Type name
        name: String,
    },
    /// `*T`
    Pointer(Box<TypeShape>),
    /// `[]T`, `[N]T`, `[...]T` or a variadic `...T`
    Sequence(Box<TypeShape>),
    /// Any other type expression; carries the grammar node kind
    Unsupported {
        /// Tree-sitter node kind (e.g. `map_type`)
        kind: String,
    },
}

/// Where a type declaration should be looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTarget<'a> {
    /// Declared in the current package
    Local(&'a str),
    /// Declared in an imported package
    Qualified {
        /// Package qualifier
        package: &'a str,
        /// Type name
        name: &'a str,
    },
}

impl TypeShape {
    /// Display name: pointers and sequences show their element type.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Qualified { package, name } => format!("{package}.{name}"),
            Self::Pointer(inner) | Self::Sequence(inner) => inner.display_name(),
            Self::Unsupported { kind } => kind.clone(),
        }
    }

    /// The named type to resolve, if this shape reduces to one.
    #[must_use]
    pub fn target(&self) -> Option<TypeTarget<'_>> {
        match self {
            Self::Ident(name) => Some(TypeTarget::Local(name)),
            Self::Qualified { package, name } => Some(TypeTarget::Qualified { package, name }),
            Self::Pointer(inner) | Self::Sequence(inner) => inner.target(),
            Self::Unsupported { .. } => None,
        }
    }
}

/// One parameter or result slot of a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedValue {
    /// Display form of the type (`Config` for `*Config` and `[]Config`)
    pub display: String,
    /// Structural classification of the type
    pub shape: TypeShape,
    /// Type expression exactly as written
    pub text: String,
}

impl NamedValue {
    /// Build a value from its shape and source text.
    #[must_use]
    pub fn new(shape: TypeShape, text: impl Into<String>) -> Self {
        Self {
            display: shape.display_name(),
            shape,
            text: text.into(),
        }
    }
}
