//! Output rendering for extracted bundles.
//!
//! Bundles are rendered through a Tera template. The built-in template lays
//! out the module, package, function source, parameter and result snippets
//! and the called functions; a user template receives the same variables:
//!
//! | Variable  | Type                                            |
//! |-----------|-------------------------------------------------|
//! | `module`  | string                                          |
//! | `package` | string                                          |
//! | `code`    | string                                          |
//! | `params`  | list of strings                                 |
//! | `returns` | list of strings                                 |
//! | `funcs`   | list of `{ name, params, returns }`             |

use std::path::Path;

use tera::{Context, Tera};
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::types::FunctionBundle;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = r"
Module of the project containing the function: {{ module }}
Package of the function: {{ package }}
Function to write unit tests for:
{{ code }}
Parameter types of the function:
{% for param in params %}
{{ param }}{% endfor %}
Return types of the function:
{% for ret in returns %}
{{ ret }}{% endfor %}
Functions called by the function, with their parameter and return types:
{% for func in funcs %}
Function: {{ func.name }}
Parameters: {% for param in func.params %}{{ param }}{% endfor %}
Returns: {% for ret in func.returns %}{{ ret }}{% endfor %}
{% endfor %}
";

/// Renders bundles with a fixed template.
#[derive(Debug, Clone)]
pub struct Renderer {
    template: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl Renderer {
    /// Create a renderer from template source.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Create a renderer from a template file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(template = %path.display(), "Loading template");
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    /// The configured template, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if a configured template file
    /// cannot be read.
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.template {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Render a bundle as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`](crate::Error::Template) if the template does
    /// not parse or refers to unknown variables.
    pub fn render(&self, bundle: &FunctionBundle) -> Result<String> {
        let context = Context::from_serialize(bundle)?;
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        Ok(tera.render_str(&self.template, &context)?)
    }
}

/// Render a bundle as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
pub fn render_json(bundle: &FunctionBundle) -> Result<String> {
    Ok(serde_json::to_string_pretty(bundle)?)
}
