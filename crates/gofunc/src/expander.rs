//! One-level dependency expansion.
//!
//! Turns the call names and signature types of a target function into
//! renderable snippets: declarations of called functions are located and
//! their own parameter and result types resolved, but their bodies are never
//! scanned for further calls.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::error::Result;
use crate::extractor::{extract_signature, is_predeclared_type};
use crate::locator::{ScanMode, locate_function, locate_struct};
use crate::parser::GoParser;
use crate::resolver::ModuleResolver;
use crate::types::{FunctionInfo, ImportEntry, NamedValue, TypeTarget, find_import};

/// A located struct: the directory searched and the type name.
type StructKey = (PathBuf, String);

/// Resolves names seen in one file against the module and its dependencies.
#[derive(Debug)]
pub struct Expander<'a> {
    parser: &'a mut GoParser,
    resolver: &'a ModuleResolver,
}

impl<'a> Expander<'a> {
    /// Create an expander sharing a parser and a resolver.
    pub fn new(parser: &'a mut GoParser, resolver: &'a ModuleResolver) -> Self {
        Self { parser, resolver }
    }

    /// Describe each called function.
    ///
    /// `dir` is the directory of the calling file and `imports` its import
    /// list. Qualified calls whose qualifier matches no import are skipped.
    /// A call whose declaration cannot be found is kept with empty
    /// parameter and result lists.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal conditions: an unreadable module
    /// cache location. Unparseable dependency files are skipped.
    pub fn expand_calls(
        &mut self,
        calls: &[String],
        dir: &Path,
        imports: &[ImportEntry],
    ) -> Result<Vec<FunctionInfo>> {
        let mut infos = Vec::with_capacity(calls.len());

        for call in calls {
            let (search_dir, member) = match call.split_once('.') {
                Some((qualifier, member)) => {
                    let Some(import) = find_import(qualifier, imports) else {
                        debug!(call = %call, "No import for qualifier, skipping call");
                        continue;
                    };
                    let resolved = self.resolver.resolve(&import.path)?;
                    let search_dir = resolved.unwrap_or_else(|| {
                        debug!(
                            import = %import.path,
                            "Import not resolvable, searching calling directory"
                        );
                        dir.to_path_buf()
                    });
                    (search_dir, member)
                }
                None => (dir.to_path_buf(), call.as_str()),
            };

            let located = locate_function(self.parser, &search_dir, member, ScanMode::Lenient)?;
            let Some(function) = located else {
                debug!(call = %call, dir = %search_dir.display(), "Called function not found");
                infos.push(FunctionInfo {
                    name: call.clone(),
                    params: Vec::new(),
                    returns: Vec::new(),
                });
                continue;
            };

            let (params, returns) = extract_signature(&function);
            let dependency_dir = function
                .file()
                .path()
                .parent()
                .map_or_else(|| search_dir.clone(), Path::to_path_buf);
            let dependency_imports = function.file().imports();
            let params = self.expand_types(&params, &dependency_dir, &dependency_imports)?;
            let returns = self.expand_types(&returns, &dependency_dir, &dependency_imports)?;

            trace!(call = %call, file = %function.file().path().display(), "Expanded call");
            infos.push(FunctionInfo {
                name: call.clone(),
                params,
                returns,
            });
        }

        Ok(infos)
    }

    /// Render each value as its struct declaration, or as the type text when
    /// no struct declaration can be found.
    ///
    /// A struct declaration is emitted once per call even when several
    /// values refer to it (`Config` and `*Config`); every value falling back
    /// to its type text keeps its own entry.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal resolver conditions.
    pub fn expand_types(
        &mut self,
        values: &[NamedValue],
        dir: &Path,
        imports: &[ImportEntry],
    ) -> Result<Vec<String>> {
        let mut emitted = IndexSet::new();
        let mut snippets = Vec::with_capacity(values.len());

        for value in values {
            match self.struct_source(value, dir, imports)? {
                Some((key, source)) => {
                    if emitted.insert(key) {
                        snippets.push(source);
                    } else {
                        trace!(ty = %value.display, "Struct already emitted");
                    }
                }
                None => snippets.push(value.text.clone()),
            }
        }

        Ok(snippets)
    }

    /// The struct behind `value`, keyed by the directory searched and its name.
    fn struct_source(
        &mut self,
        value: &NamedValue,
        dir: &Path,
        imports: &[ImportEntry],
    ) -> Result<Option<(StructKey, String)>> {
        let (search_dir, name) = match value.shape.target() {
            None => return Ok(None),
            Some(TypeTarget::Local(name)) => {
                if is_predeclared_type(name) {
                    return Ok(None);
                }
                (dir.to_path_buf(), name)
            }
            Some(TypeTarget::Qualified { package, name }) => {
                let Some(import) = find_import(package, imports) else {
                    debug!(ty = %value.display, "No import for type qualifier");
                    return Ok(None);
                };
                let search_dir = self
                    .resolver
                    .resolve(&import.path)?
                    .unwrap_or_else(|| dir.to_path_buf());
                (search_dir, name)
            }
        };

        let located = locate_struct(self.parser, &search_dir, name, ScanMode::Lenient)?;
        Ok(located.map(|found| ((search_dir, name.to_string()), found.source_text())))
    }
}
