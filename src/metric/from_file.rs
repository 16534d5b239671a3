//! Function definitions read from JSON or YAML files.
//!
//! A definition names the function body and may carry default keywords:
//!
//! ```yaml
//! name: canopy_rmse
//! function:
//!   kind: statistical
//!   name: mean_squared_error
//! kwargs:
//!   squared: false
//! ```
//!
//! The same document in JSON is equivalent. Bodies are one of
//! `statistical` (by registry name), `synthetic` (resolved through the
//! standard catalogs), or `linear` (`weights` and an optional `intercept`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::Kwargs;
use super::function::MetricFunction;
use super::statistical::StatisticalFn;
use crate::error::{Error, Result};
use crate::synthetic::SyntheticCatalog;

/// The serialization format of a definition file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// JSON.
    Json,
    /// YAML.
    Yaml,
}

/// The body of a file-defined function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FunctionBody {
    /// A statistical-registry function by name.
    Statistical {
        /// Registry name, e.g. `mean_squared_error`.
        name: String,
    },
    /// A synthetic benchmark function by catalog name.
    Synthetic {
        /// Catalog name, e.g. `Branin`.
        name: String,
    },
    /// `weights · x + intercept`.
    Linear {
        /// One weight per input.
        weights: Vec<f64>,
        /// The constant term.
        #[serde(default)]
        intercept: f64,
    },
}

/// A function definition as written in a file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
    /// What to call.
    pub function: FunctionBody,
    /// Default keywords, overridden by call-time keywords.
    #[serde(default)]
    pub kwargs: Kwargs,
}

impl FunctionDefinition {
    /// Parses a definition from a string in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is malformed.
    pub fn parse(source: &str, format: FileFormat) -> Result<Self> {
        let definition = match format {
            FileFormat::Json => serde_json::from_str(source)?,
            FileFormat::Yaml => serde_yaml::from_str(source)?,
        };
        Ok(definition)
    }

    /// Reads and parses a definition file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`]
    /// if it is malformed.
    pub fn from_file(path: &Path, format: FileFormat) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source, format)
    }

    /// Turns the definition into a callable function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotFound`] if the body names an unknown function.
    pub fn compile(self) -> Result<CompiledDefinition> {
        let function = match self.function {
            FunctionBody::Statistical { name } => {
                MetricFunction::statistical(StatisticalFn::from_name(&name)?)
            }
            FunctionBody::Synthetic { name } => {
                let resolved = SyntheticCatalog::standard().resolve(&name)?;
                MetricFunction::synthetic(resolved.function)
            }
            FunctionBody::Linear { weights, intercept } => {
                MetricFunction::linear(weights, intercept)
            }
        };
        Ok(CompiledDefinition {
            name: self.name,
            function,
            defaults: self.kwargs,
        })
    }
}

/// A parsed and resolved definition, ready to call.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledDefinition {
    name: Option<String>,
    function: MetricFunction,
    defaults: Kwargs,
}

impl CompiledDefinition {
    /// The display name from the file, falling back to the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.function.name())
    }

    /// The callable function.
    #[must_use]
    pub fn function(&self) -> &MetricFunction {
        &self.function
    }

    /// Default keywords from the file.
    #[must_use]
    pub fn defaults(&self) -> &Kwargs {
        &self.defaults
    }
}

/// Compiled definitions keyed by file path.
///
/// Each [`Metric`](super::Metric) owns one cache, so a file is read once per
/// path for the lifetime of the metric. Clones of a metric start empty.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: Mutex<HashMap<PathBuf, Arc<CompiledDefinition>>>,
}

impl DefinitionCache {
    /// Returns the cached definition for `path`, reading and compiling it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns the error from [`FunctionDefinition::from_file`] or
    /// [`FunctionDefinition::compile`]. Failures are not cached.
    pub fn load(&self, path: &Path, format: FileFormat) -> Result<Arc<CompiledDefinition>> {
        if let Some(hit) = self.entries.lock().get(path) {
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(
            FunctionDefinition::from_file(path, format)
                .and_then(FunctionDefinition::compile)
                .map_err(|e| match e {
                    Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
                    other => other,
                })?,
        );
        trace_debug!(path = %path.display(), name = compiled.name(), "function definition loaded");
        self.entries
            .lock()
            .insert(path.to_path_buf(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached definitions.
    #[must_use]
    pub fn cached_definitions(&self) -> usize {
        self.entries.lock().len()
    }

    /// Drops every cached definition.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_yaml_statistical() {
        let def = FunctionDefinition::parse(
            "function:\n  kind: statistical\n  name: mean_squared_error\nkwargs:\n  squared: false\n",
            FileFormat::Yaml,
        )
        .unwrap();
        assert_eq!(
            def.function,
            FunctionBody::Statistical {
                name: "mean_squared_error".into()
            }
        );
        assert_eq!(def.kwargs["squared"], serde_json::json!(false));
    }

    #[test]
    fn parse_json_linear_defaults_intercept() {
        let def = FunctionDefinition::parse(
            r#"{"name": "lin", "function": {"kind": "linear", "weights": [1.0, 2.0]}}"#,
            FileFormat::Json,
        )
        .unwrap();
        let compiled = def.compile().unwrap();
        assert_eq!(compiled.name(), "lin");
        assert_eq!(
            compiled
                .function()
                .call(&[1.0, 1.0], &Kwargs::new(), &DefinitionCache::default())
                .unwrap(),
            3.0
        );
    }

    #[test]
    fn unknown_body_name_fails_on_compile() {
        let def = FunctionDefinition {
            name: None,
            function: FunctionBody::Synthetic {
                name: "Nope".into(),
            },
            kwargs: Kwargs::new(),
        };
        assert!(matches!(def.compile(), Err(Error::BackendNotFound { .. })));
    }

    #[test]
    fn malformed_document_is_config_error() {
        assert!(matches!(
            FunctionDefinition::parse("function: [", FileFormat::Yaml),
            Err(Error::Config(_))
        ));
    }
}
