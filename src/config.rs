//! Experiment configuration files.
//!
//! ```yaml
//! optimization_options:
//!   experiment:
//!     name: palm
//! model_options:
//!   dz: 0.1
//! parameters:
//!   mean_lai:
//!     type: range
//!     bounds: [2.0, 6.0]
//!   plot_area:
//!     type: fixed
//!     value: 400.0
//! parameter_constraints:
//!   - "house_ratio <= 0.9"
//! metric:
//!   metric_name: RMSE
//! ```
//!
//! Loading normalizes the document: every parameter gains a `name` field
//! equal to its key, and the parameters are also exposed as an ordered list
//! in [`ExperimentConfig::search_space_parameters`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::metric::MetricConfig;

/// A loaded and normalized experiment configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Options for the optimization driver, passed through untouched.
    #[serde(default)]
    pub optimization_options: Mapping,
    /// Options written to every trial's `config.yml`.
    #[serde(default)]
    pub model_options: Value,
    /// Parameter definitions by name, in file order.
    #[serde(default)]
    pub parameters: Mapping,
    /// Parameter constraint expressions.
    #[serde(default)]
    pub parameter_constraints: Vec<String>,
    /// How trials are scored.
    #[serde(default)]
    pub metric: MetricConfig,
    /// `parameters` as a list, each entry carrying its `name`.
    #[serde(default)]
    pub search_space_parameters: Vec<Value>,
    /// Copy of `parameter_constraints`.
    #[serde(default)]
    pub search_space_parameter_constraints: Vec<String>,
}

impl ExperimentConfig {
    /// Parses and normalizes a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the YAML is malformed or a parameter is
    /// not a mapping.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.normalize()
    }

    /// Reads, parses and normalizes a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or the errors of
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&source)?;
        trace_info!(path = %path.display(), parameters = config.parameters.len(), "experiment config loaded");
        Ok(config)
    }

    fn normalize(mut self) -> Result<Self> {
        for (key, definition) in &mut self.parameters {
            let name = key
                .as_str()
                .ok_or_else(|| Error::Config(format!("parameter key {key:?} is not a string")))?;
            let Value::Mapping(fields) = definition else {
                return Err(Error::Config(format!("parameter '{name}' must be a mapping")));
            };
            fields.insert(Value::from("name"), Value::from(name));
        }
        self.search_space_parameters = self.parameters.values().cloned().collect();
        self.search_space_parameter_constraints = self.parameter_constraints.clone();
        Ok(self)
    }

    /// Parameter names in file order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().filter_map(Value::as_str)
    }
}
