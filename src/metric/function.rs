//! Plain evaluation functions a [`Metric`](super::Metric) can delegate to.
//!
//! Every function declares the keyword arguments it accepts. The dispatcher
//! intersects the caller's keywords with that set before each call, so callers
//! can pass a superset without knowing each backend's exact signature.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use super::Kwargs;
use super::from_file::{DefinitionCache, FileFormat};
use super::statistical::StatisticalFn;
use crate::error::{Error, Result};
use crate::synthetic::SyntheticFunction;

/// Keyword that carries the definition path for file-defined functions.
pub const FILE_PATH_KWARG: &str = "file_path";

/// Signature of a user-supplied evaluation function.
pub type CustomFn = dyn Fn(&[f64], &Kwargs) -> Result<f64> + Send + Sync;

/// The keyword names a function accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Accepts {
    /// Only the listed names.
    Named(BTreeSet<String>),
    /// Any keyword. Used by backends that forward keywords to a nested function.
    Any,
}

impl Accepts {
    /// Returns `true` if `key` is accepted.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Accepts::Named(names) => names.contains(key),
            Accepts::Any => true,
        }
    }

    fn named<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Accepts::Named(names.into_iter().map(str::to_string).collect())
    }
}

/// A linear function `w · x + b`.
#[derive(Clone, Debug, PartialEq)]
pub struct Linear {
    /// One weight per input.
    pub weights: Vec<f64>,
    /// The constant term.
    pub intercept: f64,
}

impl Linear {
    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.weights.len() {
            return Err(Error::DimensionMismatch {
                expected: self.weights.len(),
                got: x.len(),
            });
        }
        Ok(self.weights.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + self.intercept)
    }
}

/// The closed set of function backends.
#[derive(Clone)]
pub enum FunctionKind {
    /// A statistical comparison between `y_true` and `y_pred`.
    Statistical(StatisticalFn),
    /// A synthetic benchmark function of the feature vector.
    Synthetic(Arc<dyn SyntheticFunction>),
    /// A closed-form linear function of the feature vector.
    Linear(Linear),
    /// A function definition read from the JSON file named by `file_path`.
    FromJson,
    /// A function definition read from the YAML file named by `file_path`.
    FromYaml,
    /// A user-supplied closure.
    Custom(Arc<CustomFn>),
}

impl PartialEq for FunctionKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FunctionKind::Statistical(a), FunctionKind::Statistical(b)) => a == b,
            (FunctionKind::Synthetic(a), FunctionKind::Synthetic(b)) => {
                a.name() == b.name() && a.required_dimensionality() == b.required_dimensionality()
            }
            (FunctionKind::Linear(a), FunctionKind::Linear(b)) => a == b,
            (FunctionKind::FromJson, FunctionKind::FromJson)
            | (FunctionKind::FromYaml, FunctionKind::FromYaml) => true,
            (FunctionKind::Custom(a), FunctionKind::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// An evaluation function together with its declared keyword set.
///
/// Keywords bound with [`partial`](Self::partial) act as defaults that call-time
/// keywords override. The function keeps the underlying name, so partially
/// applied backends display the same as the plain function.
///
/// # Examples
///
/// ```
/// use trialwrap::metric::{Kwargs, MetricFunction};
///
/// let f = MetricFunction::custom("sum", ["scale"], |x, kw| {
///     let scale = kw.get("scale").and_then(|v| v.as_f64()).unwrap_or(1.0);
///     Ok(scale * x.iter().sum::<f64>())
/// });
/// assert!(f.accepts("scale"));
/// assert!(!f.accepts("unrelated"));
/// ```
#[derive(Clone, PartialEq)]
pub struct MetricFunction {
    name: String,
    accepts: Accepts,
    bound: Kwargs,
    kind: FunctionKind,
}

impl core::fmt::Debug for MetricFunction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetricFunction")
            .field("name", &self.name)
            .field("accepts", &self.accepts)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl MetricFunction {
    /// Wraps a statistical comparison function.
    #[must_use]
    pub fn statistical(f: StatisticalFn) -> Self {
        Self {
            name: f.name().to_string(),
            accepts: Accepts::named(f.params().iter().copied()),
            bound: Kwargs::new(),
            kind: FunctionKind::Statistical(f),
        }
    }

    /// Wraps a synthetic benchmark function. It takes no keywords.
    #[must_use]
    pub fn synthetic(f: Arc<dyn SyntheticFunction>) -> Self {
        Self {
            name: f.name().to_string(),
            accepts: Accepts::named([]),
            bound: Kwargs::new(),
            kind: FunctionKind::Synthetic(f),
        }
    }

    /// A linear function of the feature vector.
    #[must_use]
    pub fn linear(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            name: "linear".to_string(),
            accepts: Accepts::named([]),
            bound: Kwargs::new(),
            kind: FunctionKind::Linear(Linear { weights, intercept }),
        }
    }

    /// Reads a function definition from the JSON file given by the
    /// `file_path` keyword at evaluation time.
    #[must_use]
    pub fn from_json() -> Self {
        Self {
            name: "metric_from_json".to_string(),
            accepts: Accepts::Any,
            bound: Kwargs::new(),
            kind: FunctionKind::FromJson,
        }
    }

    /// Reads a function definition from the YAML file given by the
    /// `file_path` keyword at evaluation time.
    #[must_use]
    pub fn from_yaml() -> Self {
        Self {
            name: "metric_from_yaml".to_string(),
            accepts: Accepts::Any,
            bound: Kwargs::new(),
            kind: FunctionKind::FromYaml,
        }
    }

    /// Wraps a closure that accepts the listed keywords.
    pub fn custom<'a, F>(name: impl Into<String>, params: impl IntoIterator<Item = &'a str>, f: F) -> Self
    where
        F: Fn(&[f64], &Kwargs) -> Result<f64> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            accepts: Accepts::named(params),
            bound: Kwargs::new(),
            kind: FunctionKind::Custom(Arc::new(f)),
        }
    }

    /// Binds default keyword values.
    #[must_use]
    pub fn partial(mut self, kwargs: Kwargs) -> Self {
        self.bound.extend(kwargs);
        self
    }

    /// Returns the underlying function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the function kind.
    #[must_use]
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Returns the declared keyword set.
    #[must_use]
    pub fn accepted(&self) -> &Accepts {
        &self.accepts
    }

    /// Returns `true` if the function accepts the keyword `key`.
    #[must_use]
    pub fn accepts(&self, key: &str) -> bool {
        self.accepts.contains(key)
    }

    /// Returns the keywords bound with [`partial`](Self::partial).
    #[must_use]
    pub fn bound(&self) -> &Kwargs {
        &self.bound
    }

    /// Calls the function on `x` with the accepted subset of `kwargs`.
    ///
    /// # Errors
    ///
    /// Propagates the backend's error: a dimension mismatch, a missing or
    /// malformed keyword, or a definition file that cannot be read.
    pub fn call(&self, x: &[f64], kwargs: &Kwargs, definitions: &DefinitionCache) -> Result<f64> {
        let mut merged = self.bound.clone();
        merged.extend(
            kwargs
                .iter()
                .filter(|(k, _)| self.accepts(k))
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        match &self.kind {
            FunctionKind::Statistical(f) => f.compute(&merged),
            FunctionKind::Synthetic(f) => f.evaluate(x),
            FunctionKind::Linear(f) => f.evaluate(x),
            FunctionKind::FromJson => call_definition(x, merged, FileFormat::Json, definitions),
            FunctionKind::FromYaml => call_definition(x, merged, FileFormat::Yaml, definitions),
            FunctionKind::Custom(f) => f(x, &merged),
        }
    }
}

fn call_definition(
    x: &[f64],
    mut kwargs: Kwargs,
    format: FileFormat,
    definitions: &DefinitionCache,
) -> Result<f64> {
    let path = kwargs
        .remove(FILE_PATH_KWARG)
        .ok_or_else(|| Error::invalid_argument(FILE_PATH_KWARG, "required for file-defined metrics"))?;
    let path = path
        .as_str()
        .ok_or_else(|| Error::invalid_argument(FILE_PATH_KWARG, "must be a string"))?;
    let definition = definitions.load(Path::new(path), format)?;
    let mut merged = definition.defaults().clone();
    merged.extend(kwargs);
    definition.function().call(x, &merged, definitions)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn kwargs(pairs: &[(&str, serde_json::Value)]) -> Kwargs {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn unknown_keywords_are_dropped() {
        let f = MetricFunction::custom("echo_len", ["a"], |_, kw| Ok(kw.len() as f64));
        let cache = DefinitionCache::default();
        let kw = kwargs(&[("a", json!(1)), ("b", json!(2)), ("trial", json!(0))]);
        assert_eq!(f.call(&[], &kw, &cache).unwrap(), 1.0);
    }

    #[test]
    fn call_keywords_override_bound() {
        let f = MetricFunction::custom("scaled", ["scale"], |x, kw| {
            Ok(x[0] * kw["scale"].as_f64().unwrap_or(0.0))
        })
        .partial(kwargs(&[("scale", json!(2.0))]));
        let cache = DefinitionCache::default();
        assert_eq!(f.call(&[3.0], &Kwargs::new(), &cache).unwrap(), 6.0);
        let kw = kwargs(&[("scale", json!(10.0))]);
        assert_eq!(f.call(&[3.0], &kw, &cache).unwrap(), 30.0);
        assert_eq!(f.name(), "scaled");
    }

    #[test]
    fn linear_checks_dimension() {
        let f = MetricFunction::linear(vec![1.0, 2.0], 0.5);
        let cache = DefinitionCache::default();
        assert_eq!(f.call(&[1.0, 1.0], &Kwargs::new(), &cache).unwrap(), 3.5);
        assert!(matches!(
            f.call(&[1.0], &Kwargs::new(), &cache),
            Err(Error::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn file_backend_requires_path() {
        let cache = DefinitionCache::default();
        let err = MetricFunction::from_json()
            .call(&[1.0], &Kwargs::new(), &cache)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { ref name, .. } if name == FILE_PATH_KWARG));
    }

    #[test]
    fn equality() {
        let a = MetricFunction::statistical(StatisticalFn::MeanSquaredError);
        let b = MetricFunction::statistical(StatisticalFn::MeanSquaredError);
        assert_eq!(a, b);
        assert_ne!(a, MetricFunction::statistical(StatisticalFn::R2Score));
        let c = MetricFunction::custom("c", [], |_, _| Ok(0.0));
        assert_eq!(c, c.clone());
        assert_ne!(c, MetricFunction::custom("c", [], |_, _| Ok(0.0)));
    }
}
