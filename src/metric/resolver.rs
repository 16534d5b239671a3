//! Resolving declarative metric configuration into metric factories.
//!
//! A [`MetricConfig`] is matched against three registries, first match wins:
//!
//! 1. `metric_name` with `sklearn_metric: true`: the statistical registry.
//! 2. `metric_name` alone: the named metrics (`MSE`, `RMSE`, `R2`, the file
//!    loaders, and anything added with [`BackendResolver::register`]).
//! 3. `synthetic_metric`: the synthetic catalogs, local before platform before
//!    third-party.
//!
//! A configuration that sets none of these resolves to `None`, and the caller
//! supplies a backend directly.
//!
//! # Examples
//!
//! ```
//! use trialwrap::metric::{BackendResolver, MetricConfig, MetricOverrides};
//!
//! let config: MetricConfig = serde_yaml::from_str("metric_name: RMSE").unwrap();
//! let factory = BackendResolver::standard().resolve(&config).unwrap().unwrap();
//! let metric = factory.build(MetricOverrides::new().name("canopy_rmse")).unwrap();
//! assert_eq!(metric.name(), "canopy_rmse");
//! assert_eq!(metric.metric_func_kwargs()["squared"], false);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Backend, FileFormat, Kwargs, Metric, MetricArgs, MetricFunction, NoiseSd, StatisticalFn};
use crate::error::{Error, Result};
use crate::synthetic::{SyntheticCatalog, SyntheticSource};
use crate::wrapper::Wrapper;

/// The metric block of an experiment configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// A named metric, or a statistical function when `sklearn_metric` is set.
    pub metric_name: Option<String>,
    /// Look `metric_name` up in the statistical registry.
    pub sklearn_metric: bool,
    /// A synthetic benchmark function name.
    pub synthetic_metric: Option<String>,
}

/// How a factory's backend was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// A statistical-registry function.
    Statistical,
    /// A synthetic function, with the catalog it was found in.
    Synthetic(SyntheticSource),
    /// A function read from a definition file at evaluation time.
    File(FileFormat),
    /// A backend registered by the caller.
    Custom,
}

/// Constructor overrides applied by [`MetricFactory::build`].
///
/// Every field that is set replaces the factory default wholesale.
#[derive(Clone, Default)]
#[must_use]
pub struct MetricOverrides {
    name: Option<String>,
    param_names: Option<Vec<String>>,
    noise_sd: Option<NoiseSd>,
    metric_func_kwargs: Option<Kwargs>,
    wrapper: Option<Arc<dyn Wrapper>>,
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    seed: Option<u64>,
}

impl MetricOverrides {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the feature parameters.
    pub fn param_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the noise level.
    pub fn noise_sd(mut self, noise_sd: impl Into<NoiseSd>) -> Self {
        self.noise_sd = Some(noise_sd.into());
        self
    }

    /// Overrides the backend keywords.
    pub fn metric_func_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.metric_func_kwargs = Some(kwargs);
        self
    }

    /// Attaches a wrapper.
    pub fn wrapper(mut self, wrapper: Arc<dyn Wrapper>) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    /// Overrides the properties.
    pub fn properties(mut self, properties: serde_json::Map<String, serde_json::Value>) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Seeds the noise generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn apply(self, mut args: MetricArgs) -> MetricArgs {
        if let Some(name) = self.name {
            args.name = Some(name);
        }
        if let Some(param_names) = self.param_names {
            args.param_names = param_names;
        }
        if let Some(noise_sd) = self.noise_sd {
            args.noise_sd = noise_sd;
        }
        if let Some(kwargs) = self.metric_func_kwargs {
            args.metric_func_kwargs = kwargs;
        }
        if let Some(wrapper) = self.wrapper {
            args.wrapper = Some(wrapper);
        }
        if let Some(properties) = self.properties {
            args.properties = properties;
        }
        if let Some(seed) = self.seed {
            args.seed = Some(seed);
        }
        args
    }
}

/// Builds metrics of one resolved backend.
#[derive(Clone, Debug)]
pub struct MetricFactory {
    kind: BackendKind,
    defaults: MetricArgs,
}

impl MetricFactory {
    /// A factory producing metrics from `defaults`.
    #[must_use]
    pub fn new(kind: BackendKind, defaults: MetricArgs) -> Self {
        Self { kind, defaults }
    }

    fn function(kind: BackendKind, f: MetricFunction) -> Self {
        Self::new(kind, MetricArgs::new(Backend::Function(f)))
    }

    fn with_kwarg(mut self, key: &str, value: serde_json::Value) -> Self {
        self.defaults.metric_func_kwargs.insert(key.to_string(), value);
        self
    }

    /// How the backend was resolved.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The constructor arguments used when nothing is overridden.
    #[must_use]
    pub fn defaults(&self) -> &MetricArgs {
        &self.defaults
    }

    /// Builds a metric, `overrides` taking precedence over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNoise`] if the resulting noise level is invalid.
    pub fn build(&self, overrides: MetricOverrides) -> Result<Metric> {
        Metric::from_args(overrides.apply(self.defaults.clone()))
    }
}

/// The metric-name and synthetic-function registries.
#[derive(Clone)]
pub struct BackendResolver {
    named: BTreeMap<String, MetricFactory>,
    synthetic: SyntheticCatalog,
}

impl Default for BackendResolver {
    fn default() -> Self {
        Self::standard()
    }
}

/// Constructors of the built-in named metrics.
const NAMED_METRICS: [(&str, fn() -> MetricFactory); 8] = [
    ("MSE", mse),
    ("MeanSquaredError", mse),
    ("RMSE", rmse),
    ("RootMeanSquaredError", rmse),
    ("R2", r2),
    ("RSquared", r2),
    ("MetricFromJSON", metric_from_json),
    ("MetricFromYAML", metric_from_yaml),
];

fn mse() -> MetricFactory {
    MetricFactory::function(
        BackendKind::Statistical,
        MetricFunction::statistical(StatisticalFn::MeanSquaredError),
    )
}

fn rmse() -> MetricFactory {
    mse().with_kwarg("squared", serde_json::Value::Bool(false))
}

fn r2() -> MetricFactory {
    MetricFactory::function(
        BackendKind::Statistical,
        MetricFunction::statistical(StatisticalFn::R2Score),
    )
}

fn metric_from_json() -> MetricFactory {
    MetricFactory::function(BackendKind::File(FileFormat::Json), MetricFunction::from_json())
}

fn metric_from_yaml() -> MetricFactory {
    MetricFactory::function(BackendKind::File(FileFormat::Yaml), MetricFunction::from_yaml())
}

impl BackendResolver {
    /// The built-in named metrics and the standard synthetic catalogs.
    #[must_use]
    pub fn standard() -> Self {
        Self::with_catalog(SyntheticCatalog::standard())
    }

    /// The built-in named metrics and a custom synthetic catalog.
    #[must_use]
    pub fn with_catalog(synthetic: SyntheticCatalog) -> Self {
        let named = NAMED_METRICS
            .iter()
            .map(|(name, ctor)| ((*name).to_string(), ctor()))
            .collect();
        Self { named, synthetic }
    }

    /// Registers a named metric, replacing any previous one of that name.
    pub fn register(&mut self, name: impl Into<String>, factory: MetricFactory) {
        self.named.insert(name.into(), factory);
    }

    /// The synthetic catalogs searched for `synthetic_metric`.
    #[must_use]
    pub fn catalog(&self) -> &SyntheticCatalog {
        &self.synthetic
    }

    /// Registered metric names.
    pub fn named_metrics(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    /// Resolves `config` into a factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotFound`] if the configuration names a backend
    /// that the selected registry does not have.
    pub fn resolve(&self, config: &MetricConfig) -> Result<Option<MetricFactory>> {
        if let Some(name) = config.metric_name.as_deref() {
            let factory = if config.sklearn_metric {
                Self::statistical(name)?
            } else {
                self.named(name)?
            };
            trace_debug!(name, kind = ?factory.kind(), "metric resolved by name");
            return Ok(Some(factory));
        }
        if let Some(name) = config.synthetic_metric.as_deref() {
            return self.synthetic(name).map(Some);
        }
        Ok(None)
    }

    /// A factory for a statistical-registry function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotFound`] if `name` is not registered.
    pub fn statistical(name: &str) -> Result<MetricFactory> {
        let f = StatisticalFn::from_name(name)?;
        Ok(MetricFactory::function(
            BackendKind::Statistical,
            MetricFunction::statistical(f),
        ))
    }

    /// A factory for a named metric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotFound`] if `name` is not registered.
    pub fn named(&self, name: &str) -> Result<MetricFactory> {
        self.named
            .get(name)
            .cloned()
            .ok_or_else(|| Error::BackendNotFound {
                kind: "metric",
                name: name.to_string(),
            })
    }

    /// A factory for a synthetic function, searched in catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotFound`] if no catalog has `name`.
    pub fn synthetic(&self, name: &str) -> Result<MetricFactory> {
        let resolved = self.synthetic.resolve(name)?;
        Ok(MetricFactory::function(
            BackendKind::Synthetic(resolved.source),
            MetricFunction::synthetic(resolved.function),
        ))
    }

    /// Resolves `config` and builds the metric in one step.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`resolve`](Self::resolve) and
    /// [`MetricFactory::build`].
    pub fn build_metric(&self, config: &MetricConfig, overrides: MetricOverrides) -> Result<Option<Metric>> {
        self.resolve(config)?
            .map(|factory| factory.build(overrides))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::CatalogEntry;

    fn config(metric_name: Option<&str>, sklearn_metric: bool, synthetic: Option<&str>) -> MetricConfig {
        MetricConfig {
            metric_name: metric_name.map(str::to_string),
            sklearn_metric,
            synthetic_metric: synthetic.map(str::to_string),
        }
    }

    #[test]
    fn statistical_flag_selects_statistical_registry() {
        let resolver = BackendResolver::standard();
        let factory = resolver
            .resolve(&config(Some("r2_score"), true, None))
            .unwrap()
            .unwrap();
        assert_eq!(factory.kind(), BackendKind::Statistical);
        // Named metrics are not statistical function names.
        assert!(matches!(
            resolver.resolve(&config(Some("RMSE"), true, None)),
            Err(Error::BackendNotFound { kind: "statistical", .. })
        ));
    }

    #[test]
    fn named_metric_lookup() {
        let resolver = BackendResolver::standard();
        let rmse = resolver.resolve(&config(Some("RootMeanSquaredError"), false, None)).unwrap().unwrap();
        assert_eq!(rmse.defaults().metric_func_kwargs["squared"], false);
        assert!(matches!(
            resolver.resolve(&config(Some("mean_squared_error"), false, None)),
            Err(Error::BackendNotFound { kind: "metric", .. })
        ));
        let json = resolver.named("MetricFromJSON").unwrap();
        assert_eq!(json.kind(), BackendKind::File(FileFormat::Json));
    }

    #[test]
    fn metric_name_wins_over_synthetic() {
        let resolver = BackendResolver::standard();
        let factory = resolver
            .resolve(&config(Some("MSE"), false, Some("Branin")))
            .unwrap()
            .unwrap();
        assert_eq!(factory.kind(), BackendKind::Statistical);
    }

    #[test]
    fn synthetic_resolution_reports_source() {
        let resolver = BackendResolver::standard();
        let ackley = resolver.synthetic("Ackley").unwrap();
        assert_eq!(ackley.kind(), BackendKind::Synthetic(SyntheticSource::ThirdParty));
        let palm = resolver.synthetic("FakePalm").unwrap();
        assert_eq!(palm.kind(), BackendKind::Synthetic(SyntheticSource::Local));
        assert!(matches!(
            resolver.synthetic("Nowhere"),
            Err(Error::BackendNotFound { kind: "synthetic", .. })
        ));
    }

    #[test]
    fn local_registration_shadows_platform() {
        let mut catalog = SyntheticCatalog::standard();
        catalog.register(
            SyntheticSource::Local,
            "Branin",
            CatalogEntry::Benchmark(|| Box::new(crate::synthetic::FakePalm::new())),
        );
        let resolver = BackendResolver::with_catalog(catalog);
        let factory = resolver.synthetic("Branin").unwrap();
        assert_eq!(factory.kind(), BackendKind::Synthetic(SyntheticSource::Local));
    }

    #[test]
    fn empty_config_resolves_to_none() {
        let resolver = BackendResolver::standard();
        assert!(resolver.resolve(&MetricConfig::default()).unwrap().is_none());
        assert!(resolver
            .build_metric(&MetricConfig::default(), MetricOverrides::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn overrides_replace_defaults_wholesale() {
        let resolver = BackendResolver::standard();
        let metric = resolver
            .named("RMSE")
            .unwrap()
            .build(MetricOverrides::new().metric_func_kwargs(Kwargs::new()).noise_sd(0.2))
            .unwrap();
        assert!(metric.metric_func_kwargs().is_empty());
        assert_eq!(metric.noise_sd(), NoiseSd::Known(0.2));
        assert_eq!(metric.name(), "mean_squared_error");
    }

    #[test]
    fn registered_metric_is_resolvable() {
        let mut resolver = BackendResolver::standard();
        let f = MetricFunction::custom("constant", [], |_, _| Ok(1.0));
        resolver.register("Constant", MetricFactory::new(BackendKind::Custom, MetricArgs::new(f)));
        assert!(resolver.named_metrics().any(|n| n == "Constant"));
        let factory = resolver.resolve(&config(Some("Constant"), false, None)).unwrap().unwrap();
        assert_eq!(factory.kind(), BackendKind::Custom);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let parsed: MetricConfig = serde_yaml::from_str("synthetic_metric: Hartmann6\n").unwrap();
        assert_eq!(parsed, config(None, false, Some("Hartmann6")));
    }
}
