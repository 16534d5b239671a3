//! Metric evaluation: scoring the arms of a completed trial.
//!
//! A [`Metric`] owns exactly one [`Backend`]. A plain [`MetricFunction`] is
//! called once per arm on the feature vector built from
//! [`param_names`](MetricArgs::param_names); a nested [`Metric`] receives the
//! whole trial and decides for itself.
//!
//! # Keyword flow
//!
//! Keywords reach a function backend from three places, later ones winning:
//!
//! 1. the metric's `metric_func_kwargs`,
//! 2. the caller's [`FetchOptions::kwargs`],
//! 3. the attached [`Wrapper`]'s `fetch_trial_data` output.
//!
//! Each function only sees the keywords it declares. The rest are dropped
//! silently.
//!
//! # Examples
//!
//! ```
//! use trialwrap::metric::{Backend, FetchOptions, Metric, MetricFunction};
//! use trialwrap::{Arm, Trial};
//!
//! let metric = Metric::builder(Backend::Function(MetricFunction::linear(vec![2.0], 1.0)))
//!     .name("double_plus_one")
//!     .param_names(["x"])
//!     .build()
//!     .unwrap();
//!
//! let trial = Trial::new(0).with_arm(Arm::new("0_0").with_param("x", 3.0));
//! let data = metric.fetch_trial_data(&trial, &FetchOptions::default()).unwrap();
//! assert_eq!(data.mean("0_0"), Some(7.0));
//! ```

mod from_file;
mod function;
pub mod resolver;
mod statistical;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub use from_file::{CompiledDefinition, DefinitionCache, FileFormat, FunctionBody, FunctionDefinition};
pub use function::{Accepts, CustomFn, FILE_PATH_KWARG, FunctionKind, Linear, MetricFunction};
pub use resolver::{BackendKind, BackendResolver, MetricConfig, MetricFactory, MetricOverrides};
pub use statistical::StatisticalFn;

use crate::error::{Error, Result};
use crate::trial::{Arm, Trial};
use crate::wrapper::Wrapper;

/// Keyword arguments passed to evaluation backends.
pub type Kwargs = BTreeMap<String, serde_json::Value>;

/// Keyword a wrapper may not override: the trial is always passed explicitly.
pub const TRIAL_KWARG: &str = "trial";

/// The observation noise of a metric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoiseSd {
    /// A known standard deviation, `>= 0`.
    Known(f64),
    /// Noise level unspecified. Reported as a NaN standard error.
    Unknown,
}

impl Default for NoiseSd {
    fn default() -> Self {
        NoiseSd::Known(0.0)
    }
}

impl From<f64> for NoiseSd {
    /// NaN maps to [`NoiseSd::Unknown`].
    fn from(value: f64) -> Self {
        if value.is_nan() {
            NoiseSd::Unknown
        } else {
            NoiseSd::Known(value)
        }
    }
}

impl NoiseSd {
    fn validate(self) -> Result<Self> {
        match self {
            NoiseSd::Known(s) if !s.is_finite() || s < 0.0 => Err(Error::InvalidNoise(s)),
            other => Ok(other),
        }
    }
}

impl core::fmt::Display for NoiseSd {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NoiseSd::Known(s) => write!(f, "{s}"),
            NoiseSd::Unknown => f.write_str("nan"),
        }
    }
}

/// What a metric delegates evaluation to.
#[derive(Clone, Debug, PartialEq)]
pub enum Backend {
    /// A plain function, called once per arm.
    Function(MetricFunction),
    /// A nested metric, handed the whole trial.
    Metric(Box<Metric>),
}

impl Backend {
    /// The human-readable backend name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Backend::Function(f) => f.name(),
            Backend::Metric(m) => m.name(),
        }
    }

    fn accepts(&self, key: &str) -> bool {
        match self {
            Backend::Function(f) => f.accepts(key),
            Backend::Metric(m) => m.accepts(key),
        }
    }
}

impl From<MetricFunction> for Backend {
    fn from(f: MetricFunction) -> Self {
        Backend::Function(f)
    }
}

impl From<Metric> for Backend {
    fn from(m: Metric) -> Self {
        Backend::Metric(Box::new(m))
    }
}

/// The constructor arguments of a [`Metric`].
///
/// [`Metric::args`] returns these, and [`Metric::from_args`] rebuilds an
/// equal metric from them.
#[derive(Clone)]
pub struct MetricArgs {
    /// The metric name. Defaults to the backend name.
    pub name: Option<String>,
    /// Parameters forming the feature vector, in order.
    pub param_names: Vec<String>,
    /// Observation noise.
    pub noise_sd: NoiseSd,
    /// Keywords passed to the backend on every call.
    pub metric_func_kwargs: Kwargs,
    /// The evaluation backend.
    pub backend: Backend,
    /// Collaborator consulted before every fetch.
    pub wrapper: Option<Arc<dyn Wrapper>>,
    /// Free-form properties carried along for the driver.
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Seed for the noise generator.
    pub seed: Option<u64>,
}

impl MetricArgs {
    /// Arguments with the given backend and every other field empty.
    #[must_use]
    pub fn new(backend: impl Into<Backend>) -> Self {
        Self {
            name: None,
            param_names: Vec::new(),
            noise_sd: NoiseSd::default(),
            metric_func_kwargs: Kwargs::new(),
            backend: backend.into(),
            wrapper: None,
            properties: serde_json::Map::new(),
            seed: None,
        }
    }
}

impl core::fmt::Debug for MetricArgs {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetricArgs")
            .field("name", &self.name)
            .field("param_names", &self.param_names)
            .field("noise_sd", &self.noise_sd)
            .field("metric_func_kwargs", &self.metric_func_kwargs)
            .field("backend", &self.backend)
            .field("wrapper", &self.wrapper.as_ref().map(|w| w.name()))
            .field("properties", &self.properties)
            .field("seed", &self.seed)
            .finish()
    }
}

impl PartialEq for MetricArgs {
    fn eq(&self, other: &Self) -> bool {
        let same_wrapper = match (&self.wrapper, &other.wrapper) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.name == other.name
            && self.param_names == other.param_names
            && self.noise_sd == other.noise_sd
            && self.metric_func_kwargs == other.metric_func_kwargs
            && self.backend == other.backend
            && same_wrapper
            && self.properties == other.properties
            && self.seed == other.seed
    }
}

/// Options for [`Metric::fetch_trial_data`].
#[derive(Clone, Debug, PartialEq)]
pub struct FetchOptions {
    /// Add noise to each observation. `false` disables noise regardless of
    /// the configured level.
    pub noisy: bool,
    /// Extra keywords forwarded to the backend.
    pub kwargs: Kwargs,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            noisy: true,
            kwargs: Kwargs::new(),
        }
    }
}

impl FetchOptions {
    /// Options without noise.
    #[must_use]
    pub fn noiseless() -> Self {
        Self {
            noisy: false,
            ..Self::default()
        }
    }

    /// Adds one keyword.
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

/// One scored arm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// The arm that was scored.
    pub arm_name: String,
    /// The metric that scored it.
    pub metric_name: String,
    /// The observed value.
    pub mean: f64,
    /// Standard error of `mean`. NaN when the noise level is unknown.
    pub sem: f64,
    /// The trial the arm belongs to.
    pub trial_index: u64,
}

/// The observations produced by one fetch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    records: Vec<Observation>,
}

impl Data {
    /// Wraps a list of observations.
    #[must_use]
    pub fn new(records: Vec<Observation>) -> Self {
        Self { records }
    }

    /// The observations in arm order.
    #[must_use]
    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    /// Consumes the data and returns the observations.
    #[must_use]
    pub fn into_records(self) -> Vec<Observation> {
        self.records
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if there are no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The mean observed for `arm_name`, if scored.
    #[must_use]
    pub fn mean(&self, arm_name: &str) -> Option<f64> {
        self.records
            .iter()
            .find(|r| r.arm_name == arm_name)
            .map(|r| r.mean)
    }

    /// Appends the observations of another fetch.
    pub fn extend(&mut self, other: Data) {
        self.records.extend(other.records);
    }
}

/// A named, configured scoring rule producing one observation per arm.
///
/// Metrics are immutable. [`Clone`] rebuilds the metric from its own
/// [`MetricArgs`], so the clone compares equal but has a fresh noise
/// generator and an empty definition cache.
pub struct Metric {
    name: String,
    args: MetricArgs,
    rng: Mutex<fastrand::Rng>,
    definitions: DefinitionCache,
}

impl Metric {
    /// Starts building a metric around `backend`.
    #[must_use]
    pub fn builder(backend: impl Into<Backend>) -> MetricBuilder {
        MetricBuilder {
            args: MetricArgs::new(backend),
        }
    }

    /// Builds a metric from its constructor arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNoise`] if `noise_sd` is negative or not finite.
    pub fn from_args(mut args: MetricArgs) -> Result<Self> {
        args.noise_sd = args.noise_sd.validate()?;
        Ok(Self::assemble(args))
    }

    fn assemble(args: MetricArgs) -> Self {
        let name = args
            .name
            .clone()
            .unwrap_or_else(|| args.backend.name().to_string());
        let rng = args
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self {
            name,
            args,
            rng: Mutex::new(rng),
            definitions: DefinitionCache::default(),
        }
    }

    /// The metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The constructor arguments that reproduce this metric.
    #[must_use]
    pub fn args(&self) -> &MetricArgs {
        &self.args
    }

    /// The evaluation backend.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.args.backend
    }

    /// Parameters forming the feature vector, in order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.args.param_names
    }

    /// The configured noise level.
    #[must_use]
    pub fn noise_sd(&self) -> NoiseSd {
        self.args.noise_sd
    }

    /// Keywords passed to the backend on every call.
    #[must_use]
    pub fn metric_func_kwargs(&self) -> &Kwargs {
        &self.args.metric_func_kwargs
    }

    /// Free-form properties.
    #[must_use]
    pub fn properties(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.args.properties
    }

    /// The file definitions this metric has loaded so far.
    #[must_use]
    pub fn definitions(&self) -> &DefinitionCache {
        &self.definitions
    }

    /// Metrics here only score trials that have finished externally.
    #[must_use]
    pub fn is_available_while_running(&self) -> bool {
        false
    }

    /// Returns `true` if a fetch would forward the keyword `key`.
    ///
    /// A metric with a wrapper accepts everything, since the wrapper sees the
    /// caller's keywords before the backend does.
    #[must_use]
    pub fn accepts(&self, key: &str) -> bool {
        self.args.wrapper.is_some() || self.args.backend.accepts(key)
    }

    /// The subset of `kwargs` this metric accepts.
    #[must_use]
    pub fn accepted_kwargs(&self, kwargs: &Kwargs) -> Kwargs {
        kwargs
            .iter()
            .filter(|(k, _)| self.accepts(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Scores every arm of `trial`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyTrial`] if the trial has no arms.
    /// - [`Error::Evaluation`] if the backend fails on any arm. No partial
    ///   data is returned.
    /// - Any error returned by the attached wrapper.
    pub fn fetch_trial_data(&self, trial: &Trial, options: &FetchOptions) -> Result<Data> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("fetch_trial_data", metric = %self.name, trial = trial.index()).entered();

        if trial.arms().is_empty() {
            return Err(Error::EmptyTrial(trial.index()));
        }

        let mut kwargs = options.kwargs.clone();
        if let Some(wrapper) = &self.args.wrapper {
            let mut injected = wrapper.fetch_trial_data(trial, &kwargs)?;
            if injected.remove(TRIAL_KWARG).is_some() {
                trace_debug!(wrapper = wrapper.name(), "ignored trial keyword from wrapper");
            }
            kwargs.extend(injected);
        }

        match &self.args.backend {
            Backend::Metric(inner) => {
                let forwarded = FetchOptions {
                    noisy: options.noisy,
                    kwargs: inner.accepted_kwargs(&kwargs),
                };
                inner.fetch_trial_data(trial, &forwarded)
            }
            Backend::Function(f) => {
                let mut call_kwargs = self.args.metric_func_kwargs.clone();
                call_kwargs.extend(kwargs);
                let records = trial
                    .arms()
                    .iter()
                    .map(|arm| self.score_arm(trial.index(), arm, f, &call_kwargs, options.noisy))
                    .collect::<Result<Vec<_>>>()?;
                trace_info!(metric = %self.name, trial = trial.index(), arms = records.len(), "trial scored");
                Ok(Data::new(records))
            }
        }
    }

    fn score_arm(
        &self,
        trial_index: u64,
        arm: &Arm,
        f: &MetricFunction,
        kwargs: &Kwargs,
        noisy: bool,
    ) -> Result<Observation> {
        let value = self
            .features(arm)
            .and_then(|x| f.call(&x, kwargs, &self.definitions))
            .map_err(|source| Error::Evaluation {
                metric: self.name.clone(),
                arm: arm.name().to_string(),
                source: Box::new(source),
            })?;

        let (mean, sem) = match self.args.noise_sd {
            NoiseSd::Unknown => (value, f64::NAN),
            NoiseSd::Known(s) if noisy && s > 0.0 => (value + s * self.standard_normal(), s),
            NoiseSd::Known(s) if noisy => (value, s),
            NoiseSd::Known(_) => (value, 0.0),
        };

        Ok(Observation {
            arm_name: arm.name().to_string(),
            metric_name: self.name.clone(),
            mean,
            sem,
            trial_index,
        })
    }

    /// Builds the feature vector of `arm` in `param_names` order.
    fn features(&self, arm: &Arm) -> Result<Vec<f64>> {
        let mut x = Vec::with_capacity(self.args.param_names.len());
        for name in &self.args.param_names {
            let Some(value) = arm.parameters().get(name) else {
                trace_warn!(metric = %self.name, arm = arm.name(), param = %name, "parameter missing from arm; skipped");
                continue;
            };
            x.push(
                value
                    .as_f64()
                    .ok_or_else(|| Error::NonNumericParameter(name.clone()))?,
            );
        }
        Ok(x)
    }

    fn standard_normal(&self) -> f64 {
        let mut rng = self.rng.lock();
        // 1 - u keeps the logarithm's argument in (0, 1].
        let u1 = 1.0 - rng.f64();
        let u2 = rng.f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * core::f64::consts::PI * u2).cos()
    }
}

impl Clone for Metric {
    fn clone(&self) -> Self {
        Self::assemble(self.args.clone())
    }
}

impl PartialEq for Metric {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl core::fmt::Debug for Metric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl core::fmt::Display for Metric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Metric(name={}", self.name)?;
        match &self.args.backend {
            Backend::Function(func) => write!(f, " backend={}", func.name())?,
            Backend::Metric(inner) => write!(f, " backend={inner}")?,
        }
        if !self.args.param_names.is_empty() {
            write!(f, " param_names=[{}]", self.args.param_names.join(", "))?;
        }
        if self.args.noise_sd != NoiseSd::Known(0.0) {
            write!(f, " noise_sd={}", self.args.noise_sd)?;
        }
        if !self.args.metric_func_kwargs.is_empty() {
            let kwargs = serde_json::to_string(&self.args.metric_func_kwargs).map_err(|_| core::fmt::Error)?;
            write!(f, " metric_func_kwargs={kwargs}")?;
        }
        if let Some(wrapper) = &self.args.wrapper {
            write!(f, " wrapper={}", wrapper.name())?;
        }
        if !self.args.properties.is_empty() {
            let properties = serde_json::to_string(&self.args.properties).map_err(|_| core::fmt::Error)?;
            write!(f, " properties={properties}")?;
        }
        f.write_str(")")
    }
}

/// Fluent constructor for [`Metric`].
#[must_use]
pub struct MetricBuilder {
    args: MetricArgs,
}

impl MetricBuilder {
    /// Sets the metric name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.args.name = Some(name.into());
        self
    }

    /// Sets the parameters forming the feature vector, in order.
    pub fn param_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.param_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the noise level. A NaN converts to [`NoiseSd::Unknown`].
    pub fn noise_sd(mut self, noise_sd: impl Into<NoiseSd>) -> Self {
        self.args.noise_sd = noise_sd.into();
        self
    }

    /// Replaces the backend keywords.
    pub fn metric_func_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.args.metric_func_kwargs = kwargs;
        self
    }

    /// Adds one backend keyword.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.args.metric_func_kwargs.insert(key.into(), value.into());
        self
    }

    /// Attaches a wrapper.
    pub fn wrapper(mut self, wrapper: Arc<dyn Wrapper>) -> Self {
        self.args.wrapper = Some(wrapper);
        self
    }

    /// Adds one property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.args.properties.insert(key.into(), value.into());
        self
    }

    /// Seeds the noise generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.args.seed = Some(seed);
        self
    }

    /// Builds the metric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNoise`] if the noise level is negative or not
    /// finite.
    pub fn build(self) -> Result<Metric> {
        Metric::from_args(self.args)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::TrialStatus;

    fn sum_metric() -> MetricBuilder {
        Metric::builder(MetricFunction::custom("sum", [], |x, _| Ok(x.iter().sum())))
    }

    fn two_arm_trial() -> Trial {
        Trial::new(3)
            .with_arm(Arm::new("3_0").with_param("x", 1.0).with_param("y", 2.0))
            .with_arm(Arm::new("3_1").with_param("x", -1.0).with_param("y", 0.5))
    }

    #[test]
    fn one_record_per_arm_in_order() {
        let metric = sum_metric().param_names(["x", "y"]).build().unwrap();
        let data = metric
            .fetch_trial_data(&two_arm_trial(), &FetchOptions::default())
            .unwrap();
        let arms: Vec<_> = data.records().iter().map(|r| r.arm_name.as_str()).collect();
        assert_eq!(arms, ["3_0", "3_1"]);
        assert_eq!(data.mean("3_0"), Some(3.0));
        assert_eq!(data.mean("3_1"), Some(-0.5));
        assert!(data.records().iter().all(|r| r.trial_index == 3 && r.sem == 0.0));
        assert!(data.records().iter().all(|r| r.metric_name == "sum"));
    }

    #[test]
    fn missing_parameters_are_skipped() {
        let metric = sum_metric().param_names(["x", "absent"]).build().unwrap();
        let data = metric
            .fetch_trial_data(&two_arm_trial(), &FetchOptions::default())
            .unwrap();
        assert_eq!(data.mean("3_0"), Some(1.0));
    }

    #[test]
    fn non_numeric_parameter_is_an_evaluation_error() {
        let metric = sum_metric().param_names(["label"]).build().unwrap();
        let trial = Trial::new(0).with_arm(Arm::new("0_0").with_param("label", "tall"));
        match metric.fetch_trial_data(&trial, &FetchOptions::default()) {
            Err(Error::Evaluation { source, .. }) => {
                assert!(matches!(*source, Error::NonNumericParameter(ref p) if p == "label"));
            }
            other => panic!("expected an evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_trial_is_rejected() {
        let metric = sum_metric().build().unwrap();
        assert!(matches!(
            metric.fetch_trial_data(&Trial::new(9), &FetchOptions::default()),
            Err(Error::EmptyTrial(9))
        ));
    }

    #[test]
    fn invalid_noise_is_rejected() {
        assert!(matches!(
            sum_metric().noise_sd(-1.0).build(),
            Err(Error::InvalidNoise(_))
        ));
        assert!(sum_metric().noise_sd(f64::INFINITY).build().is_err());
        assert_eq!(
            sum_metric().noise_sd(f64::NAN).build().unwrap().noise_sd(),
            NoiseSd::Unknown
        );
    }

    #[test]
    fn sem_follows_noise_configuration() {
        let trial = two_arm_trial();
        let known = sum_metric().noise_sd(0.5).seed(1).build().unwrap();
        let noisy = known.fetch_trial_data(&trial, &FetchOptions::default()).unwrap();
        assert!(noisy.records().iter().all(|r| r.sem == 0.5));
        let quiet = known.fetch_trial_data(&trial, &FetchOptions::noiseless()).unwrap();
        assert!(quiet.records().iter().all(|r| r.sem == 0.0));

        let unknown = sum_metric().noise_sd(NoiseSd::Unknown).build().unwrap();
        for options in [FetchOptions::default(), FetchOptions::noiseless()] {
            let data = unknown.fetch_trial_data(&trial, &options).unwrap();
            assert!(data.records().iter().all(|r| r.sem.is_nan()));
        }
    }

    #[test]
    fn metric_func_kwargs_are_overridden_by_caller() {
        let metric = Metric::builder(MetricFunction::custom("scale", ["k"], |x, kw| {
            Ok(x[0] * kw.get("k").and_then(serde_json::Value::as_f64).unwrap_or(1.0))
        }))
        .param_names(["x"])
        .kwarg("k", 2.0)
        .build()
        .unwrap();
        let trial = Trial::new(0).with_arm(Arm::new("a").with_param("x", 3.0));
        let data = metric.fetch_trial_data(&trial, &FetchOptions::default()).unwrap();
        assert_eq!(data.mean("a"), Some(6.0));
        let data = metric
            .fetch_trial_data(&trial, &FetchOptions::default().kwarg("k", 10.0))
            .unwrap();
        assert_eq!(data.mean("a"), Some(30.0));
    }

    #[test]
    fn clone_is_equal_and_independent() {
        let metric = sum_metric()
            .name("total")
            .param_names(["x", "y"])
            .noise_sd(0.1)
            .kwarg("unused", json!(1))
            .property("units", "mm")
            .build()
            .unwrap();
        let copy = metric.clone();
        assert_eq!(copy, metric);
        assert_eq!(copy.backend(), metric.backend());
        assert_eq!(copy.param_names(), metric.param_names());
        assert_eq!(copy.noise_sd(), metric.noise_sd());
        assert_eq!(copy.definitions().cached_definitions(), 0);
    }

    #[test]
    fn display_omits_empty_fields() {
        let plain = Metric::builder(MetricFunction::statistical(StatisticalFn::MeanSquaredError))
            .build()
            .unwrap();
        assert_eq!(
            plain.to_string(),
            "Metric(name=mean_squared_error backend=mean_squared_error)"
        );

        let partial = MetricFunction::statistical(StatisticalFn::MeanSquaredError)
            .partial([("squared".to_string(), json!(false))].into());
        let full = Metric::builder(partial)
            .name("rmse")
            .param_names(["x"])
            .noise_sd(NoiseSd::Unknown)
            .build()
            .unwrap();
        assert_eq!(
            full.to_string(),
            "Metric(name=rmse backend=mean_squared_error param_names=[x] noise_sd=nan)"
        );
    }

    #[test]
    fn nested_metric_display_and_name() {
        let inner = sum_metric().name("inner").build().unwrap();
        let outer = Metric::builder(inner).build().unwrap();
        assert_eq!(outer.name(), "inner");
        assert_eq!(
            outer.to_string(),
            "Metric(name=inner backend=Metric(name=inner backend=sum))"
        );
    }

    #[test]
    fn never_available_while_running() {
        let metric = sum_metric().build().unwrap();
        assert!(!metric.is_available_while_running());
        let mut trial = two_arm_trial();
        trial.set_status(TrialStatus::Running);
        assert!(metric.fetch_trial_data(&trial, &FetchOptions::noiseless()).is_ok());
    }
}
