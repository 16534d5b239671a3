#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Trial execution and metric evaluation for black-box optimization of
//! external simulation models.
//!
//! An optimization driver proposes [`Trial`]s. A [`Runner`](runner::Runner)
//! dispatches each one to an external execution backend and reports its
//! status when polled. Once a trial has completed, a [`Metric`] scores every
//! arm against observations, producing one [`Observation`](metric::Observation)
//! per arm.
//!
//! # Getting Started
//!
//! Score a trial with a synthetic benchmark resolved from configuration:
//!
//! ```
//! use trialwrap::prelude::*;
//!
//! let config: MetricConfig = serde_yaml::from_str("synthetic_metric: Ackley").unwrap();
//! let metric = BackendResolver::standard()
//!     .build_metric(&config, MetricOverrides::new().param_names(["x", "y"]))
//!     .unwrap()
//!     .unwrap();
//!
//! let trial = Trial::new(0).with_arm(Arm::new("0_0").with_param("x", 0.0).with_param("y", 0.0));
//! let data = metric.fetch_trial_data(&trial, &FetchOptions::noiseless()).unwrap();
//! assert!(data.mean("0_0").unwrap().abs() < 1e-8);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Trial`], [`Arm`] | One optimization iteration and its parameterizations. |
//! | [`Metric`] | A scoring rule with one backend: a function or a nested metric. |
//! | [`BackendResolver`](metric::BackendResolver) | Turns a [`MetricConfig`](metric::MetricConfig) into a metric factory. |
//! | [`Runner`](runner::Runner) | Dispatches trials and polls their status. |
//! | [`Wrapper`](wrapper::Wrapper) | User collaborator that runs the model for a trial. |
//!
//! # Metric Backends
//!
//! | Backend | Inputs | Source |
//! |---------|--------|--------|
//! | Statistical | `y_true`, `y_pred` keywords | [`StatisticalFn`](metric::StatisticalFn) |
//! | Synthetic | Feature vector | [`synthetic`] catalogs |
//! | Linear | Feature vector | [`MetricFunction::linear`](metric::MetricFunction::linear) |
//! | From file | `file_path` keyword | [`FunctionDefinition`](metric::FunctionDefinition) |
//! | Custom | Feature vector and keywords | [`MetricFunction::custom`](metric::MetricFunction::custom) |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) around dispatch, polling and scoring | on |
//! | `async` | [`TokioJobQueue`](runner::TokioJobQueue), a queue backed by tokio's blocking pool | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod config;
mod error;
pub mod metric;
pub mod model;
mod param;
pub mod runner;
pub mod scaling;
pub mod synthetic;
mod trial;
mod types;
pub mod workdir;
pub mod wrapper;

pub use error::{Error, Result};
pub use metric::Metric;
pub use param::ParamValue;
pub use trial::{Arm, Parameters, Trial};
pub use types::{TrialKind, TrialStatus};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use trialwrap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ExperimentConfig;
    pub use crate::error::{Error, Result};
    pub use crate::metric::{
        Backend, BackendResolver, Data, FetchOptions, Kwargs, Metric, MetricConfig,
        MetricFunction, MetricOverrides, NoiseSd, Observation, StatisticalFn,
    };
    pub use crate::model::ModelCommand;
    pub use crate::param::ParamValue;
    #[cfg(feature = "async")]
    pub use crate::runner::TokioJobQueue;
    pub use crate::runner::{
        InMemoryQueue, JobId, JobQueue, QueueJobRunner, RunMetadata, Runner, StatusMap,
        WrappedJobRunner,
    };
    pub use crate::trial::{Arm, Trial};
    pub use crate::types::{TrialKind, TrialStatus};
    pub use crate::wrapper::{ProcessWrapper, Wrapper};
}
