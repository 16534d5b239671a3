//! Trial and arm types consumed from the optimization driver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::param::ParamValue;
use crate::types::{TrialKind, TrialStatus};

/// Parameter name to value mapping of one arm.
pub type Parameters = BTreeMap<String, ParamValue>;

/// An immutable, named parameterization evaluated within a [`Trial`].
///
/// # Examples
///
/// ```
/// use trialwrap::Arm;
///
/// let arm = Arm::new("0_0").with_param("x", 0.5).with_param("n", 3_i64);
/// assert_eq!(arm.name(), "0_0");
/// assert_eq!(arm.parameters().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arm {
    name: String,
    parameters: Parameters,
}

impl Arm {
    /// Creates an arm with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
        }
    }

    /// Creates an arm from an existing parameter mapping.
    #[must_use]
    pub fn with_parameters(name: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// Adds one parameter, consuming and returning the arm.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Returns the arm name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter mapping.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

/// One optimization iteration, grouping one or more arms.
///
/// Trials are owned by the optimization driver. Runners and metrics read them
/// and report status changes back instead of mutating them.
///
/// # Examples
///
/// ```
/// use trialwrap::{Arm, Trial, TrialStatus};
///
/// let trial = Trial::new(7).with_arm(Arm::new("7_0").with_param("x", 1.0));
/// assert_eq!(trial.index(), 7);
/// assert_eq!(trial.status(), TrialStatus::Pending);
/// assert!(trial.arm("7_0").is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    index: u64,
    kind: TrialKind,
    /// Arms in insertion order; names are unique.
    arms: Vec<Arm>,
    status: TrialStatus,
    #[serde(default)]
    run_metadata: serde_json::Map<String, serde_json::Value>,
}

impl Trial {
    /// Creates a single-arm-group trial with no arms in the `Pending` state.
    #[must_use]
    pub fn new(index: u64) -> Self {
        Self {
            index,
            kind: TrialKind::Single,
            arms: Vec::new(),
            status: TrialStatus::Pending,
            run_metadata: serde_json::Map::new(),
        }
    }

    /// Creates a batch trial. Runners reject these.
    #[must_use]
    pub fn batch(index: u64) -> Self {
        Self {
            kind: TrialKind::Batch,
            ..Self::new(index)
        }
    }

    /// Adds an arm. An arm with the same name replaces the earlier one in place.
    #[must_use]
    pub fn with_arm(mut self, arm: Arm) -> Self {
        self.add_arm(arm);
        self
    }

    /// Adds an arm. An arm with the same name replaces the earlier one in place.
    pub fn add_arm(&mut self, arm: Arm) {
        if let Some(existing) = self.arms.iter_mut().find(|a| a.name == arm.name) {
            *existing = arm;
        } else {
            self.arms.push(arm);
        }
    }

    /// Returns the trial index.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Returns the trial kind.
    #[must_use]
    pub fn kind(&self) -> TrialKind {
        self.kind
    }

    /// Returns the arms in iteration order.
    #[must_use]
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    /// Looks up an arm by name.
    #[must_use]
    pub fn arm(&self, name: &str) -> Option<&Arm> {
        self.arms.iter().find(|a| a.name == name)
    }

    /// Iterates `(name, arm)` pairs in trial order.
    pub fn arms_by_name(&self) -> impl Iterator<Item = (&str, &Arm)> {
        self.arms.iter().map(|a| (a.name.as_str(), a))
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> TrialStatus {
        self.status
    }

    /// Applies a status reported by a runner.
    pub fn set_status(&mut self, status: TrialStatus) {
        self.status = status;
    }

    /// Returns the run metadata attached after dispatch.
    #[must_use]
    pub fn run_metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.run_metadata
    }

    /// Merges run metadata returned by [`Runner::run`](crate::runner::Runner::run).
    pub fn update_run_metadata(&mut self, metadata: serde_json::Map<String, serde_json::Value>) {
        self.run_metadata.extend(metadata);
    }
}
