//! Core types shared by runners and metrics.

use serde::{Deserialize, Serialize};

/// The lifecycle status of a trial, as seen by the optimization driver.
///
/// `Completed`, `Failed` and `Abandoned` are terminal and mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    /// The trial exists but has not been dispatched yet.
    Pending,
    /// The trial has been dispatched and is executing externally.
    Running,
    /// The trial finished successfully and can be scored.
    Completed,
    /// The trial failed.
    Failed,
    /// The trial was abandoned by the driver or the external backend.
    Abandoned,
}

impl TrialStatus {
    /// Returns `true` for `Completed`, `Failed` and `Abandoned`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TrialStatus::Completed | TrialStatus::Failed | TrialStatus::Abandoned
        )
    }
}

impl core::fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            TrialStatus::Pending => "pending",
            TrialStatus::Running => "running",
            TrialStatus::Completed => "completed",
            TrialStatus::Failed => "failed",
            TrialStatus::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}

/// The kind of a trial.
///
/// Runners only dispatch single-arm-group trials; batch trials group several
/// generator runs and are rejected with [`Error::TypeMismatch`](crate::Error::TypeMismatch).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialKind {
    /// A trial with one arm group.
    #[default]
    Single,
    /// A batched trial with multiple arm groups.
    Batch,
}
