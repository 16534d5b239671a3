/// Errors returned by metric resolution, evaluation and trial dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a configuration names a backend that no registry knows.
    #[error("{kind} backend '{name}' not found")]
    BackendNotFound {
        /// The kind of registry that was searched (statistical, named, synthetic).
        kind: &'static str,
        /// The name that failed to resolve.
        name: String,
    },

    /// Returned when a runner receives a trial of a kind it cannot dispatch.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Returned when a backend fails while scoring one arm of a trial.
    ///
    /// The whole fetch is aborted; no partial data is returned.
    #[error("metric '{metric}' failed on arm '{arm}': {source}")]
    Evaluation {
        /// The name of the metric being evaluated.
        metric: String,
        /// The arm that was being scored.
        arm: String,
        /// The underlying backend error.
        #[source]
        source: Box<Error>,
    },

    /// Returned when the external model process exits unsuccessfully.
    #[error("external process exited with {}: {stderr}", exit_label(.code))]
    ExternalProcess {
        /// The exit code, or `None` when the process was killed by a signal.
        code: Option<i32>,
        /// Captured standard error of the process.
        stderr: String,
    },

    /// Returned when a benchmark function receives the wrong number of inputs.
    #[error("dimension mismatch: expected {expected} inputs, got {got}")]
    DimensionMismatch {
        /// The dimensionality the function requires.
        expected: usize,
        /// The length of the vector it received.
        got: usize,
    },

    /// Returned when a keyword argument is missing or has the wrong shape.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// The keyword name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Returned when a metric is configured with a negative or non-finite noise level.
    #[error("invalid noise_sd: {0} must be finite and non-negative")]
    InvalidNoise(f64),

    /// Returned when a trial without arms is evaluated.
    #[error("trial {0} has no arms")]
    EmptyTrial(u64),

    /// Returned when a parameter used for a feature vector is not numeric.
    #[error("parameter '{0}' is not numeric")]
    NonNumericParameter(String),

    /// Returned when a configuration or definition file cannot be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Returned when a filesystem operation fails.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when an async task fails.
    #[cfg(feature = "async")]
    #[error("async task error: {0}")]
    TaskError(String),
}

pub type Result<T> = core::result::Result<T, Error>;

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("code {c}"))
}

impl Error {
    pub(crate) fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}
