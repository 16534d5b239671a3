//! Experiment and trial working directories.
//!
//! ```text
//! <root>/<experiment>_<YYYYmmddTHHMMSS>/
//!     000000/config.yml
//!     000001/config.yml
//!     ...
//! ```
//!
//! Each trial owns the directory named after its zero-padded index. Directory
//! creation fails if the directory already exists, so two trials can never
//! share one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;

/// File name of the per-trial model configuration.
pub const CONFIG_FILE: &str = "config.yml";

/// Width of the zero-padded trial directory name.
pub const TRIAL_DIR_WIDTH: usize = 6;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Returns the directory of trial `index` without creating it.
///
/// ```
/// use std::path::Path;
/// use trialwrap::workdir::trial_dir;
///
/// assert_eq!(trial_dir(Path::new("exp"), 7), Path::new("exp/000007"));
/// ```
#[must_use]
pub fn trial_dir(experiment_dir: &Path, index: u64) -> PathBuf {
    experiment_dir.join(format!("{index:0width$}", width = TRIAL_DIR_WIDTH))
}

/// Creates the directory of trial `index` and returns its path.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the directory already exists or
/// cannot be created.
pub fn make_trial_dir(experiment_dir: &Path, index: u64) -> Result<PathBuf> {
    let dir = trial_dir(experiment_dir, index);
    fs::create_dir(&dir)?;
    trace_debug!(trial = index, dir = %dir.display(), "trial directory created");
    Ok(dir)
}

/// Creates `root/<name>_<timestamp>` using the local time and returns its path.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the directory exists or `root`
/// is missing.
pub fn make_experiment_dir(root: &Path, name: &str) -> Result<PathBuf> {
    let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
    let dir = root.join(format!("{name}_{stamp}"));
    fs::create_dir(&dir)?;
    trace_info!(dir = %dir.display(), "experiment directory created");
    Ok(dir)
}

#[derive(Serialize)]
struct TrialConfig<'a, P: Serialize, M: Serialize> {
    model_options: &'a M,
    parameters: &'a P,
}

/// Writes `config.yml` into `trial_dir` and returns its path.
///
/// The file has two top-level keys: `model_options`, passed through from the
/// experiment configuration, and `parameters`, the trial's parameter values.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the file cannot be written and
/// [`Error::Config`](crate::Error::Config) if the values do not serialize.
pub fn write_configs<P, M>(trial_dir: &Path, parameters: &P, model_options: &M) -> Result<PathBuf>
where
    P: Serialize,
    M: Serialize,
{
    let path = trial_dir.join(CONFIG_FILE);
    let yaml = serde_yaml::to_string(&TrialConfig {
        model_options,
        parameters,
    })?;
    fs::write(&path, yaml)?;
    Ok(path)
}
