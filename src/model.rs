//! Invoking the external simulation model.
//!
//! The model is a program that takes three flags and exits zero on success:
//!
//! ```text
//! <program> [args...] --config_path <p> --data_path <p> --output_path <p>
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Captured output of a successful model run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

/// How to launch the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelCommand {
    program: OsString,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
}

impl ModelCommand {
    /// Runs `program` with no leading arguments in the current directory.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// `python3 main.py` inside `model_dir`.
    #[must_use]
    pub fn python(model_dir: impl Into<PathBuf>) -> Self {
        Self::new("python3").arg("main.py").working_dir(model_dir)
    }

    /// Appends a leading argument, placed before the path flags.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the directory the model runs in.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Runs the model to completion.
    ///
    /// Blocks until the process exits. Both output streams are captured and
    /// logged.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the process cannot be started.
    /// - [`Error::ExternalProcess`] if it exits unsuccessfully.
    pub fn run(&self, config_path: &Path, data_path: &Path, output_path: &Path) -> Result<ModelOutput> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("--config_path")
            .arg(config_path)
            .arg("--data_path")
            .arg(data_path)
            .arg("--output_path")
            .arg(output_path)
            .stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        trace_info!(program = ?self.program, config = %config_path.display(), "running model");
        let output = command.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        trace_debug!(%stdout, %stderr, "model output");

        if !output.status.success() {
            trace_warn!(code = ?output.status.code(), "model exited unsuccessfully");
            return Err(Error::ExternalProcess {
                code: output.status.code(),
                stderr,
            });
        }
        Ok(ModelOutput { stdout, stderr })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn paths() -> (PathBuf, PathBuf, PathBuf) {
        (
            PathBuf::from("c.yml"),
            PathBuf::from("data.csv"),
            PathBuf::from("out"),
        )
    }

    #[test]
    fn flags_follow_leading_args() {
        let (c, d, o) = paths();
        let out = ModelCommand::new("echo").arg("main.py").run(&c, &d, &o).unwrap();
        assert_eq!(
            out.stdout.trim(),
            "main.py --config_path c.yml --data_path data.csv --output_path out"
        );
    }

    #[test]
    fn runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (c, d, o) = paths();
        let out = ModelCommand::new("sh")
            .arg("-c")
            .arg("pwd")
            .working_dir(dir.path())
            .run(&c, &d, &o)
            .unwrap();
        let reported = PathBuf::from(out.stdout.trim()).canonicalize().unwrap();
        assert_eq!(reported, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let (c, d, o) = paths();
        let err = ModelCommand::new("sh")
            .arg("-c")
            .arg("echo boom >&2; exit 3")
            .run(&c, &d, &o)
            .unwrap_err();
        match err {
            Error::ExternalProcess { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "boom");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
