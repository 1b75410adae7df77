//! coverage.py invocation over the generated test suite.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{info, instrument, warn};

use crate::errors::{CoverageError, Result};

pub const DEFAULT_REPORT_FILE: &str = "coverage.json";

#[derive(Debug, Clone)]
pub struct CoverageRunner {
    /// Executable providing `coverage run` / `coverage json`.
    pub program: String,
    pub source_dir: PathBuf,
    pub tests_dir: PathBuf,
    pub report_file: PathBuf,
}

impl CoverageRunner {
    /// Runner for `<root>` with tests in `<root>/tests` and the report at
    /// `<root>/coverage.json`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            program: "coverage".to_string(),
            source_dir: root.to_path_buf(),
            tests_dir: root.join("tests"),
            report_file: root.join(DEFAULT_REPORT_FILE),
        }
    }

    /// `PYTHONPATH` with the source root in front of any inherited value.
    fn python_path(&self) -> Result<OsString> {
        let mut entries = vec![self.source_dir.clone()];
        if let Some(existing) = std::env::var_os("PYTHONPATH") {
            entries.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(entries).map_err(|e| CoverageError::PythonPath(e.to_string()))
    }

    fn command(&self) -> Result<Command> {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(&self.source_dir)
            .env("PYTHONPATH", self.python_path()?);
        Ok(cmd)
    }

    fn status(&self, cmd: &mut Command) -> Result<ExitStatus> {
        cmd.status().map_err(|source| CoverageError::Spawn {
            program: self.program.clone(),
            source,
        })
    }

    /// Run the suite under coverage, then export the JSON report.
    ///
    /// Non-zero exits (failing tests, export problems) are logged; only a
    /// missing executable is an error. Blocking.
    #[instrument(skip_all, fields(source = %self.source_dir.display()))]
    pub fn run(&self) -> Result<PathBuf> {
        info!("coverage: running tests in {}", self.tests_dir.display());
        let mut run = self.command()?;
        run.arg("run")
            .arg("--source")
            .arg(&self.source_dir)
            .arg("-m")
            .arg("pytest")
            .arg(&self.tests_dir);
        let status = self.status(&mut run)?;
        if !status.success() {
            warn!("coverage: pytest exited with {status}, some tests failed");
        }

        let mut export = self.command()?;
        export.arg("json").arg("-o").arg(&self.report_file);
        let status = self.status(&mut export)?;
        if !status.success() {
            warn!("coverage: JSON export exited with {status}");
        }
        Ok(self.report_file.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_root_layout() {
        let r = CoverageRunner::for_root(Path::new("/repo"));
        assert_eq!(r.tests_dir, PathBuf::from("/repo/tests"));
        assert_eq!(r.report_file, PathBuf::from("/repo/coverage.json"));
        let pp = r.python_path().unwrap();
        assert!(std::env::split_paths(&pp).next() == Some(PathBuf::from("/repo")));
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CoverageRunner {
            program: "definitely-not-a-coverage-binary".to_string(),
            ..CoverageRunner::for_root(dir.path())
        };
        assert!(matches!(runner.run(), Err(CoverageError::Spawn { .. })));
    }
}
