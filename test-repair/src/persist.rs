//! Writing repaired artifacts into `<root>/tests`.

use std::fs;
use std::path::{Path, PathBuf};

use prompt_synth::TestCategory;
use tracing::{info, warn};

use crate::errors::{RepairError, Result};
use crate::pipeline::{ArtifactOutcome, GeneratedArtifact};
use crate::validate::validate;

pub const TESTS_DIR: &str = "tests";

/// `test_{function}_{category}_{batch}.py`, or
/// `test_{function}_fuzz_{batch}_{chunk}.py` for fuzz chunks.
pub fn test_file_name(artifact: &GeneratedArtifact) -> String {
    let req = &artifact.request;
    match (req.category, artifact.chunk) {
        (TestCategory::Fuzz, chunk) => format!(
            "test_{}_fuzz_{}_{}.py",
            req.function,
            req.batch,
            chunk.unwrap_or(0)
        ),
        (category, _) => format!("test_{}_{}_{}.py", req.function, category, req.batch),
    }
}

pub struct TestWriter {
    tests_dir: PathBuf,
}

impl TestWriter {
    /// Writer for `<root>/tests`; the directory is created when missing.
    pub fn new(root: &Path) -> Result<Self> {
        let tests_dir = root.join(TESTS_DIR);
        fs::create_dir_all(&tests_dir).map_err(|source| RepairError::TestsDir {
            path: tests_dir.clone(),
            source,
        })?;
        Ok(Self { tests_dir })
    }

    pub fn tests_dir(&self) -> &Path {
        &self.tests_dir
    }

    /// Re-validate and write one artifact, updating its outcome.
    ///
    /// Invalid code is still written, behind a `# SYNTAX ERROR ...` line.
    pub fn persist(&self, artifact: &mut GeneratedArtifact) -> Result<PathBuf> {
        if artifact.outcome == ArtifactOutcome::Rejected || artifact.code.trim().is_empty() {
            return Err(RepairError::Rejected(artifact.request.function.clone()));
        }

        let check = validate(&artifact.code);
        artifact.valid = check.is_valid();
        artifact.diagnostic = check.diagnostic();

        let content = match &artifact.diagnostic {
            Some(diag) => format!("{diag}\n{}\n", artifact.code),
            None => format!("{}\n", artifact.code),
        };

        let path = self.tests_dir.join(test_file_name(artifact));
        fs::write(&path, content)?;

        if artifact.valid {
            artifact.outcome = ArtifactOutcome::Persisted;
            info!("persist: wrote {}", path.display());
        } else {
            artifact.outcome = ArtifactOutcome::PersistedWithDiagnostic;
            warn!(
                "persist: wrote {} with syntax diagnostic: {}",
                path.display(),
                artifact.diagnostic.as_deref().unwrap_or_default()
            );
        }
        artifact.file = Some(path.clone());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use prompt_synth::{ContextSource, PromptRequest};

    use super::*;
    use crate::pipeline::repair_response;

    fn request(category: TestCategory, batch: usize) -> PromptRequest {
        PromptRequest {
            function: "add".into(),
            module: PathBuf::from("calc.py"),
            code_context: String::new(),
            context_source: ContextSource::Function,
            class_name: None,
            documentation: None,
            imports: Vec::new(),
            category,
            batch,
        }
    }

    #[test]
    fn file_names_encode_category_batch_and_chunk() {
        let unit = &repair_response(&request(TestCategory::Unit, 4), "def test_add():\n    assert add(1, 1) == 2")[0];
        assert_eq!(test_file_name(unit), "test_add_unit_4.py");

        let raw = "def test_a():\n    assert add(0, 0) == 0\n\ndef test_b():\n    assert add(1, 0) == 1";
        let fuzz = repair_response(&request(TestCategory::Fuzz, 7), raw);
        let names: Vec<_> = fuzz.iter().map(test_file_name).collect();
        assert_eq!(names, vec!["test_add_fuzz_7_0.py", "test_add_fuzz_7_1.py"]);
    }

    #[test]
    fn valid_and_invalid_code_are_both_written() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TestWriter::new(dir.path()).unwrap();

        let mut good = repair_response(&request(TestCategory::Unit, 0), "def test_add():\n    assert add(1, 1) == 2").remove(0);
        let path = writer.persist(&mut good).unwrap();
        assert_eq!(good.outcome, ArtifactOutcome::Persisted);
        assert!(path.starts_with(dir.path().join("tests")));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("from calc import add"));

        let mut bad = repair_response(&request(TestCategory::Unit, 1), "def test_add(:\n    assert add(1, 1) == 2").remove(0);
        let path = writer.persist(&mut bad).unwrap();
        assert_eq!(bad.outcome, ArtifactOutcome::PersistedWithDiagnostic);
        assert!(fs::read_to_string(&path).unwrap().starts_with("# SYNTAX ERROR"));
    }

    #[test]
    fn rejected_artifacts_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TestWriter::new(dir.path()).unwrap();
        let mut rejected = GeneratedArtifact::rejected(&request(TestCategory::Unit, 0), "no response");
        assert!(matches!(writer.persist(&mut rejected), Err(RepairError::Rejected(_))));
        assert_eq!(fs::read_dir(writer.tests_dir()).unwrap().count(), 0);
    }
}
