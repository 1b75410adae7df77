//! coverage.py JSON report (`coverage json`), the fields used here only.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{CoverageError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoverageReport {
    #[serde(default)]
    pub files: BTreeMap<String, FileCoverage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileCoverage {
    /// Present in some coverage.py versions; the map key is used otherwise.
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub summary: FileSummary,
    #[serde(default)]
    pub executed_lines: Vec<usize>,
    #[serde(default)]
    pub missing_lines: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSummary {
    #[serde(default)]
    pub covered_lines: usize,
    #[serde(default)]
    pub num_statements: usize,
    #[serde(default)]
    pub percent_covered: f64,
}

impl FileCoverage {
    pub fn executed(&self) -> BTreeSet<usize> {
        self.executed_lines.iter().copied().collect()
    }
}

impl CoverageReport {
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|source| CoverageError::Report {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_missing_optional_fields() {
        let r = CoverageReport::from_json(
            r#"{"meta": {"version": "7.4.0"}, "files": {"calc.py": {"executed_lines": [1, 2], "summary": {"percent_covered": 50.0}}}}"#,
        )
        .unwrap();
        let f = &r.files["calc.py"];
        assert_eq!(f.filename, None);
        assert!(f.missing_lines.is_empty());
        assert_eq!(f.summary.percent_covered, 50.0);
        assert!(CoverageReport::from_json("{}").unwrap().is_empty());
    }
}
