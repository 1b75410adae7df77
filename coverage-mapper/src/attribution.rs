//! Line coverage to per-function percentages.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

use code_analyzer::{FunctionSpan, RepoAnalysis, function_spans};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::report::CoverageReport;

/// module (root-relative path) -> function (`name` or `Class.method`) -> percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CoverageRecord {
    pub modules: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CoverageRecord {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, module: &str, function: &str) -> Option<f64> {
        self.modules.get(module)?.get(function).copied()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        info!("coverage: wrote function coverage to {}", path.display());
        Ok(())
    }

    /// Human-readable table, one line per function.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        for (module, functions) in &self.modules {
            out.push_str(&format!("{}\n", module.bold()));
            for (name, pct) in functions {
                let cell = format!("{pct:>5.1}%");
                let cell = if *pct >= 80.0 {
                    cell.green()
                } else if *pct > 0.0 {
                    cell.yellow()
                } else {
                    cell.red()
                };
                out.push_str(&format!("  {cell}  {name}\n"));
            }
        }
        out
    }
}

/// `executed / total * 100`, rounded to one decimal.
pub fn percent(executed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = executed as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Percent of `span`'s lines present in `executed`.
pub fn span_coverage(span: &FunctionSpan, executed: &BTreeSet<usize>) -> f64 {
    let hit = span.lines().filter(|l| executed.contains(l)).count();
    percent(hit, span.line_count())
}

/// Root-relative, forward-slash key used for both report entries and
/// analyzed modules.
fn module_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(p) => Some(p.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Attribute a coverage report to the functions of `repo`.
///
/// Only `.py` files that belong to the analyzed set are considered; each is
/// re-read and re-parsed, and failures are logged and skipped. A report
/// without files yields an empty record.
pub fn attribute(report: &CoverageReport, repo: &RepoAnalysis) -> CoverageRecord {
    let mut record = CoverageRecord::default();
    if report.is_empty() {
        info!("coverage: no coverage data (no tests ran?)");
        return record;
    }

    let analyzed: BTreeMap<String, PathBuf> = repo
        .modules
        .iter()
        .map(|m| (module_key(&repo.root, &m.path), m.path.clone()))
        .collect();

    for (key, entry) in &report.files {
        let file = entry.filename.as_deref().unwrap_or(key);
        if !file.ends_with(".py") {
            continue;
        }
        let rel = module_key(&repo.root, Path::new(file));
        let Some(path) = analyzed.get(&rel) else {
            debug!("coverage: {} is not an analyzed module, skipping", rel);
            continue;
        };

        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(err) => {
                warn!("coverage: cannot read {}: {}", path.display(), err);
                continue;
            }
        };
        let spans = match function_spans(Path::new(&rel), &source) {
            Ok(s) => s,
            Err(err) => {
                warn!("coverage: cannot parse {}: {}", rel, err);
                continue;
            }
        };

        let executed = entry.executed();
        let functions = record.modules.entry(rel.clone()).or_default();
        for span in spans.iter().filter(|s| s.line_count() > 0) {
            functions
                .entry(span.qualified_name())
                .or_insert_with(|| span_coverage(span, &executed));
        }
        debug!("coverage: {} -> {} functions", rel, functions.len());
    }

    info!(
        "coverage: attributed {} modules, {} functions",
        record.modules.len(),
        record.modules.values().map(BTreeMap::len).sum::<usize>()
    );
    record
}

#[cfg(test)]
mod tests {
    use code_analyzer::{ScanConfig, analyze_repo};

    use super::*;

    const CALC: &str = "def add(a, b):\n    return a + b\n\n\nclass Calc:\n    def mul(self, a, b):\n        x = a * b\n        return x\n\n\ndef unused():\n    return None\n";

    fn fixture() -> (tempfile::TempDir, RepoAnalysis) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/calc.py"), CALC).unwrap();
        fs::write(dir.path().join("other.py"), "def f():\n    pass\n").unwrap();
        let repo = analyze_repo(dir.path(), &ScanConfig::default()).unwrap();
        (dir, repo)
    }

    #[test]
    fn full_none_and_partial_spans() {
        let (dir, repo) = fixture();
        let json = format!(
            r#"{{"files": {{
                "pkg/calc.py": {{"executed_lines": [1, 2, 5, 6, 7], "missing_lines": [8, 11, 12]}},
                "{}": {{"executed_lines": [1, 2]}},
                "tests/test_add_unit_0.py": {{"executed_lines": [1]}},
                "README.md": {{"executed_lines": [1]}}
            }}}}"#,
            dir.path().join("other.py").display()
        );
        let report = CoverageReport::from_json(&json).unwrap();
        let record = attribute(&report, &repo);

        assert_eq!(record.get("pkg/calc.py", "add"), Some(100.0));
        assert_eq!(record.get("pkg/calc.py", "Calc.mul"), Some(66.7));
        assert_eq!(record.get("pkg/calc.py", "unused"), Some(0.0));
        assert_eq!(record.get("other.py", "f"), Some(100.0));
        assert_eq!(record.modules.len(), 2);
    }

    #[test]
    fn empty_report_is_empty_record() {
        let (_dir, repo) = fixture();
        let record = attribute(&CoverageReport::default(), &repo);
        assert!(record.is_empty());
    }

    #[test]
    fn denominator_is_the_span_length() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(0, 0), 0.0);
        let span = FunctionSpan {
            name: "f".into(),
            module: PathBuf::from("m.py"),
            start_line: 10,
            end_line: 13,
            class: None,
        };
        let executed: BTreeSet<usize> = [1, 2, 10, 11, 99].into_iter().collect();
        assert_eq!(span_coverage(&span, &executed), 50.0);
    }

    #[test]
    fn record_serializes_as_nested_map() {
        let mut record = CoverageRecord::default();
        record
            .modules
            .entry("calc.py".into())
            .or_default()
            .insert("add".into(), 100.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["calc.py"]["add"], 100.0);
        assert!(record.render_table().contains("add"));
    }
}
