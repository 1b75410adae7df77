//! Batch construction over an analyzed repository.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use code_analyzer::{ParsedModule, RepoAnalysis};
use doc_correlator::{DocCorrelator, DocIndex};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::category::TestCategory;
use crate::errors::Result;
use crate::prompt::{ContextSource, PromptRequest, build_prompt, code_context};

/// Modules considered per run unless overridden.
pub const DEFAULT_MAX_MODULES: usize = 10;

/// One line of the JSONL prompt dump.
#[derive(Debug, Serialize)]
pub struct PromptRecord<'a> {
    pub file: String,
    pub function: &'a str,
    pub category: TestCategory,
    pub batch: usize,
    pub context: ContextSource,
    pub prompt: String,
}

#[derive(Debug, Clone, Default)]
pub struct PromptBatch {
    pub requests: Vec<PromptRequest>,
}

impl PromptBatch {
    /// One request per function of the first `max_modules` modules, in
    /// discovery order then declaration order.
    pub fn build(
        repo: &RepoAnalysis,
        docs: &DocIndex,
        correlator: &DocCorrelator,
        category: TestCategory,
        max_modules: usize,
    ) -> Self {
        let mut requests = Vec::new();
        let mut misses = 0usize;

        for module in repo.modules.iter().take(max_modules) {
            let rel = repo.relative_path(&module.path).to_path_buf();
            let parsed = match ParsedModule::parse(&module.source) {
                Ok(p) => Some(p),
                Err(err) => {
                    warn!("prompt: cannot re-parse {}: {}", rel.display(), err);
                    None
                }
            };
            let imports: Vec<String> = module.imports.iter().cloned().collect();

            for function in &module.functions {
                let context = code_context(parsed.as_ref(), function);
                if context.source == ContextSource::Missing {
                    misses += 1;
                    warn!("prompt: source of {} not found in {}", function, rel.display());
                }
                let documentation = correlator.find_related(function, docs);

                debug!(
                    "prompt: #{} {}::{} (context={:?}, docs={})",
                    requests.len(),
                    rel.display(),
                    function,
                    context.source,
                    documentation.is_some()
                );
                requests.push(PromptRequest {
                    function: function.clone(),
                    module: rel.clone(),
                    code_context: context.text,
                    context_source: context.source,
                    class_name: context.class_name,
                    documentation,
                    imports: imports.clone(),
                    category,
                    batch: requests.len(),
                });
            }
        }

        info!(
            "prompt: built {} {} prompts from {} modules (missing sources={})",
            requests.len(),
            category,
            repo.modules.len().min(max_modules),
            misses
        );
        Self { requests }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = PromptRecord<'_>> {
        self.requests.iter().map(|r| PromptRecord {
            file: r.module.to_string_lossy().into_owned(),
            function: &r.function,
            category: r.category,
            batch: r.batch,
            context: r.context_source,
            prompt: build_prompt(r),
        })
    }

    /// Write one JSON object per prompt to `path`.
    pub fn write_jsonl(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for rec in self.records() {
            serde_json::to_writer(&mut out, &rec)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        info!("prompt: wrote {} prompts to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use code_analyzer::{RepoAnalysis, analyze_source};
    use doc_correlator::parse_document;

    use super::*;

    fn repo() -> RepoAnalysis {
        let root = PathBuf::from("/repo");
        let calc = analyze_source(
            &root.join("calc.py"),
            "import math\n\ndef add(a, b):\n    return a + b\n\nclass Calc:\n    def mul(self, a, b):\n        return a * b\n",
        )
        .unwrap();
        let util = analyze_source(&root.join("util.py"), "def noop():\n    pass\n").unwrap();
        RepoAnalysis {
            root,
            modules: vec![calc, util],
            failures: Vec::new(),
        }
    }

    fn docs() -> DocIndex {
        DocIndex {
            docs: vec![parse_document(
                Path::new("README.md"),
                "# Calc\n\n### add\nCall add to add numbers; add never fails.\n",
            )],
        }
    }

    #[test]
    fn batch_indices_are_monotonic_and_order_is_stable() {
        let batch = PromptBatch::build(
            &repo(),
            &docs(),
            &DocCorrelator::default(),
            TestCategory::Unit,
            DEFAULT_MAX_MODULES,
        );
        let names: Vec<_> = batch.requests.iter().map(|r| r.function.as_str()).collect();
        assert_eq!(names, vec!["add", "mul", "noop"]);
        let idx: Vec<_> = batch.requests.iter().map(|r| r.batch).collect();
        assert_eq!(idx, vec![0, 1, 2]);
        assert_eq!(batch.requests[0].module, PathBuf::from("calc.py"));
        assert_eq!(batch.requests[1].context_source, ContextSource::EnclosingClass);
        assert_eq!(batch.requests[1].import_name(), "Calc");
    }

    #[test]
    fn add_prompt_carries_name_and_excerpt() {
        let batch = PromptBatch::build(&repo(), &docs(), &DocCorrelator::default(), TestCategory::Unit, 1);
        assert_eq!(batch.len(), 2);
        let add = &batch.requests[0];
        assert!(add.documentation.as_deref().unwrap().starts_with("### add"));
        let prompt = build_prompt(add);
        assert!(prompt.contains("# Function: add"));
        assert!(prompt.contains("Documentation:\n### add"));
        assert!(prompt.contains("# - math"));
    }

    #[test]
    fn jsonl_dump_has_one_line_per_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("prompts.jsonl");
        let batch = PromptBatch::build(&repo(), &docs(), &DocCorrelator::default(), TestCategory::Fuzz, 10);
        batch.write_jsonl(&out).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["function"], "add");
        assert_eq!(first["category"], "fuzz");
        assert_eq!(first["context"], "function");
    }
}
