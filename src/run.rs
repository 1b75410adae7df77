//! End-to-end run: acquire, analyze, correlate, prompt, generate, repair,
//! persist, measure.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use ai_llm_service::OllamaService;
use anyhow::Context;
use code_analyzer::{ScanConfig, analyze_repo};
use coverage_mapper::{CoverageRecord, CoverageReport, CoverageRunner, attribute};
use doc_correlator::{DocCorrelator, DocIndex, DocReader, RelevanceConfig};
use project_code_store::acquire;
use prompt_synth::{PromptBatch, TestCategory, build_prompt};
use test_repair::{ArtifactOutcome, GeneratedArtifact, TESTS_DIR, TestWriter, repair_response};
use tokio::task;
use tracing::{info, instrument, warn};

pub const FUNCTION_COVERAGE_FILE: &str = "function_coverage.json";

/// Text generation backend for prompts.
pub trait Generator {
    fn generate(&self, prompt: &str) -> impl Future<Output = anyhow::Result<String>> + Send;
}

impl Generator for OllamaService {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(OllamaService::generate(self, prompt).await?)
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub repo: String,
    pub category: TestCategory,
    pub max_modules: usize,
    pub work_dir: PathBuf,
    pub keep_repo: bool,
    pub skip_coverage: bool,
    pub prompts_only: bool,
    pub prompts_out: Option<PathBuf>,
}

/// Counters reported at the end of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub modules: usize,
    pub functions: usize,
    pub prompts: usize,
    pub persisted: usize,
    pub with_diagnostic: usize,
    pub rejected: usize,
    pub coverage: Option<CoverageRecord>,
}

impl RunSummary {
    fn record(&mut self, outcome: ArtifactOutcome) {
        match outcome {
            ArtifactOutcome::Persisted => self.persisted += 1,
            ArtifactOutcome::PersistedWithDiagnostic => self.with_diagnostic += 1,
            ArtifactOutcome::Pending | ArtifactOutcome::Rejected => self.rejected += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run: modules={} functions={} prompts={} persisted={} with_diagnostic={} rejected={}",
            self.modules,
            self.functions,
            self.prompts,
            self.persisted,
            self.with_diagnostic,
            self.rejected
        )
    }
}

/// Run the whole pipeline for `opts.repo`.
///
/// Only acquisition and analysis failures abort; per-item failures are
/// logged and counted. A cloned tree is removed afterwards unless
/// `keep_repo` is set, whatever the outcome. `generator` may be `None` only
/// for a prompts-only run.
#[instrument(skip_all, fields(repo = %opts.repo, category = %opts.category))]
pub async fn run<G: Generator>(
    opts: &RunOptions,
    generator: Option<&G>,
) -> anyhow::Result<RunSummary> {
    let repo = acquire(&opts.repo, &opts.work_dir)
        .await
        .with_context(|| format!("cannot acquire repository '{}'", opts.repo))?;

    let outcome = process(&repo.path, opts, generator).await;

    if repo.cloned && opts.keep_repo {
        info!("keeping cloned repository at {}", repo.path.display());
    } else if let Err(err) = repo.cleanup() {
        warn!("cleanup failed: {err}");
    }
    outcome
}

async fn process<G: Generator>(
    root: &Path,
    opts: &RunOptions,
    generator: Option<&G>,
) -> anyhow::Result<RunSummary> {
    // Generated suites are output, not input.
    let mut scan = ScanConfig::from_env();
    scan.ignore_globs.push(format!("{TESTS_DIR}/**"));
    let analysis = analyze_repo(root, &scan)
        .with_context(|| format!("cannot analyze {}", root.display()))?;
    let mut summary = RunSummary {
        modules: analysis.modules.len(),
        functions: analysis.function_count(),
        ..RunSummary::default()
    };

    let docs = DocReader::new(root).read_docs().unwrap_or_else(|err| {
        warn!("documentation skipped: {err}");
        DocIndex::default()
    });
    let correlator = DocCorrelator::new(RelevanceConfig::from_env());

    let batch = PromptBatch::build(
        &analysis,
        &docs,
        &correlator,
        opts.category,
        opts.max_modules,
    );
    summary.prompts = batch.len();
    info!(
        "prompts: {} for {} modules ({} doc sections)",
        batch.len(),
        opts.max_modules.min(analysis.modules.len()),
        docs.sections().count()
    );

    if let Some(path) = &opts.prompts_out {
        batch
            .write_jsonl(path)
            .with_context(|| format!("cannot write prompts to {}", path.display()))?;
    }
    if opts.prompts_only {
        return Ok(summary);
    }
    let Some(generator) = generator else {
        anyhow::bail!("no generation service configured");
    };

    let writer = TestWriter::new(root)?;
    for request in &batch.requests {
        let artifacts = match generator.generate(&build_prompt(request)).await {
            Ok(raw) => repair_response(request, &raw),
            Err(err) => {
                warn!(
                    "generation failed for {} (batch {}): {err:#}",
                    request.function, request.batch
                );
                vec![GeneratedArtifact::rejected(request, "no response")]
            }
        };

        for mut artifact in artifacts {
            if let Err(err) = writer.persist(&mut artifact) {
                warn!("persist: skipped {}: {err}", request.function);
            }
            summary.record(artifact.outcome);
        }
    }

    if !opts.skip_coverage {
        summary.coverage = measure_coverage(root, &analysis).await;
    }
    Ok(summary)
}

/// Run the coverage tool and attribute its report. Failures are logged and
/// yield `None`.
async fn measure_coverage(
    root: &Path,
    analysis: &code_analyzer::RepoAnalysis,
) -> Option<CoverageRecord> {
    let runner = CoverageRunner::for_root(root);
    let report_path = match task::spawn_blocking(move || runner.run()).await {
        Ok(Ok(path)) => path,
        Ok(Err(err)) => {
            warn!("coverage: {err}");
            return None;
        }
        Err(err) => {
            warn!("coverage: task failed: {err}");
            return None;
        }
    };

    let report = match CoverageReport::load(&report_path) {
        Ok(r) => r,
        Err(err) => {
            warn!("coverage: {err}");
            return None;
        }
    };

    let record = attribute(&report, analysis);
    if let Err(err) = record.write_json(&root.join(FUNCTION_COVERAGE_FILE)) {
        warn!("coverage: {err}");
    }
    if !record.is_empty() {
        println!("{}", record.render_table());
    }
    Some(record)
}
