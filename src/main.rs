use std::path::PathBuf;

use ai_llm_service::{OllamaService, config::default_config::config_from};
use clap::Parser;
use prompt_synth::{DEFAULT_MAX_MODULES, TestCategory};
use tracing::{error, info};

mod run;
mod telemetry;

use run::RunOptions;

/// Generate pytest suites for a Python repository with a local LLM.
#[derive(Debug, Parser)]
#[command(name = "llm-testgen", version, about)]
struct Cli {
    /// Local directory or Git URL of the repository under test.
    repo: String,

    /// Kind of tests to request.
    #[arg(long, default_value_t = TestCategory::Unit)]
    category: TestCategory,

    /// Number of modules (in discovery order) to generate tests for.
    #[arg(long, default_value_t = DEFAULT_MAX_MODULES)]
    max_modules: usize,

    /// Where remote repositories are cloned.
    #[arg(long, default_value = "code_data")]
    work_dir: PathBuf,

    /// Keep the cloned repository after the run.
    #[arg(long)]
    keep_repo: bool,

    /// Do not run coverage over the generated tests.
    #[arg(long)]
    skip_coverage: bool,

    /// Build prompts and stop before calling the model.
    #[arg(long)]
    prompts_only: bool,

    /// Write the prompts as JSON lines to this file.
    #[arg(long)]
    prompts_out: Option<PathBuf>,
}

impl From<Cli> for RunOptions {
    fn from(cli: Cli) -> Self {
        Self {
            repo: cli.repo,
            category: cli.category,
            max_modules: cli.max_modules,
            work_dir: cli.work_dir,
            keep_repo: cli.keep_repo,
            skip_coverage: cli.skip_coverage,
            prompts_only: cli.prompts_only,
            prompts_out: cli.prompts_out,
        }
    }
}

/// Model client for the run; `None` when the run stops before generation.
fn generation_service<F>(opts: &RunOptions, var: F) -> anyhow::Result<Option<OllamaService>>
where
    F: Fn(&str) -> Option<String>,
{
    if opts.prompts_only {
        return Ok(None);
    }
    let cfg = config_from(var)?;
    info!(model = %cfg.model, endpoint = %cfg.endpoint, "generation service");
    Ok(Some(OllamaService::new(cfg)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional: a missing .env is fine.
    dotenvy::dotenv().ok();
    telemetry::init("info");

    let opts = RunOptions::from(Cli::parse());

    let service = generation_service(&opts, |k| std::env::var(k).ok())?;

    match run::run(&opts, service.as_ref()).await {
        Ok(summary) => {
            info!("{summary}");
            Ok(())
        }
        Err(err) => {
            error!("run failed: {err:#}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_run_options() {
        let cli = Cli::try_parse_from([
            "llm-testgen",
            "https://github.com/org/calc.git",
            "--category",
            "Fuzz",
            "--max-modules",
            "3",
            "--keep-repo",
            "--prompts-out",
            "prompts.jsonl",
        ])
        .unwrap();
        let opts = RunOptions::from(cli);
        assert_eq!(opts.category, TestCategory::Fuzz);
        assert_eq!(opts.max_modules, 3);
        assert!(opts.keep_repo && !opts.skip_coverage && !opts.prompts_only);
        assert_eq!(opts.work_dir, PathBuf::from("code_data"));
        assert_eq!(opts.prompts_out, Some(PathBuf::from("prompts.jsonl")));
    }

    #[test]
    fn prompts_only_needs_no_model_config() {
        let bad_url = |k: &str| (k == "OLLAMA_URL").then(|| "gpu:11434".to_string());
        let cli = Cli::try_parse_from(["llm-testgen", ".", "--prompts-only"]).unwrap();
        let mut opts = RunOptions::from(cli);
        assert!(generation_service(&opts, bad_url).unwrap().is_none());

        opts.prompts_only = false;
        assert!(generation_service(&opts, bad_url).is_err());
        assert!(generation_service(&opts, |_| None).unwrap().is_some());
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(Cli::try_parse_from(["llm-testgen", ".", "--category", "smoke"]).is_err());
    }
}
