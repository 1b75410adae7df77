//! Fixed-order repair of one model response.

use prompt_synth::{PromptRequest, TestCategory};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assertions::ensure_assertions;
use crate::imports::repair_imports;
use crate::payload::extract_payload;
use crate::settings::normalize_settings;
use crate::split::split_tests;
use crate::target::inject_target_import;
use crate::validate::validate;

/// Terminal state of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// Repaired, not yet written.
    Pending,
    Persisted,
    /// Written with a leading syntax diagnostic.
    PersistedWithDiagnostic,
    /// Nothing usable came back.
    Rejected,
}

/// Generated test code traced to the request it answers.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedArtifact {
    pub request: PromptRequest,
    /// Chunk index for split fuzz payloads.
    pub chunk: Option<usize>,
    pub raw_response: String,
    /// Syntax validity of the extracted payload, before repair.
    pub payload_valid: bool,
    pub code: String,
    /// Syntax validity of `code`.
    pub valid: bool,
    pub diagnostic: Option<String>,
    pub file: Option<std::path::PathBuf>,
    pub outcome: ArtifactOutcome,
}

impl GeneratedArtifact {
    /// Artifact for a request the generation service did not answer.
    pub fn rejected(request: &PromptRequest, reason: impl Into<String>) -> Self {
        Self {
            request: request.clone(),
            chunk: None,
            raw_response: String::new(),
            payload_valid: false,
            code: String::new(),
            valid: false,
            diagnostic: Some(reason.into()),
            file: None,
            outcome: ArtifactOutcome::Rejected,
        }
    }
}

/// Run the repair stages over `raw`:
/// payload, validation, import repair, target import, split (fuzz),
/// assertion backstop, settings normalization (fuzz).
///
/// Yields one artifact per chunk; an empty payload yields a single rejected
/// artifact.
pub fn repair_response(request: &PromptRequest, raw: &str) -> Vec<GeneratedArtifact> {
    let payload = extract_payload(raw);
    if payload.trim().is_empty() {
        warn!(
            "repair: empty payload for {} (batch {})",
            request.function, request.batch
        );
        let mut rejected = GeneratedArtifact::rejected(request, "empty payload");
        rejected.raw_response = raw.to_string();
        return vec![rejected];
    }

    let payload_valid = validate(&payload).is_valid();
    if !payload_valid {
        debug!("repair: payload for {} does not parse as-is", request.function);
    }

    let code = repair_imports(&payload, request.module_stem());
    let code = inject_target_import(&code, request.import_name(), &request.module);

    let fuzz = request.category == TestCategory::Fuzz;
    let chunks = if fuzz { split_tests(&code) } else { vec![code] };

    let artifacts: Vec<GeneratedArtifact> = chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut code = ensure_assertions(&chunk, &request.function);
            if fuzz {
                code = normalize_settings(&code);
            }
            let check = validate(&code);
            GeneratedArtifact {
                request: request.clone(),
                chunk: fuzz.then_some(i),
                raw_response: raw.to_string(),
                payload_valid,
                valid: check.is_valid(),
                diagnostic: check.diagnostic(),
                code,
                file: None,
                outcome: ArtifactOutcome::Pending,
            }
        })
        .collect();

    info!(
        "repair: {} (batch {}) -> chunks={} valid={}",
        request.function,
        request.batch,
        artifacts.len(),
        artifacts.iter().filter(|a| a.valid).count()
    );
    artifacts
}
