//! Repository walk: discovers Python modules and analyzes each one.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use crate::analysis::analyze_source;
use crate::errors::{AnalyzerError, Result};
use crate::types::{ModuleError, RepoAnalysis};

/// Default max readable file size (bytes).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root-relative glob patterns excluded from the scan.
    pub ignore_globs: Vec<String>,
    pub max_file_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_globs: Vec::new(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl ScanConfig {
    /// Reads `TESTGEN_IGNORE_GLOBS` (comma-separated) and
    /// `TESTGEN_MAX_FILE_BYTES`; unset or invalid values keep defaults.
    pub fn from_env() -> Self {
        let ignore_globs = std::env::var("TESTGEN_IGNORE_GLOBS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let max_file_bytes = std::env::var("TESTGEN_MAX_FILE_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_FILE_BYTES);
        Self {
            ignore_globs,
            max_file_bytes,
        }
    }
}

/// List `.py` files under `root` in a stable (sorted) order.
pub fn scan_python_files(root: &Path, cfg: &ScanConfig) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(AnalyzerError::MissingRoot(root.to_path_buf()));
    }
    let ignore = build_globset(&cfg.ignore_globs)?;

    let mut files = Vec::new();
    let mut skipped_ignored = 0usize;
    let mut skipped_too_big = 0usize;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep_entry);

    for entry in walker.filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(path);
        if ignore.as_ref().is_some_and(|gs| gs.is_match(rel)) {
            skipped_ignored += 1;
            debug!("fs_scan: ignore (glob) {}", rel.display());
            continue;
        }

        match entry.metadata() {
            Ok(meta) if meta.len() > cfg.max_file_bytes => {
                skipped_too_big += 1;
                debug!(
                    "fs_scan: skip (size {} > max {}) {}",
                    meta.len(),
                    cfg.max_file_bytes,
                    rel.display()
                );
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                warn!("fs_scan: metadata failed for {}: {}", path.display(), err);
                continue;
            }
        }

        files.push(path.to_path_buf());
    }

    info!(
        "fs_scan: done, python files={} (ignored={}, too_big={})",
        files.len(),
        skipped_ignored,
        skipped_too_big
    );
    Ok(files)
}

/// Scan and analyze every Python module under `root`.
///
/// Unreadable or malformed modules become [`ModuleError`] records; the scan
/// continues with the remaining files.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn analyze_repo(root: &Path, cfg: &ScanConfig) -> Result<RepoAnalysis> {
    let files = scan_python_files(root, cfg)?;
    let mut out = RepoAnalysis {
        root: root.to_path_buf(),
        ..RepoAnalysis::default()
    };

    for path in files {
        let source = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(err) => {
                warn!("analyze: cannot read {}: {}", path.display(), err);
                out.failures.push(ModuleError {
                    path,
                    line: None,
                    column: None,
                    message: format!("read failed: {err}"),
                });
                continue;
            }
        };

        match analyze_source(&path, &source) {
            Ok(module) => {
                debug!(
                    "analyze: {} -> functions={} classes={} imports={}",
                    path.display(),
                    module.functions.len(),
                    module.classes.len(),
                    module.imports.len()
                );
                out.modules.push(module);
            }
            Err(failure) => {
                warn!("analyze: skipping module, {failure}");
                out.failures.push(failure);
            }
        }
    }

    info!(
        "analyze: modules={} functions={} failures={}",
        out.modules.len(),
        out.function_count(),
        out.failures.len()
    );
    Ok(out)
}

/// Skip heavy/vendor directories early.
fn keep_entry(entry: &DirEntry) -> bool {
    if entry.depth() > 0 && entry.file_type().is_dir() {
        if let Some(name) = entry.file_name().to_str() {
            return !matches!(
                name,
                ".git"
                    | "node_modules"
                    | "build"
                    | "dist"
                    | "target"
                    | "__pycache__"
                    | ".venv"
                    | "venv"
                    | ".tox"
                    | ".mypy_cache"
                    | ".pytest_cache"
                    | "site-packages"
                    | ".idea"
                    | ".vscode"
            );
        }
    }
    true
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| AnalyzerError::InvalidGlob {
            pattern: pat.clone(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| AnalyzerError::InvalidGlob {
            pattern: patterns.join(","),
            reason: e.to_string(),
        })
}
