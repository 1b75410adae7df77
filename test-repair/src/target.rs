//! Canonical import of the function (or class) under test.

use std::path::{Component, Path};

use regex::Regex;
use tracing::debug;

use crate::text::prepend_lines;

fn is_import_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("import ") || t.starts_with("from ")
}

/// `sys.path` entry pointing from `<root>/tests` at the module's directory.
fn sys_path_line(module: &Path) -> String {
    let mut parts = vec!["os.path.dirname(__file__)".to_string(), "\"..\"".to_string()];
    if let Some(dir) = module.parent() {
        for c in dir.components() {
            if let Component::Normal(p) = c {
                parts.push(format!("\"{}\"", p.to_string_lossy()));
            }
        }
    }
    format!(
        "sys.path.insert(0, os.path.abspath(os.path.join({})))",
        parts.join(", ")
    )
}

/// The import lines a test needs to reach `name` defined in `module`
/// (root-relative path).
pub fn canonical_block(module: &Path, name: &str) -> Vec<String> {
    vec![
        "import os".to_string(),
        "import sys".to_string(),
        sys_path_line(module),
        format!("from {} import {}", code_analyzer::module_stem(module), name),
    ]
}

/// Ensure `name` is imported from its real module when the code uses it.
///
/// Other import lines mentioning `name` are dropped and the full canonical
/// block is prepended; top-level `import os` / `import sys` lines of the
/// payload are removed so the block's own imports come first. Idempotent.
pub fn inject_target_import(code: &str, name: &str, module: &Path) -> String {
    let stem = code_analyzer::module_stem(module);
    let word = Regex::new(&format!(r"\b{}\b", regex::escape(name))).expect("valid name regex");
    let direct = Regex::new(&format!(
        r"(?m)^\s*from\s+{}\s+import\s+[^\n]*\b{}\b",
        regex::escape(stem),
        regex::escape(name)
    ))
    .expect("valid import regex");

    let used = code
        .lines()
        .any(|l| !is_import_line(l) && !l.trim_start().starts_with('#') && word.is_match(l));
    if !used || direct.is_match(code) {
        return code.to_string();
    }

    let block = canonical_block(module, name);
    let kept: Vec<&str> = code
        .lines()
        .filter(|l| !(is_import_line(l) && word.is_match(l)))
        .filter(|l| !matches!(l.trim_end(), "import os" | "import sys"))
        .collect();

    debug!("repair: importing {} from {}", name, stem);
    prepend_lines(&kept.join("\n"), &block)
}
