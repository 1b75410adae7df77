//! Missing framework imports and hallucinated module aliases.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::text::prepend_lines;

/// Module names models invent for "the code under test".
pub const HALLUCINATED_MODULES: &[&str] = &[
    "your_module",
    "my_module",
    "module",
    "mymodule",
    "your_module_name",
    "module_name",
    "source_module",
    "solution",
    "main",
];

/// `numpy.testing` helpers commonly called bare.
const NUMPY_HELPERS: &[&str] = &[
    "assert_allclose",
    "assert_array_equal",
    "assert_array_almost_equal",
    "assert_almost_equal",
    "assert_array_less",
];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid repair regex")
}

static PYTEST_USE: LazyLock<Regex> = LazyLock::new(|| re(r"(?:^|[^\w.])pytest\."));
static PYTEST_IMPORT: LazyLock<Regex> = LazyLock::new(|| re(r"(?m)^\s*import\s+pytest\b"));

static GIVEN_USE: LazyLock<Regex> = LazyLock::new(|| re(r"(?m)^\s*@given\b"));
static SETTINGS_USE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?m)(?:^\s*@settings\b|^\s*with\s+settings\s*\()"));
static STRATEGIES_USE: LazyLock<Regex> = LazyLock::new(|| re(r"(?:^|[^\w.])st\."));
static STRATEGIES_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?m)^\s*(?:from\s+hypothesis\s+import\s+[^\n]*\bstrategies\s+as\s+st\b|import\s+hypothesis\.strategies\s+as\s+st\b)")
});

static NUMPY_NP_USE: LazyLock<Regex> = LazyLock::new(|| re(r"(?:^|[^\w.])np\.testing\."));
static NUMPY_NP_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?m)^\s*import\s+numpy\s+as\s+np\b"));

/// `from <alias> import ...` / `import <alias> [as x]` for a hallucinated alias.
static ALIAS_FROM: LazyLock<Regex> = LazyLock::new(|| {
    re(&format!(
        r"(?m)^(?P<indent>[ \t]*)from\s+(?:{})\s+import\s+(?P<names>.+)$",
        HALLUCINATED_MODULES.join("|")
    ))
});
static ALIAS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    re(&format!(
        r"(?m)^(?P<indent>[ \t]*)import\s+(?P<alias>{})(?:\s+as\s+(?P<as>\w+))?\s*$",
        HALLUCINATED_MODULES.join("|")
    ))
});

/// `from hypothesis import a, b` holds `name`.
fn hypothesis_imports(code: &str, name: &str) -> bool {
    let pattern = format!(r"(?m)^\s*from\s+hypothesis\s+import\s+[^\n]*\b{name}\b");
    re(&pattern).is_match(code)
        || re(&format!(r"(?m)^\s*from\s+hypothesis\s+import\s+\([^)]*\b{name}\b")).is_match(code)
}

fn bare_call(code: &str, helper: &str) -> bool {
    re(&format!(r"(?:^|[^\w.]){helper}\s*\(")).is_match(code)
}

fn imports_name(code: &str, name: &str) -> bool {
    re(&format!(r"(?m)^\s*from\s+[\w.]+\s+import\s+[^\n]*\b{name}\b")).is_match(code)
}

/// Rewrite hallucinated module aliases to a relative import of
/// `module_stem`, then prepend imports for used-but-unimported pytest,
/// hypothesis and numpy.testing names. Idempotent.
pub fn repair_imports(code: &str, module_stem: &str) -> String {
    let code = rewrite_aliases(code, module_stem);
    let mut missing: Vec<String> = Vec::new();

    if PYTEST_USE.is_match(&code) && !PYTEST_IMPORT.is_match(&code) {
        missing.push("import pytest".to_string());
    }

    let hypothesis: Vec<&str> = [("given", &*GIVEN_USE), ("settings", &*SETTINGS_USE)]
        .into_iter()
        .filter(|(name, used)| used.is_match(&code) && !hypothesis_imports(&code, name))
        .map(|(name, _)| name)
        .collect();
    if !hypothesis.is_empty() {
        missing.push(format!("from hypothesis import {}", hypothesis.join(", ")));
    }
    if STRATEGIES_USE.is_match(&code) && !STRATEGIES_IMPORT.is_match(&code) {
        missing.push("from hypothesis import strategies as st".to_string());
    }

    let helpers: Vec<&str> = NUMPY_HELPERS
        .iter()
        .copied()
        .filter(|h| bare_call(&code, h) && !imports_name(&code, h))
        .collect();
    if !helpers.is_empty() {
        missing.push(format!("from numpy.testing import {}", helpers.join(", ")));
    }
    if NUMPY_NP_USE.is_match(&code) && !NUMPY_NP_IMPORT.is_match(&code) {
        missing.push("import numpy as np".to_string());
    }

    if missing.is_empty() {
        return code;
    }
    debug!("repair: prepending imports {:?}", missing);
    prepend_lines(&code, &missing)
}

fn rewrite_aliases(code: &str, module_stem: &str) -> String {
    let step = ALIAS_FROM.replace_all(code, |c: &regex::Captures| {
        format!("{}from .{} import {}", &c["indent"], module_stem, &c["names"])
    });
    ALIAS_IMPORT
        .replace_all(&step, |c: &regex::Captures| {
            let bound = c.name("as").map(|m| m.as_str()).unwrap_or(&c["alias"]);
            format!("{}from . import {} as {}", &c["indent"], module_stem, bound)
        })
        .into_owned()
}
