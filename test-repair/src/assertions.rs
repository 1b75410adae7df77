//! Assertion backstop for generated tests that never assert anything.

use regex::Regex;
use tracing::debug;

use crate::text::{indent_of, is_code_line};

/// Variable checked when no binding of the target call is found.
pub const DEFAULT_RESULT_VAR: &str = "result";

fn binding_var(code: &str, function: &str) -> Option<String> {
    let pattern = format!(r"(\w+)\s*=\s*(?:[\w.]+\.)?{}\s*\(", regex::escape(function));
    let re = Regex::new(&pattern).ok()?;
    re.captures(code).map(|c| c[1].to_string())
}

fn top_level_test_def(line: &str) -> bool {
    line.starts_with("def test") || line.starts_with("async def test")
}

fn is_return(line: &str) -> bool {
    let t = line.trim_start();
    t == "return" || t.starts_with("return ") || t.starts_with("return(")
}

/// Index after a definition's opening lines: the signature (up to the line
/// ending in `:`) plus the first body line. A first body line that opens a
/// block is not passed; the index then points at it.
fn after_opening(lines: &[&str], def_at: usize) -> (usize, Option<usize>) {
    let mut sig_end = def_at;
    while sig_end < lines.len() && !lines[sig_end].trim_end().ends_with(':') {
        sig_end += 1;
    }
    let body = (sig_end + 1..lines.len()).find(|&i| is_code_line(lines[i]));
    match body {
        Some(i) if lines[i].trim_end().ends_with(':') => (i, Some(indent_of(lines[i]))),
        Some(i) => (i + 1, Some(indent_of(lines[i]))),
        None => ((sig_end + 1).min(lines.len()), None),
    }
}

/// When `code` never mentions `assert` (statement, `self.assert*` or
/// `assert_*` helpers alike), insert a non-null / non-exception check
/// of the variable bound by a call to `function` (default `result`).
///
/// Scanning backward from the end, the block goes after the opening lines of
/// the last top-level test definition or before a trailing `return`,
/// whichever comes first; otherwise it is appended at the indentation of the
/// last code line. Idempotent.
pub fn ensure_assertions(code: &str, function: &str) -> String {
    if code.contains("assert") {
        return code.to_string();
    }

    let var = binding_var(code, function).unwrap_or_else(|| DEFAULT_RESULT_VAR.to_string());
    let checks = [
        format!("assert {var} is not None"),
        format!("assert not isinstance({var}, Exception)"),
    ];
    let lines: Vec<&str> = code.trim_end().lines().collect();

    let mut at: Option<(usize, usize)> = None;
    for i in (0..lines.len()).rev() {
        if top_level_test_def(lines[i]) {
            let (pos, indent) = after_opening(&lines, i);
            at = Some((pos, indent.unwrap_or(4)));
            break;
        }
        if is_return(lines[i]) {
            at = Some((i, indent_of(lines[i])));
            break;
        }
    }
    let (pos, indent) = at.unwrap_or_else(|| {
        let indent = lines
            .iter()
            .rev()
            .find(|l| is_code_line(l))
            .map(|l| indent_of(l))
            .unwrap_or(0);
        (lines.len(), indent)
    });

    debug!("repair: no assertion found, checking `{var}` at line {}", pos + 1);
    let pad = " ".repeat(indent);
    let block: Vec<String> = checks.iter().map(|c| format!("{pad}{c}")).collect();

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 2);
    out.extend_from_slice(&lines[..pos]);
    out.extend(block.iter().map(String::as_str));
    out.extend_from_slice(&lines[pos..]);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_after_opening_lines_of_last_test() {
        let code = "def test_add():\n    result = add(1, 2)\n    print(result)\n";
        let out = ensure_assertions(code, "add");
        assert_eq!(
            out,
            "def test_add():\n    result = add(1, 2)\n    assert result is not None\n    assert not isinstance(result, Exception)\n    print(result)"
        );
        assert_eq!(ensure_assertions(&out, "add"), out);
    }

    #[test]
    fn detects_bound_variable() {
        let code = "def test_area():\n    value = shape.area()\n";
        let out = ensure_assertions(code, "area");
        assert!(out.contains("    assert value is not None\n"));
        assert!(out.ends_with("    assert not isinstance(value, Exception)"));
    }

    #[test]
    fn trailing_return_wins_when_it_comes_last() {
        let code = "def helper():\n    x = 1\n    out = add(x, x)\n    return out";
        let out = ensure_assertions(code, "add");
        assert_eq!(
            out,
            "def helper():\n    x = 1\n    out = add(x, x)\n    assert out is not None\n    assert not isinstance(out, Exception)\n    return out"
        );
    }

    #[test]
    fn falls_back_to_appending_at_last_indentation() {
        let code = "class TestAdd:\n    def check(self):\n        add(1, 2)";
        let out = ensure_assertions(code, "add");
        assert!(out.ends_with("        assert result is not None\n        assert not isinstance(result, Exception)"));
    }

    #[test]
    fn code_with_assertions_is_untouched() {
        let code = "def test_add():\n    assert add(1, 1) == 2\n";
        assert_eq!(ensure_assertions(code, "add"), code);
    }

    #[test]
    fn assertion_helpers_count_as_assertions() {
        let unittest = "import unittest\n\nclass TestAdd(unittest.TestCase):\n    def test_add(self):\n        self.assertEqual(add(1, 2), 3)\n";
        assert_eq!(ensure_assertions(unittest, "add"), unittest);

        let numpy = "from numpy.testing import assert_allclose\n\ndef test_add():\n    assert_allclose(add(0.1, 0.2), 0.3)\n";
        assert_eq!(ensure_assertions(numpy, "add"), numpy);
    }

    #[test]
    fn block_opening_body_keeps_its_suite() {
        let code = "def test_add():\n    with pytest.raises(TypeError):\n        add(None, 1)";
        let out = ensure_assertions(code, "add");
        assert_eq!(
            out,
            "def test_add():\n    assert result is not None\n    assert not isinstance(result, Exception)\n    with pytest.raises(TypeError):\n        add(None, 1)"
        );
        assert!(crate::validate::validate(&out).is_valid());
    }
}
