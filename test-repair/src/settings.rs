//! `with settings(...):` blocks rewritten as `@settings(...)` decorators.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::text::{indent_of, strip_indent};

static WITH_SETTINGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)with\s+settings\s*\((?P<args>.*)\)\s*:\s*$").expect("valid settings regex")
});

fn is_def(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("def ") || t.starts_with("async def ")
}

/// Unwrap every single-line `with settings(...):` inside a test function:
/// the body is dedented into the function and the settings move to a
/// decorator directly above the definition.
pub fn normalize_settings(code: &str) -> String {
    let mut lines: Vec<String> = code.lines().map(str::to_string).collect();
    let mut from = 0;

    while let Some(at) = (from..lines.len()).find(|&i| WITH_SETTINGS.is_match(&lines[i])) {
        let with_indent = indent_of(&lines[at]);
        let args = WITH_SETTINGS
            .captures(&lines[at])
            .map(|c| c["args"].to_string())
            .unwrap_or_default();

        let Some(def_at) = (0..at)
            .rev()
            .find(|&i| is_def(&lines[i]) && indent_of(&lines[i]) < with_indent)
        else {
            from = at + 1;
            continue;
        };

        // Body: following lines indented deeper than the `with`, blanks included.
        let mut end = at + 1;
        while end < lines.len()
            && (lines[end].trim().is_empty() || indent_of(&lines[end]) > with_indent)
        {
            end += 1;
        }
        if lines[at + 1..end].iter().all(|l| l.trim().is_empty()) {
            from = at + 1;
            continue;
        }
        let body_indent = lines[at + 1..end]
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| indent_of(l))
            .min()
            .unwrap_or(with_indent);
        let shift = body_indent.saturating_sub(with_indent);

        let body: Vec<String> = lines[at + 1..end]
            .iter()
            .map(|l| {
                if l.trim().is_empty() {
                    String::new()
                } else {
                    strip_indent(l, shift).to_string()
                }
            })
            .collect();
        lines.splice(at..end, body);

        let already_decorated = (0..def_at)
            .rev()
            .take_while(|&i| lines[i].trim_start().starts_with('@'))
            .any(|i| lines[i].trim_start().starts_with("@settings"));
        if !already_decorated {
            let pad = " ".repeat(indent_of(&lines[def_at]));
            lines.insert(def_at, format!("{pad}@settings({args})"));
        }
        debug!("repair: moved settings({args}) to a decorator");
        from = def_at + 1;
    }

    lines.join("\n")
}
