//! Line helpers shared by the repair stages.

/// Leading whitespace, in chars.
pub fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// `line` without up to `n` leading spaces or tabs.
pub fn strip_indent(line: &str, n: usize) -> &str {
    let mut at = 0;
    for (i, c) in line.char_indices().take(n) {
        if c != ' ' && c != '\t' {
            break;
        }
        at = i + c.len_utf8();
    }
    &line[at..]
}

/// Blank lines and comments carry no code.
pub fn is_code_line(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && !t.starts_with('#')
}

/// Index of the first line new imports may go before: after a shebang,
/// an encoding cookie and any `from __future__` imports.
fn header_end(lines: &[&str]) -> usize {
    let mut i = 0;
    while i < lines.len() {
        let t = lines[i].trim_start();
        let keep = (i == 0 && t.starts_with("#!"))
            || (t.starts_with('#') && t.contains("coding"))
            || t.starts_with("from __future__ import");
        if !keep {
            break;
        }
        i += 1;
    }
    i
}

/// Insert `new_lines` at the top of `code`, below its header.
pub fn prepend_lines(code: &str, new_lines: &[String]) -> String {
    if new_lines.is_empty() {
        return code.to_string();
    }
    let lines: Vec<&str> = code.lines().collect();
    let at = header_end(&lines);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + new_lines.len());
    out.extend_from_slice(&lines[..at]);
    out.extend(new_lines.iter().map(String::as_str));
    out.extend_from_slice(&lines[at..]);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_is_measured_in_chars() {
        assert_eq!(indent_of("\u{3000}\u{3000}x = 1"), 2);
        assert_eq!(strip_indent("      y = 2", 2), "    y = 2");
        assert_eq!(strip_indent("\tz", 4), "z");
        assert_eq!(strip_indent("\u{3000}\u{3000}x = 1", 2), "\u{3000}\u{3000}x = 1");
        assert_eq!(strip_indent("  ", 8), "");
    }

    #[test]
    fn imports_go_below_future_imports() {
        let code = "#!/usr/bin/env python\nfrom __future__ import annotations\nx = 1";
        let out = prepend_lines(code, &["import os".to_string()]);
        assert_eq!(
            out,
            "#!/usr/bin/env python\nfrom __future__ import annotations\nimport os\nx = 1"
        );
    }
}
