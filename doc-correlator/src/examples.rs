//! Code example extraction, independent of heading association.
//!
//! Two shapes are collected:
//! - fenced blocks (```` ``` ```` ... ```` ``` ````, delimiters included)
//! - reStructuredText literal blocks: a line ending in `::`, a blank line,
//!   then lines indented by four spaces or a tab

use std::sync::LazyLock;

use regex::Regex;

static FENCED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid fenced-block regex"));

pub fn extract_examples(text: &str) -> Vec<String> {
    let mut out: Vec<String> = FENCED
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    out.extend(literal_blocks(text));
    out
}

fn literal_blocks(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i + 2 < lines.len() {
        let opens = lines[i].trim_end().ends_with("::")
            && lines[i + 1].trim().is_empty()
            && is_indented(lines[i + 2]);
        if !opens {
            i += 1;
            continue;
        }

        let mut end = i + 2;
        while end < lines.len() && (is_indented(lines[end]) || lines[end].trim().is_empty()) {
            end += 1;
        }
        let block = lines[i + 2..end].join("\n");
        out.push(block.trim_end().to_string());
        i = end;
    }
    out
}

fn is_indented(line: &str) -> bool {
    (line.starts_with("    ") || line.starts_with('\t')) && !line.trim().is_empty()
}
