//! Heading/section scanners for lightweight markup.
//!
//! Two independent line scanners:
//! - ATX headings (`## Title`): level is the `#` count, body runs to the next
//!   ATX heading of any level
//! - underline headings (`Title` over `=====`): body runs to the next
//!   underlined title
//!
//! Lines inside fenced code blocks never start a heading, so a `# comment`
//! in a Python example stays part of its section.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::examples::extract_examples;

/// Characters kept in [`DocInfo::raw`].
const RAW_PREVIEW_CHARS: usize = 1000;

const UNDERLINE_SYMBOLS: &[char] = &['=', '-', '`', '~', ':', '^', '\'', '"'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadingStyle {
    Atx { level: u8 },
    Underline { symbol: char },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocSection {
    pub heading: String,
    pub body: String,
    pub source: PathBuf,
    pub style: HeadingStyle,
    /// 0-based line of the heading title.
    #[serde(skip)]
    pub line: usize,
}

/// Parsed view of one documentation file.
#[derive(Debug, Clone, Serialize)]
pub struct DocInfo {
    pub path: PathBuf,
    pub headings: Vec<String>,
    /// All sections in document order, duplicates included.
    pub sections: Vec<DocSection>,
    pub examples: Vec<String>,
    pub raw: String,
}

impl DocInfo {
    /// Mapping-by-heading view: a duplicated heading keeps its last body.
    pub fn sections_by_heading(&self) -> HashMap<&str, &DocSection> {
        let mut map = HashMap::with_capacity(self.sections.len());
        for s in &self.sections {
            map.insert(s.heading.as_str(), s);
        }
        map
    }
}

/// Parse already truncated document text.
pub fn parse_document(path: &Path, text: &str) -> DocInfo {
    let lines: Vec<&str> = text.lines().collect();
    let fenced = fence_mask(&lines);

    let mut sections = atx_sections(path, &lines, &fenced);
    sections.extend(underline_sections(path, &lines, &fenced));
    sections.sort_by_key(|s| s.line);

    DocInfo {
        path: path.to_path_buf(),
        headings: sections.iter().map(|s| s.heading.clone()).collect(),
        sections,
        examples: extract_examples(text),
        raw: text.chars().take(RAW_PREVIEW_CHARS).collect(),
    }
}

/// `true` for every line that is a fence delimiter or sits inside a fence.
fn fence_mask(lines: &[&str]) -> Vec<bool> {
    let mut mask = Vec::with_capacity(lines.len());
    let mut open = false;
    for line in lines {
        let is_delim = line.trim_start().starts_with("```");
        if is_delim {
            mask.push(true);
            open = !open;
        } else {
            mask.push(open);
        }
    }
    mask
}

/// `(level, title)` when `line` is an ATX heading.
pub fn atx_heading(line: &str) -> Option<(u8, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let hashes = rest.len() - rest.trim_start_matches('#').len();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let after = &rest[hashes..];
    if !after.starts_with([' ', '\t']) {
        return None;
    }
    let title = after.trim();
    if title.is_empty() {
        return None;
    }
    Some((hashes as u8, title))
}

/// The repeated symbol when `line` is an underline (≥3 of one symbol).
pub fn underline_symbol(line: &str) -> Option<char> {
    let t = line.trim();
    let first = t.chars().next()?;
    if !UNDERLINE_SYMBOLS.contains(&first) {
        return None;
    }
    if t.chars().count() >= 3 && t.chars().all(|c| c == first) {
        Some(first)
    } else {
        None
    }
}

fn atx_sections(path: &Path, lines: &[&str], fenced: &[bool]) -> Vec<DocSection> {
    let heads: Vec<(usize, u8, &str)> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| !fenced[*i])
        .filter_map(|(i, l)| atx_heading(l).map(|(lvl, t)| (i, lvl, t)))
        .collect();

    heads
        .iter()
        .enumerate()
        .map(|(k, &(line, level, title))| {
            let end = heads.get(k + 1).map(|h| h.0).unwrap_or(lines.len());
            DocSection {
                heading: title.to_string(),
                body: join_trimmed(&lines[line + 1..end]),
                source: path.to_path_buf(),
                style: HeadingStyle::Atx { level },
                line,
            }
        })
        .collect()
}

fn underline_sections(path: &Path, lines: &[&str], fenced: &[bool]) -> Vec<DocSection> {
    // (title line, underline line, symbol)
    let mut heads: Vec<(usize, usize, char)> = Vec::new();
    for i in 1..lines.len() {
        if fenced[i] || fenced[i - 1] {
            continue;
        }
        let Some(symbol) = underline_symbol(lines[i]) else {
            continue;
        };
        let title = lines[i - 1].trim();
        if title.is_empty() || underline_symbol(title).is_some() {
            continue;
        }
        heads.push((i - 1, i, symbol));
    }

    heads
        .iter()
        .enumerate()
        .map(|(k, &(title_line, underline, symbol))| {
            let mut end = heads.get(k + 1).map(|h| h.0).unwrap_or(lines.len());
            // An overline belongs to the next title, not to this body.
            while end > underline + 1 && underline_symbol(lines[end - 1]).is_some() {
                end -= 1;
            }
            DocSection {
                heading: lines[title_line].trim().to_string(),
                body: join_trimmed(&lines[underline + 1..end]),
                source: path.to_path_buf(),
                style: HeadingStyle::Underline { symbol },
                line: title_line,
            }
        })
        .collect()
}

fn join_trimmed(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> DocInfo {
        parse_document(Path::new("README.md"), text)
    }

    #[test]
    fn atx_sections_run_to_next_heading_of_any_level() {
        let doc = parse("# Title\nintro\n## add\nadds numbers\n### detail\nmore\n");
        let headings: Vec<_> = doc.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Title", "add", "detail"]);
        assert_eq!(doc.sections[1].body, "adds numbers");
        assert_eq!(doc.sections[1].style, HeadingStyle::Atx { level: 2 });
        assert_eq!(doc.sections[2].body, "more");
    }

    #[test]
    fn atx_rejects_deep_indent_and_missing_space() {
        assert_eq!(atx_heading("   ## ok"), Some((2, "ok")));
        assert_eq!(atx_heading("    ## code"), None);
        assert_eq!(atx_heading("#nospace"), None);
        assert_eq!(atx_heading("####### seven"), None);
    }

    #[test]
    fn comments_inside_fences_are_not_headings() {
        let doc = parse("# Usage\n```python\n# not a heading\nx = 1\n```\nafter\n");
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections[0].body.contains("# not a heading"));
        assert!(doc.sections[0].body.ends_with("after"));
        assert_eq!(doc.examples.len(), 1);
    }

    #[test]
    fn underline_sections_run_to_next_title() {
        let text = "Intro\n=====\nfirst body\n\nUsage\n-----\nsecond body\n";
        let doc = parse(text);
        assert_eq!(doc.headings, vec!["Intro", "Usage"]);
        assert_eq!(doc.sections[0].body, "first body");
        assert_eq!(doc.sections[1].body, "second body");
        assert_eq!(doc.sections[1].style, HeadingStyle::Underline { symbol: '-' });
    }

    #[test]
    fn overlines_do_not_leak_into_previous_body() {
        let text = "=====\nOne\n=====\nbody one\n\n=====\nTwo\n=====\nbody two\n";
        let doc = parse(text);
        assert_eq!(doc.headings, vec!["One", "Two"]);
        assert_eq!(doc.sections[0].body, "body one");
    }

    #[test]
    fn mixed_symbols_are_not_underlines() {
        assert_eq!(underline_symbol("=-="), None);
        assert_eq!(underline_symbol("=="), None);
        assert_eq!(underline_symbol("  ^^^^  "), Some('^'));
    }

    #[test]
    fn duplicate_headings_keep_last_body_in_map_view() {
        let doc = parse("# api\nfirst\n# api\nsecond\n");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections_by_heading()["api"].body, "second");
    }
}
