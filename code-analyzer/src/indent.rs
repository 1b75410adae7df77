//! Indentation check over logical lines.
//!
//! Tree-sitter recovers from misplaced indentation without emitting
//! ERROR/MISSING nodes, so block structure is verified here the way the
//! Python tokenizer does it: an indent stack over logical lines, skipping
//! blank and comment-only lines, bracketed continuations, backslash
//! continuations and multi-line strings.

use crate::syntax::SyntaxErrorAt;

const TAB_WIDTH: usize = 8;

fn error(line: usize, column: usize, detail: &str) -> SyntaxErrorAt {
    SyntaxErrorAt {
        line,
        column: column + 1,
        detail: detail.to_string(),
    }
}

/// Indentation width (tabs to the next multiple of 8) and the index of the
/// first non-blank char.
fn leading_width(chars: &[char]) -> (usize, usize) {
    let mut width = 0;
    for (i, c) in chars.iter().enumerate() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
            '\x0c' => width = 0,
            _ => return (width, i),
        }
    }
    (width, chars.len())
}

/// First indentation error of `source`, if any:
/// - "unexpected indent"
/// - "expected an indented block" (a line ending in `:` with no deeper body)
/// - "unindent does not match any outer indentation level"
pub fn first_indentation_error(source: &str) -> Option<SyntaxErrorAt> {
    let mut stack: Vec<usize> = vec![0];
    let mut depth = 0usize;
    // (quote, triple)
    let mut string: Option<(char, bool)> = None;
    let mut continued = false;
    let mut expect_indent: Option<usize> = None;
    let mut last_sig: Option<char> = None;

    for (idx, raw) in source.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let lineno = idx + 1;
        let chars: Vec<char> = line.chars().collect();
        let logical_start = depth == 0 && string.is_none() && !continued;
        continued = false;

        let mut i = 0;
        if logical_start {
            let (width, first) = leading_width(&chars);
            if first == chars.len() || chars[first] == '#' {
                continue;
            }
            i = first;
            last_sig = None;

            let top = stack.last().copied().unwrap_or(0);
            if expect_indent.take().is_some() {
                if width <= top {
                    return Some(error(lineno, width, "expected an indented block"));
                }
                stack.push(width);
            } else if width > top {
                return Some(error(lineno, width, "unexpected indent"));
            } else if width < top {
                while stack.last().is_some_and(|&t| t > width) {
                    stack.pop();
                }
                if stack.last().copied() != Some(width) {
                    return Some(error(
                        lineno,
                        width,
                        "unindent does not match any outer indentation level",
                    ));
                }
            }
        }

        while i < chars.len() {
            let c = chars[i];
            if let Some((quote, triple)) = string {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == quote {
                    if !triple {
                        string = None;
                        last_sig = Some(quote);
                    } else if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                        string = None;
                        last_sig = Some(quote);
                        i += 3;
                        continue;
                    }
                }
                i += 1;
                continue;
            }

            match c {
                '#' => break,
                '"' | '\'' => {
                    let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                    string = Some((c, triple));
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                '\\' if i + 1 == chars.len() => {
                    continued = true;
                    i += 1;
                    continue;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            if !c.is_whitespace() {
                last_sig = Some(c);
            }
            i += 1;
        }

        // An unterminated single-quoted string ends with its line.
        if matches!(string, Some((_, false))) && !line.ends_with('\\') {
            string = None;
        }

        if depth == 0 && string.is_none() && !continued && last_sig == Some(':') {
            expect_indent = Some(lineno);
            last_sig = None;
        }
    }

    expect_indent.map(|header| error(header + 1, 0, "expected an indented block"))
}
