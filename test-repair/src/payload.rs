//! Code payload extraction from a raw model response.

const FENCE: &str = "```";

/// Code inside the first fenced block (language tag skipped).
///
/// No fence yields the whole response; an unterminated fence yields the rest
/// of the response after the opening line.
pub fn extract_payload(raw: &str) -> String {
    let Some(open) = raw.find(FENCE) else {
        return tidy(raw);
    };
    let after_tag = &raw[open + FENCE.len()..];
    let body = match after_tag.find('\n') {
        Some(nl) => &after_tag[nl + 1..],
        // Opening fence is the last line: nothing left to take.
        None => "",
    };
    match body.find(FENCE) {
        Some(close) => tidy(&body[..close]),
        None => tidy(body),
    }
}

fn tidy(code: &str) -> String {
    code.trim_start_matches(['\n', '\r']).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fenced_block_wins() {
        let raw = "Here you go:\n```python\ndef test_a():\n    assert 1\n```\nand\n```\nother\n```";
        assert_eq!(extract_payload(raw), "def test_a():\n    assert 1");
    }

    #[test]
    fn unfenced_response_is_taken_whole() {
        assert_eq!(extract_payload("\n\ndef test_a():\n    pass\n\n"), "def test_a():\n    pass");
    }

    #[test]
    fn unterminated_fence_takes_the_rest() {
        let raw = "text\n```py\nimport pytest\n\ndef test_b():\n    assert True\n";
        assert_eq!(extract_payload(raw), "import pytest\n\ndef test_b():\n    assert True");
    }

    #[test]
    fn indentation_of_first_line_is_kept() {
        assert_eq!(extract_payload("```\n    x = 1\n```"), "    x = 1");
    }
}
