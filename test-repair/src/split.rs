//! One-test-per-file splitting for fuzz payloads.

fn is_test_def(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("def test") || t.starts_with("async def test")
}

fn is_decorator(line: &str) -> bool {
    line.trim_start().starts_with('@')
}

/// Split `code` into one chunk per `def test...`, each prefixed with the
/// shared preamble (everything above the first test and its decorators).
///
/// Code with fewer than two tests is returned as a single chunk.
pub fn split_tests(code: &str) -> Vec<String> {
    let lines: Vec<&str> = code.lines().collect();

    let starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_test_def(l))
        .map(|(i, _)| {
            let mut start = i;
            while start > 0 && is_decorator(lines[start - 1]) {
                start -= 1;
            }
            start
        })
        .collect();

    if starts.len() < 2 {
        return vec![code.to_string()];
    }

    let preamble = lines[..starts[0]].join("\n");
    let preamble = preamble.trim_end();

    starts
        .iter()
        .enumerate()
        .map(|(k, &start)| {
            let end = starts.get(k + 1).copied().unwrap_or(lines.len());
            let body = lines[start..end].join("\n");
            if preamble.is_empty() {
                body.trim_end().to_string()
            } else {
                format!("{preamble}\n\n\n{}", body.trim_end())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TESTS: &str = "from hypothesis import given, strategies as st\nfrom calc import add\n\n@given(st.integers())\ndef test_one(x):\n    assert add(x, 0) == x\n\n\n@given(st.integers(), st.integers())\n@settings(max_examples=10)\ndef test_two(a, b):\n    assert add(a, b) == add(b, a)\n";

    #[test]
    fn each_chunk_has_preamble_and_its_decorators() {
        let chunks = split_tests(TWO_TESTS);
        assert_eq!(chunks.len(), 2);
        for c in &chunks {
            assert!(c.starts_with("from hypothesis import given, strategies as st\nfrom calc import add\n"));
        }
        assert!(chunks[0].contains("@given(st.integers())\ndef test_one(x):"));
        assert!(!chunks[0].contains("test_two"));
        assert!(chunks[1].contains("@given(st.integers(), st.integers())\n@settings(max_examples=10)\ndef test_two"));
        assert!(!chunks[1].contains("test_one"));
    }

    #[test]
    fn single_test_is_not_split() {
        let code = "def test_only():\n    assert True";
        assert_eq!(split_tests(code), vec![code.to_string()]);
    }

    #[test]
    fn indented_definitions_are_detected() {
        let code = "class TestAdd:\n    def test_a(self):\n        assert 1\n\n    def test_b(self):\n        assert 2\n";
        let chunks = split_tests(code);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("class TestAdd:\n\n\n    def test_a"));
    }
}
