use code_analyzer::{SyntaxErrorAt, first_syntax_error, parse_python};

/// Outcome of a syntax check. Never fails: parser setup problems are
/// reported as an invalid result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub error: Option<SyntaxErrorAt>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// `# SYNTAX ERROR ...` comment line for invalid code.
    pub fn diagnostic(&self) -> Option<String> {
        self.error.as_ref().map(|e| {
            format!(
                "# SYNTAX ERROR (line {}, column {}): {}",
                e.line, e.column, e.detail
            )
        })
    }
}

pub fn validate(code: &str) -> Validation {
    let error = match parse_python(code) {
        Ok(tree) => first_syntax_error(&tree, code),
        Err(err) => Some(SyntaxErrorAt {
            line: 1,
            column: 1,
            detail: err.to_string(),
        }),
    };
    Validation { error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_position_of_first_error() {
        assert!(validate("def test_ok():\n    assert 1\n").is_valid());
        let v = validate("def test_bad(:\n    assert 1\n");
        assert!(!v.is_valid());
        assert!(v.diagnostic().unwrap().starts_with("# SYNTAX ERROR (line 1"));
    }

    #[test]
    fn indentation_mistakes_are_invalid() {
        let v = validate("def f():\n    x = 1\n      y = 2\n");
        assert_eq!(
            v.diagnostic().as_deref(),
            Some("# SYNTAX ERROR (line 3, column 7): unexpected indent")
        );
        for code in [
            "def f():\nreturn 1\n",
            "with open('x') as fh:\nprint(fh)\n",
            "def test_add():\n    with pytest.raises(TypeError):\n    assert result is not None\n        add(None, 1)\n",
        ] {
            assert!(!validate(code).is_valid(), "{code}");
        }
    }
}
