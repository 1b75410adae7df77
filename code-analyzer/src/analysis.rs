//! Module-level queries over the lowered tree: inventories, exact source
//! extraction and function spans.

use std::collections::BTreeSet;
use std::path::Path;

use crate::errors::Result;
use crate::syntax::{NodeKind, SyntaxNode, Visitor, first_syntax_error, lower, parse_python, walk};
use crate::types::{FunctionSpan, ModuleAnalysis, ModuleError};
use crate::AnalyzerError;

/// A syntactically valid module together with its lowered tree.
pub struct ParsedModule<'s> {
    source: &'s str,
    root: SyntaxNode,
}

impl<'s> ParsedModule<'s> {
    /// Parse `source`; any ERROR/MISSING node or indentation error yields
    /// [`AnalyzerError::Syntax`].
    pub fn parse(source: &'s str) -> Result<Self> {
        let tree = parse_python(source)?;
        if let Some(err) = first_syntax_error(&tree, source) {
            return Err(err.into());
        }
        Ok(Self {
            source,
            root: lower(&tree, source),
        })
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }

    /// First function named `name` in depth-first order, with its direct parent.
    pub fn find_function(&self, name: &str) -> Option<(&SyntaxNode, Option<&SyntaxNode>)> {
        struct Finder<'a, 'n> {
            name: &'n str,
            hit: Option<(&'a SyntaxNode, Option<&'a SyntaxNode>)>,
        }

        impl<'a> Visitor<'a> for Finder<'a, '_> {
            fn enter(&mut self, node: &'a SyntaxNode, parent: Option<&'a SyntaxNode>) -> bool {
                if node.function_name() == Some(self.name) {
                    self.hit = Some((node, parent));
                    return false;
                }
                true
            }
        }

        let mut finder = Finder { name, hit: None };
        walk(&self.root, &mut finder);
        finder.hit
    }

    /// Exact source text of the first function named `name`.
    pub fn function_source(&self, name: &str) -> Option<&'s str> {
        let (node, _) = self.find_function(name)?;
        Some(node.span.slice_text(self.source).trim_end())
    }

    /// Source of the class directly defining the first function named `name`.
    pub fn enclosing_class_source(&self, name: &str) -> Option<&'s str> {
        let (_, parent) = self.find_function(name)?;
        let class = parent.filter(|p| p.class_name().is_some())?;
        Some(class.span.slice_text(self.source).trim_end())
    }

    /// Every function definition with its inclusive line range.
    pub fn function_spans(&self, module: &Path) -> Vec<FunctionSpan> {
        struct Spans<'p> {
            module: &'p Path,
            out: Vec<FunctionSpan>,
        }

        impl<'a> Visitor<'a> for Spans<'_> {
            fn enter(&mut self, node: &'a SyntaxNode, parent: Option<&'a SyntaxNode>) -> bool {
                if let Some(name) = node.function_name() {
                    if node.span.line_count() > 0 {
                        self.out.push(FunctionSpan {
                            name: name.to_string(),
                            module: self.module.to_path_buf(),
                            start_line: node.span.start_line,
                            end_line: node.span.end_line,
                            class: parent.and_then(|p| p.class_name()).map(str::to_string),
                        });
                    }
                }
                true
            }
        }

        let mut v = Spans {
            module,
            out: Vec::new(),
        };
        walk(&self.root, &mut v);
        v.out
    }

    fn inventory(&self) -> (Vec<String>, Vec<String>, BTreeSet<String>) {
        #[derive(Default)]
        struct Inventory {
            functions: Vec<String>,
            classes: Vec<String>,
            imports: BTreeSet<String>,
        }

        impl<'a> Visitor<'a> for Inventory {
            fn enter(&mut self, node: &'a SyntaxNode, _parent: Option<&'a SyntaxNode>) -> bool {
                match &node.kind {
                    NodeKind::FunctionDef { name } => {
                        if !self.functions.iter().any(|f| f == name) {
                            self.functions.push(name.clone());
                        }
                    }
                    NodeKind::ClassDef { name } => self.classes.push(name.clone()),
                    NodeKind::Import { names } => self.imports.extend(names.iter().cloned()),
                    NodeKind::Module | NodeKind::Other => {}
                }
                true
            }
        }

        let mut inv = Inventory::default();
        walk(&self.root, &mut inv);
        (inv.functions, inv.classes, inv.imports)
    }
}

/// Build the inventory of one module, or a per-module error record.
pub fn analyze_source(path: &Path, source: &str) -> std::result::Result<ModuleAnalysis, ModuleError> {
    let parsed = ParsedModule::parse(source).map_err(|e| module_error(path, e))?;
    let (functions, classes, imports) = parsed.inventory();
    Ok(ModuleAnalysis {
        path: path.to_path_buf(),
        functions,
        classes,
        imports,
        source: source.to_string(),
    })
}

/// Exact source slice of the first function named `name` (depth-first), or
/// `None` when absent.
pub fn extract_function<'s>(source: &'s str, name: &str) -> Result<Option<&'s str>> {
    Ok(ParsedModule::parse(source)?.function_source(name))
}

/// Source slice of the smallest class enclosing `function_name` when it is a
/// method, `None` otherwise.
pub fn extract_class_containing<'s>(source: &'s str, function_name: &str) -> Result<Option<&'s str>> {
    Ok(ParsedModule::parse(source)?.enclosing_class_source(function_name))
}

/// All function spans of a module.
pub fn function_spans(module: &Path, source: &str) -> Result<Vec<FunctionSpan>> {
    Ok(ParsedModule::parse(source)?.function_spans(module))
}

pub(crate) fn module_error(path: &Path, err: AnalyzerError) -> ModuleError {
    match err {
        AnalyzerError::Syntax {
            line,
            column,
            detail,
        } => ModuleError {
            path: path.to_path_buf(),
            line: Some(line),
            column: Some(column),
            message: format!("syntax error: {detail}"),
        },
        other => ModuleError {
            path: path.to_path_buf(),
            line: None,
            column: None,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"import os
from math import sqrt

def add(a, b):
    return a + b


class Shape:
    """A shape."""

    def area(self):
        return 0

    @property
    def name(self):
        return "shape"


class Circle(Shape):
    def area(self):
        return 3.14 * self.r ** 2


def outer():
    def helper(x):
        return x * 2
    return helper(21)
"#;

    #[test]
    fn inventory_keeps_declaration_order_and_uniqueness() {
        let m = analyze_source(Path::new("pkg/shapes.py"), SAMPLE).unwrap();
        assert_eq!(m.functions, vec!["add", "area", "name", "outer", "helper"]);
        assert_eq!(m.classes, vec!["Shape", "Circle"]);
        assert!(m.imports.contains("os"));
        assert!(m.imports.contains("math.sqrt"));
        assert_eq!(m.stem(), "shapes");
    }

    #[test]
    fn extract_function_returns_exact_slice() {
        let text = extract_function(SAMPLE, "add").unwrap().unwrap();
        assert_eq!(text, "def add(a, b):\n    return a + b");
        assert_eq!(extract_function(SAMPLE, "missing").unwrap(), None);
    }

    #[test]
    fn duplicate_names_resolve_to_first_in_depth_first_order() {
        let text = extract_function(SAMPLE, "area").unwrap().unwrap();
        assert_eq!(text, "def area(self):\n        return 0");
        let class = extract_class_containing(SAMPLE, "area").unwrap().unwrap();
        assert!(class.starts_with("class Shape:"));
        assert!(!class.contains("Circle"));
    }

    #[test]
    fn extracted_functions_reparse_and_keep_their_name() {
        let m = analyze_source(Path::new("shapes.py"), SAMPLE).unwrap();
        for name in &m.functions {
            let text = extract_function(SAMPLE, name).unwrap().unwrap();
            let parsed = ParsedModule::parse(text).expect("extracted text parses");
            let (node, parent) = parsed.find_function(name).expect("name survives");
            assert!(parent.map(|p| p.kind == NodeKind::Module).unwrap_or(false));
            assert_eq!(node.function_name(), Some(name.as_str()));
        }
    }

    #[test]
    fn class_lookup_is_none_for_free_and_nested_functions() {
        assert_eq!(extract_class_containing(SAMPLE, "add").unwrap(), None);
        assert_eq!(extract_class_containing(SAMPLE, "helper").unwrap(), None);
    }

    #[test]
    fn spans_are_non_empty_and_within_module() {
        let spans = function_spans(Path::new("shapes.py"), SAMPLE).unwrap();
        let total = SAMPLE.lines().count();
        assert_eq!(spans.len(), 6);
        for s in &spans {
            assert!(s.line_count() > 0);
            assert!(s.end_line <= total, "{s:?} exceeds {total}");
        }
        let add = &spans[0];
        assert_eq!((add.start_line, add.end_line), (4, 5));
        let circle_area = spans
            .iter()
            .find(|s| s.class.as_deref() == Some("Circle"))
            .unwrap();
        assert_eq!(circle_area.qualified_name(), "Circle.area");
    }

    #[test]
    fn malformed_module_yields_error_record() {
        let err = analyze_source(Path::new("bad.py"), "def f(:\n  pass\n").unwrap_err();
        assert_eq!(err.line, Some(1));
        assert!(err.message.starts_with("syntax error"));
    }

    #[test]
    fn misindented_module_yields_error_record() {
        let err = analyze_source(Path::new("bad.py"), "def f():\n    x = 1\n      y = 2\n").unwrap_err();
        assert_eq!((err.line, err.column), (Some(3), Some(7)));
        assert_eq!(err.message, "syntax error: unexpected indent");

        let err = analyze_source(Path::new("bad.py"), "def f():\nreturn 1\n").unwrap_err();
        assert_eq!(err.line, Some(2));
        assert!(err.message.contains("expected an indented block"));
    }
}
