//! Python parsing and the lowered definition tree.
//!
//! Tree-sitter yields a full concrete tree. Downstream stages only care about
//! definitions and imports, so the tree is lowered into [`SyntaxNode`]:
//! - `block` and `decorated_definition` are transparent (their children are
//!   hoisted), so a method's direct parent is its `ClassDef`
//! - any other compound statement survives as `Other` only when it contains
//!   something worth keeping (e.g. defs under `if TYPE_CHECKING:`)

use tree_sitter::{Language, Node, Parser, Tree};

use crate::errors::{AnalyzerError, Result};
use crate::indent::first_indentation_error;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Module,
    ClassDef { name: String },
    FunctionDef { name: String },
    Import { names: Vec<String> },
    Other,
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn function_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::FunctionDef { name } => Some(name),
            _ => None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::ClassDef { name } => Some(name),
            _ => None,
        }
    }
}

/// Position of the first ERROR/MISSING node of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorAt {
    pub line: usize,
    pub column: usize,
    pub detail: String,
}

impl From<SyntaxErrorAt> for AnalyzerError {
    fn from(e: SyntaxErrorAt) -> Self {
        AnalyzerError::Syntax {
            line: e.line,
            column: e.column,
            detail: e.detail,
        }
    }
}

/// Parse Python source with tree-sitter. Never fails on bad syntax: the
/// returned tree carries ERROR nodes instead (see [`first_syntax_error`]).
pub fn parse_python(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    let language: Language = tree_sitter_python::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|_| AnalyzerError::TreeSitterLanguage)?;
    parser
        .parse(source, None)
        .ok_or(AnalyzerError::TreeSitterParse)
}

/// Locate the first syntax error in document order, if any: ERROR/MISSING
/// nodes of `tree` or misplaced indentation in `source` (which tree-sitter
/// silently recovers from).
pub fn first_syntax_error(tree: &Tree, source: &str) -> Option<SyntaxErrorAt> {
    let from_tree = first_tree_error(tree);
    let from_indent = first_indentation_error(source);
    match (from_tree, from_indent) {
        (Some(a), Some(b)) => Some(if (b.line, b.column) <= (a.line, a.column) { b } else { a }),
        (a, b) => a.or(b),
    }
}

fn first_tree_error(tree: &Tree) -> Option<SyntaxErrorAt> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            let detail = if node.is_missing() {
                format!("missing `{}`", node.kind())
            } else {
                "unexpected input".to_string()
            };
            return Some(SyntaxErrorAt {
                line: pos.row + 1,
                column: pos.column + 1,
                detail,
            });
        }
        let mut cursor = node.walk();
        let faulty: Vec<Node> = node
            .children(&mut cursor)
            .filter(|c| c.has_error())
            .collect();
        stack.extend(faulty.into_iter().rev());
    }

    let pos = root.start_position();
    Some(SyntaxErrorAt {
        line: pos.row + 1,
        column: pos.column + 1,
        detail: "unexpected input".to_string(),
    })
}

/// `true` when `source` parses as a Python module without errors.
pub fn is_valid_python(source: &str) -> bool {
    match parse_python(source) {
        Ok(tree) => first_syntax_error(&tree, source).is_none(),
        Err(_) => false,
    }
}

/// Lower a tree-sitter tree into a [`SyntaxNode`] rooted at `Module`.
pub fn lower(tree: &Tree, source: &str) -> SyntaxNode {
    let root = tree.root_node();
    let mut span = Span::of_node(root);
    span.start_line = 1;
    span.end_line = span.end_line.max(source.lines().count()).max(1);
    SyntaxNode {
        kind: NodeKind::Module,
        span,
        children: lower_children(root, source),
    }
}

fn lower_children(node: Node<'_>, source: &str) -> Vec<SyntaxNode> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        lower_into(child, source, &mut out);
    }
    out
}

fn lower_into(node: Node<'_>, source: &str, out: &mut Vec<SyntaxNode>) {
    match node.kind() {
        "class_definition" => out.push(SyntaxNode {
            kind: NodeKind::ClassDef {
                name: field_text(node, "name", source),
            },
            span: Span::of_node(node),
            children: lower_children(node, source),
        }),
        "function_definition" => out.push(SyntaxNode {
            kind: NodeKind::FunctionDef {
                name: field_text(node, "name", source),
            },
            span: Span::of_node(node),
            children: lower_children(node, source),
        }),
        "import_statement" | "import_from_statement" | "future_import_statement" => {
            out.push(SyntaxNode {
                kind: NodeKind::Import {
                    names: import_names(node, source),
                },
                span: Span::of_node(node),
                children: Vec::new(),
            })
        }
        "block" | "decorated_definition" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                lower_into(child, source, out);
            }
        }
        _ => {
            let children = lower_children(node, source);
            if !children.is_empty() {
                out.push(SyntaxNode {
                    kind: NodeKind::Other,
                    span: Span::of_node(node),
                    children,
                });
            }
        }
    }
}

fn field_text(node: Node<'_>, field: &str, source: &str) -> String {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        .unwrap_or_default()
        .to_string()
}

/// Import identifiers of one statement.
///
/// - `import a.b as c`      -> `a.b`
/// - `from m import x`      -> `m.x`
/// - `from . import x`      -> `x`
/// - `from ..pkg import *`  -> `pkg.*`
fn import_names(node: Node<'_>, source: &str) -> Vec<String> {
    let bytes = source.as_bytes();
    let module = match node.kind() {
        "import_from_statement" => node
            .child_by_field_name("module_name")
            .and_then(|m| m.utf8_text(bytes).ok())
            .map(|m| m.trim_start_matches('.').to_string())
            .filter(|m| !m.is_empty()),
        "future_import_statement" => Some("__future__".to_string()),
        _ => None,
    };

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for item in node.children_by_field_name("name", &mut cursor) {
        let imported = match item.kind() {
            "aliased_import" => item
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(bytes).ok()),
            _ => item.utf8_text(bytes).ok(),
        };
        if let Some(name) = imported {
            names.push(qualify(module.as_deref(), name));
        }
    }

    if names.is_empty() {
        let mut cursor = node.walk();
        let wildcard = node
            .children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import");
        if wildcard {
            names.push(qualify(module.as_deref(), "*"));
        }
    }
    names
}

fn qualify(module: Option<&str>, name: &str) -> String {
    match module {
        Some(m) => format!("{m}.{name}"),
        None => name.to_string(),
    }
}

/* --------------------------- traversal --------------------------- */

/// Depth-first (pre-order) visitor over a lowered tree.
pub trait Visitor<'a> {
    /// Called before a node's children. Return `false` to stop the walk.
    fn enter(&mut self, node: &'a SyntaxNode, parent: Option<&'a SyntaxNode>) -> bool;
}

/// Walk `root` depth-first in source order.
pub fn walk<'a, V: Visitor<'a>>(root: &'a SyntaxNode, visitor: &mut V) {
    let mut stack: Vec<(&'a SyntaxNode, Option<&'a SyntaxNode>)> = vec![(root, None)];
    while let Some((node, parent)) = stack.pop() {
        if !visitor.enter(node, parent) {
            return;
        }
        for child in node.children.iter().rev() {
            stack.push((child, Some(node)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowered(src: &str) -> SyntaxNode {
        let tree = parse_python(src).unwrap();
        lower(&tree, src)
    }

    struct Names(Vec<String>);

    impl<'a> Visitor<'a> for Names {
        fn enter(&mut self, node: &'a SyntaxNode, _parent: Option<&'a SyntaxNode>) -> bool {
            if let Some(n) = node.function_name().or(node.class_name()) {
                self.0.push(n.to_string());
            }
            true
        }
    }

    #[test]
    fn decorated_methods_hang_directly_off_their_class() {
        let src = "class A:\n    @staticmethod\n    def m():\n        pass\n";
        let root = lowered(src);
        let class = &root.children[0];
        assert_eq!(class.class_name(), Some("A"));
        assert_eq!(class.children[0].function_name(), Some("m"));
        assert_eq!(class.children[0].span.start_line, 3);
    }

    #[test]
    fn walk_is_depth_first_in_source_order() {
        let src = "def a():\n    def inner():\n        pass\n\nclass B:\n    def c(self):\n        pass\n\ndef d():\n    pass\n";
        let root = lowered(src);
        let mut v = Names(Vec::new());
        walk(&root, &mut v);
        assert_eq!(v.0, vec!["a", "inner", "B", "c", "d"]);
    }

    #[test]
    fn conditional_definitions_are_kept_under_other() {
        let src = "import sys\nif sys.version_info > (3,):\n    def f():\n        return 1\n";
        let root = lowered(src);
        assert!(matches!(root.children[0].kind, NodeKind::Import { .. }));
        assert_eq!(root.children[1].kind, NodeKind::Other);
        assert_eq!(root.children[1].children[0].function_name(), Some("f"));
    }

    #[test]
    fn import_identifiers_follow_module_dot_name() {
        let src = "import os, a.b as c\nfrom pkg.sub import x, y as z\nfrom . import rel\nfrom ..up import *\n";
        let root = lowered(src);
        let names: Vec<String> = root
            .children
            .iter()
            .flat_map(|n| match &n.kind {
                NodeKind::Import { names } => names.clone(),
                _ => Vec::new(),
            })
            .collect();
        assert_eq!(names, vec!["os", "a.b", "pkg.sub.x", "pkg.sub.y", "rel", "up.*"]);
    }

    #[test]
    fn syntax_errors_are_located() {
        let src = "def ok():\n    return 1\n\ndef broken(:\n    pass\n";
        let tree = parse_python(src).unwrap();
        let err = first_syntax_error(&tree, src).expect("error expected");
        assert_eq!(err.line, 4);
        assert!(is_valid_python("x = 1\n"));
        assert!(!is_valid_python("def broken(:\n    pass\n"));
    }

    #[test]
    fn indentation_errors_are_syntax_errors() {
        let src = "def f():\n    x = 1\n      y = 2\n";
        let tree = parse_python(src).unwrap();
        let err = first_syntax_error(&tree, src).expect("error expected");
        assert_eq!((err.line, err.detail.as_str()), (3, "unexpected indent"));
        assert!(!is_valid_python("def f():\nreturn 1\n"));
    }
}
