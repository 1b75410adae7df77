//! Source analyzer for Python repositories.
//!
//! Parses each module with tree-sitter, lowers the concrete tree into a small
//! definition tree ([`syntax::SyntaxNode`]) and answers the questions the test
//! generation pipeline asks: which functions/classes/imports a module has, the
//! exact source of a function or of the class owning it, and the line span of
//! every function.
//!
//! Malformed modules never abort a scan: they surface as [`ModuleError`]
//! records in [`RepoAnalysis::failures`].

pub mod analysis;
pub mod errors;
pub mod fs_scan;
pub mod indent;
pub mod span;
pub mod syntax;
pub mod types;

pub use analysis::{
    ParsedModule, analyze_source, extract_class_containing, extract_function, function_spans,
};
pub use errors::{AnalyzerError, Result};
pub use fs_scan::{ScanConfig, analyze_repo, scan_python_files};
pub use indent::first_indentation_error;
pub use span::Span;
pub use syntax::{SyntaxErrorAt, first_syntax_error, is_valid_python, parse_python};
pub use types::{FunctionSpan, ModuleAnalysis, ModuleError, RepoAnalysis, module_stem};
