//! Prompt requests and their text rendering.

use std::path::{Path, PathBuf};

use code_analyzer::ParsedModule;
use serde::Serialize;

use crate::category::TestCategory;

/// Where a request's code context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Source of the class that defines the method.
    EnclosingClass,
    Function,
    /// The function could not be located; the context is a placeholder.
    Missing,
}

/// Everything needed to render one prompt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptRequest {
    pub function: String,
    /// Root-relative module path.
    pub module: PathBuf,
    pub code_context: String,
    pub context_source: ContextSource,
    pub class_name: Option<String>,
    pub documentation: Option<String>,
    pub imports: Vec<String>,
    pub category: TestCategory,
    /// Position in the batch, unique within a run.
    pub batch: usize,
}

impl PromptRequest {
    /// Module stem, i.e. the name the tests import the target from.
    pub fn module_stem(&self) -> &str {
        code_analyzer::module_stem(&self.module)
    }

    /// Name a test imports to reach the target: the class for methods.
    pub fn import_name(&self) -> &str {
        self.class_name.as_deref().unwrap_or(&self.function)
    }
}

/// Placeholder used when a function's source cannot be located.
pub fn missing_code_placeholder(function_name: &str) -> String {
    format!("# Function {function_name} code not found")
}

/// Code shown to the model for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeContext {
    pub text: String,
    pub source: ContextSource,
    /// Class directly defining the function, for methods.
    pub class_name: Option<String>,
}

/// Code context for `function_name`: the enclosing class for methods, the
/// function itself otherwise, or the placeholder.
pub fn code_context(parsed: Option<&ParsedModule<'_>>, function_name: &str) -> CodeContext {
    let missing = || CodeContext {
        text: missing_code_placeholder(function_name),
        source: ContextSource::Missing,
        class_name: None,
    };
    let Some(parsed) = parsed else {
        return missing();
    };
    let Some((_, parent)) = parsed.find_function(function_name) else {
        return missing();
    };

    if let Some(class) = parent.filter(|p| p.class_name().is_some()) {
        if let Some(text) = parsed.enclosing_class_source(function_name) {
            return CodeContext {
                text: text.to_string(),
                source: ContextSource::EnclosingClass,
                class_name: class.class_name().map(str::to_string),
            };
        }
    }
    match parsed.function_source(function_name) {
        Some(text) => CodeContext {
            text: text.to_string(),
            source: ContextSource::Function,
            class_name: None,
        },
        None => missing(),
    }
}

/// Render the prompt text. Deterministic for equal requests.
pub fn build_prompt(req: &PromptRequest) -> String {
    let mut out = String::with_capacity(req.code_context.len() + 512);
    out.push_str(&format!("# File: {}\n", display_path(&req.module)));
    out.push_str(&format!("# Function: {}\n", req.function));
    if !req.imports.is_empty() {
        out.push_str("# Imports:\n");
        for imp in &req.imports {
            out.push_str(&format!("# - {imp}\n"));
        }
    }
    out.push('\n');
    out.push_str(req.code_context.trim_end());
    out.push('\n');

    if let Some(doc) = req.documentation.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str("\nDocumentation:\n");
        out.push_str(doc.trim_end());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&req.category.instruction(&req.function));
    out.push('\n');
    out
}

/// Forward slashes regardless of host, so prompts are stable across platforms.
fn display_path(p: &Path) -> String {
    p.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
