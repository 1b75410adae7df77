use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Inventory of one successfully parsed Python module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleAnalysis {
    pub path: PathBuf,
    /// Unique function names in declaration order (methods included).
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub imports: BTreeSet<String>,
    #[serde(skip)]
    pub source: String,
}

impl ModuleAnalysis {
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }

    /// File name without extension, i.e. the name Python imports it by.
    pub fn stem(&self) -> &str {
        module_stem(&self.path)
    }
}

pub fn module_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("module")
}

/// Line range of one function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSpan {
    pub name: String,
    pub module: PathBuf,
    pub start_line: usize,
    /// Inclusive.
    pub end_line: usize,
    /// Set when the function is defined directly in a class body.
    pub class: Option<String>,
}

impl FunctionSpan {
    pub fn line_count(&self) -> usize {
        if self.end_line >= self.start_line {
            self.end_line - self.start_line + 1
        } else {
            0
        }
    }

    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.start_line..=self.end_line
    }

    /// `Class.method` for methods, the bare name otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.class {
            Some(c) => format!("{c}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Per-module parse failure; the module is excluded from inventories.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleError {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub message: String,
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(l), Some(c)) => write!(f, "{}:{l}:{c}: {}", self.path.display(), self.message),
            _ => write!(f, "{}: {}", self.path.display(), self.message),
        }
    }
}

/// Result of scanning a whole source tree.
#[derive(Debug, Clone, Default)]
pub struct RepoAnalysis {
    pub root: PathBuf,
    /// Discovery order (sorted by path).
    pub modules: Vec<ModuleAnalysis>,
    pub failures: Vec<ModuleError>,
}

impl RepoAnalysis {
    pub fn function_count(&self) -> usize {
        self.modules.iter().map(|m| m.functions.len()).sum()
    }

    /// Root-relative path of a module, falling back to the path itself.
    pub fn relative_path<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}
