//! Function-level coverage.
//!
//! [`CoverageRunner`] drives coverage.py over the generated tests;
//! [`attribute`] maps the resulting per-line report onto the function spans
//! found by the analyzer, producing a [`CoverageRecord`].

pub mod attribution;
pub mod errors;
pub mod report;
pub mod runner;

pub use attribution::{CoverageRecord, attribute, percent, span_coverage};
pub use errors::{CoverageError, Result};
pub use report::{CoverageReport, FileCoverage, FileSummary};
pub use runner::{CoverageRunner, DEFAULT_REPORT_FILE};
