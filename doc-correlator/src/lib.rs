//! Documentation correlator.
//!
//! Reads Markdown/reStructuredText files into heading-delimited sections and
//! scores them against function names, so a prompt can carry the most
//! relevant excerpt of the project's own docs.

pub mod errors;
pub mod examples;
pub mod markup;
pub mod reader;
pub mod relevance;

pub use errors::{DocError, Result};
pub use examples::extract_examples;
pub use markup::{DocInfo, DocSection, HeadingStyle, parse_document};
pub use reader::{DocIndex, DocReader, MAX_DOC_CHARS, truncate_chars};
pub use relevance::{DocCorrelator, RelevanceConfig, RelevanceMatch};
