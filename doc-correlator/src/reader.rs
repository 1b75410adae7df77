//! Documentation discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{DocError, Result};
use crate::markup::{DocInfo, DocSection, parse_document};

/// Documents are cut to this many characters before parsing.
pub const MAX_DOC_CHARS: usize = 10_000;

/// Char-boundary-safe prefix of at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cheap filter: a document without headings or fences has nothing to offer.
fn looks_structured(text: &str) -> bool {
    text.contains('#') || text.contains("```")
}

/// All parsed documents of one repository.
#[derive(Debug, Clone, Default)]
pub struct DocIndex {
    pub docs: Vec<DocInfo>,
}

impl DocIndex {
    /// Every section of every document, in discovery order.
    pub fn sections(&self) -> impl Iterator<Item = &DocSection> {
        self.docs.iter().flat_map(|d| d.sections.iter())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

pub struct DocReader {
    root: PathBuf,
}

impl DocReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every `.md`/`.rst` file under the root (sorted walk).
    ///
    /// Unreadable files are logged and skipped; invalid UTF-8 is replaced.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn read_docs(&self) -> Result<DocIndex> {
        if !self.root.exists() {
            return Err(DocError::MissingRoot(self.root.clone()));
        }

        let mut index = DocIndex::default();
        let mut skipped = 0usize;

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(keep_entry);

        for entry in walker.filter_map(std::result::Result::ok) {
            if !entry.file_type().is_file() || !is_doc_file(entry.path()) {
                continue;
            }
            let path = entry.path();
            let bytes = match fs::read(path) {
                Ok(b) => b,
                Err(err) => {
                    warn!("docs: cannot read {}: {}", path.display(), err);
                    continue;
                }
            };
            let text = String::from_utf8_lossy(&bytes);
            let text = truncate_chars(&text, MAX_DOC_CHARS);
            if !looks_structured(text) {
                skipped += 1;
                debug!("docs: skip unstructured {}", path.display());
                continue;
            }

            let doc = parse_document(path, text);
            debug!(
                "docs: {} -> sections={} examples={}",
                path.display(),
                doc.sections.len(),
                doc.examples.len()
            );
            index.docs.push(doc);
        }

        info!(
            "docs: done, documents={} sections={} (unstructured skipped={})",
            index.len(),
            index.sections().count(),
            skipped
        );
        Ok(index)
    }
}

fn is_doc_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("rst")
    )
}

fn keep_entry(entry: &DirEntry) -> bool {
    if entry.depth() > 0 && entry.file_type().is_dir() {
        if let Some(name) = entry.file_name().to_str() {
            return !matches!(
                name,
                ".git" | "node_modules" | "target" | ".venv" | "venv" | ".tox" | "site-packages"
            );
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_boundary_is_ten_thousand_chars() {
        let long = "é".repeat(MAX_DOC_CHARS + 5);
        let cut = truncate_chars(&long, MAX_DOC_CHARS);
        assert_eq!(cut.chars().count(), MAX_DOC_CHARS);

        let exact = "a".repeat(MAX_DOC_CHARS);
        assert_eq!(truncate_chars(&exact, MAX_DOC_CHARS).len(), MAX_DOC_CHARS);
    }

    #[test]
    fn heading_past_the_cut_is_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let mut text = String::from("# early\nbody\n");
        text.push_str(&"x".repeat(MAX_DOC_CHARS));
        text.push_str("\n# late\nhidden\n");
        fs::write(dir.path().join("README.md"), text).unwrap();

        let index = DocReader::new(dir.path()).read_docs().unwrap();
        let headings: Vec<_> = index.sections().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["early"]);
    }

    #[test]
    fn reads_md_and_rst_and_skips_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "# add\nadds\n").unwrap();
        fs::write(dir.path().join("b.rst"), "Usage\n=====\ncall it\n\n```\nx\n```\n").unwrap();
        fs::write(dir.path().join("c.md"), "no structure here\n").unwrap();
        fs::write(dir.path().join("d.txt"), "# ignored\n").unwrap();
        fs::write(dir.path().join("e.md"), b"# bad \xff bytes\nbody\n").unwrap();

        let index = DocReader::new(dir.path()).read_docs().unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.docs[1].headings, vec!["Usage"]);
        assert!(index.docs[2].headings[0].contains('\u{FFFD}'));
    }

    #[test]
    fn missing_root_is_an_error() {
        let reader = DocReader::new("/definitely/not/here");
        assert!(matches!(reader.read_docs(), Err(DocError::MissingRoot(_))));
    }
}
