//! Function-name to documentation-section relevance scoring.

use tracing::debug;

use crate::markup::DocSection;
use crate::reader::{DocIndex, truncate_chars};

/// Scoring knobs. Built once per run and injected into [`DocCorrelator`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceConfig {
    /// Added when the heading equals the function name (case-insensitive).
    pub heading_weight: u32,
    /// Added when the body mentions the function name (case-insensitive).
    pub body_weight: u32,
    /// Added per name keyword found in heading or body.
    pub keyword_weight: u32,
    /// Minimum score for a section to be returned.
    pub threshold: u32,
    /// Body characters kept in the excerpt.
    pub excerpt_chars: usize,
    /// Lowercase topics; a heading containing one is never matched.
    pub disallowed_topics: Vec<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            heading_weight: 20,
            body_weight: 10,
            keyword_weight: 1,
            threshold: 15,
            excerpt_chars: 1000,
            disallowed_topics: ["changelog", "performance", "installation", "license", "contributing"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RelevanceConfig {
    /// Defaults overridden by `DOC_WEIGHT_HEADING`, `DOC_WEIGHT_BODY`,
    /// `DOC_WEIGHT_KEYWORD`, `DOC_SCORE_THRESHOLD`, `DOC_EXCERPT_CHARS` and
    /// `DOC_DISALLOWED_TOPICS` (comma-separated).
    pub fn from_env() -> Self {
        let d = Self::default();
        let disallowed_topics = std::env::var("DOC_DISALLOWED_TOPICS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(d.disallowed_topics);

        Self {
            heading_weight: parse("DOC_WEIGHT_HEADING", d.heading_weight),
            body_weight: parse("DOC_WEIGHT_BODY", d.body_weight),
            keyword_weight: parse("DOC_WEIGHT_KEYWORD", d.keyword_weight),
            threshold: parse("DOC_SCORE_THRESHOLD", d.threshold),
            excerpt_chars: parse("DOC_EXCERPT_CHARS", d.excerpt_chars),
            disallowed_topics,
        }
    }
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(dflt)
}

#[derive(Debug, Clone, Copy)]
pub struct RelevanceMatch<'a> {
    pub section: &'a DocSection,
    pub score: u32,
}

/// Read-only scorer over an immutable configuration.
#[derive(Debug, Clone, Default)]
pub struct DocCorrelator {
    cfg: RelevanceConfig,
}

impl DocCorrelator {
    pub fn new(cfg: RelevanceConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.cfg
    }

    /// `false` when the heading names a disallowed topic.
    pub fn is_allowed(&self, section: &DocSection) -> bool {
        let heading = section.heading.to_lowercase();
        !self
            .cfg
            .disallowed_topics
            .iter()
            .any(|t| heading.contains(t.as_str()))
    }

    /// Heuristic overlap between `function_name` and one section.
    pub fn score(&self, function_name: &str, section: &DocSection) -> u32 {
        let name = function_name.to_lowercase();
        let heading = section.heading.to_lowercase();
        let body = section.body.to_lowercase();

        let mut score = 0;
        if heading == name {
            score += self.cfg.heading_weight;
        }
        if body.contains(&name) {
            score += self.cfg.body_weight;
        }
        for kw in keywords(&name) {
            if heading.contains(kw) || body.contains(kw) {
                score += self.cfg.keyword_weight;
            }
        }
        score
    }

    /// Highest-scoring allowed section; the first one wins ties.
    pub fn best_match<'a>(&self, function_name: &str, docs: &'a DocIndex) -> Option<RelevanceMatch<'a>> {
        let mut best: Option<RelevanceMatch<'a>> = None;
        for section in docs.sections().filter(|s| self.is_allowed(s)) {
            let score = self.score(function_name, section);
            if best.is_none_or(|b| score > b.score) {
                best = Some(RelevanceMatch { section, score });
            }
        }
        best
    }

    /// Documentation excerpt for `function_name`, when the best section
    /// reaches the threshold.
    pub fn find_related(&self, function_name: &str, docs: &DocIndex) -> Option<String> {
        let hit = self.best_match(function_name, docs)?;
        if hit.score < self.cfg.threshold {
            debug!(
                "docs: best match for {} is {:?} with score {} (< {})",
                function_name, hit.section.heading, hit.score, self.cfg.threshold
            );
            return None;
        }
        debug!(
            "docs: {} -> {:?} (score {})",
            function_name, hit.section.heading, hit.score
        );
        Some(format!(
            "### {}\n{}",
            hit.section.heading,
            truncate_chars(&hit.section.body, self.cfg.excerpt_chars)
        ))
    }
}

/// Name split on `_`, empty tokens dropped.
fn keywords(name: &str) -> impl Iterator<Item = &str> {
    name.split('_').filter(|k| !k.is_empty())
}
