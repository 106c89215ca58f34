//! Aggregating a message's citations into one badge.
//!
//! Every marker run in a message collapses into a single trailing
//! [`CitationGroup`]. Numbers keep first-appearance order and are
//! deduplicated; numbers with no sources are dropped; sources are
//! deduplicated by URL.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::{CitationMatch, extract_citations, strip_runs};
use crate::source::{
    CitationSource, FALLBACK_DOMAIN_LABEL, SourceMap, is_valid_citation,
    primary_domain_with_fallback,
};

/// All resolvable citations of one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationGroup {
    /// Resolvable numbers, first-appearance order, no duplicates.
    pub citation_numbers: Vec<u32>,
    /// Sources for those numbers, deduplicated by URL.
    pub sources: Vec<CitationSource>,
    /// Host of the first source without `www.`, or the fallback label.
    pub primary_domain: String,
}

/// One piece of parsed output: display text or a citation badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Citations(CitationGroup),
}

impl Segment {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(text) => Some(text),
            Segment::Citations(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&CitationGroup> {
        match self {
            Segment::Citations(group) => Some(group),
            Segment::Text(_) => None,
        }
    }
}

/// Parser configuration. Stateless, so one instance can be reused.
#[derive(Debug, Clone)]
pub struct CitationParser {
    fallback_label: String,
}

impl Default for CitationParser {
    fn default() -> Self {
        Self::new(FALLBACK_DOMAIN_LABEL)
    }
}

impl CitationParser {
    /// Create a parser with a custom label for unparseable source URLs.
    pub fn new(fallback_label: impl Into<String>) -> Self {
        Self {
            fallback_label: fallback_label.into(),
        }
    }

    /// Fold every run in `matches` into one group, or `None` when no number
    /// resolves to a source.
    pub fn aggregate(&self, matches: &[CitationMatch], sources: &SourceMap) -> Option<CitationGroup> {
        let mut seen = HashSet::new();
        let (numbers, dropped) = matches
            .iter()
            .flat_map(|m| m.citation_numbers.iter().copied())
            .filter(|n| seen.insert(*n))
            .fold((Vec::new(), Vec::new()), |(mut kept, mut dropped), n| {
                if is_valid_citation(n, sources) {
                    kept.push(n);
                } else {
                    dropped.push(n);
                }
                (kept, dropped)
            });

        if !dropped.is_empty() {
            debug!(?dropped, "Dropping citations with no sources");
        }
        if numbers.is_empty() {
            return None;
        }

        let mut urls = HashSet::new();
        let sources: Vec<CitationSource> = numbers
            .iter()
            .filter_map(|n| sources.get(n))
            .flatten()
            .filter(|source| urls.insert(source.url.clone()))
            .cloned()
            .collect();

        let primary_domain = sources
            .first()
            .map(|source| primary_domain_with_fallback(&source.url, &self.fallback_label))
            .unwrap_or_else(|| self.fallback_label.clone());

        Some(CitationGroup {
            citation_numbers: numbers,
            sources,
            primary_domain,
        })
    }

    /// Split `text` into cleaned display text plus at most one badge.
    ///
    /// Text without markers comes back unchanged as a single segment. When
    /// markers exist they are always stripped, even if none resolve, and an
    /// empty stripped text is left out rather than emitted as `Text("")`.
    pub fn parse(&self, text: &str, sources: &SourceMap) -> Vec<Segment> {
        let matches = extract_citations(text);
        if matches.is_empty() {
            return vec![Segment::Text(text.to_string())];
        }

        let stripped = strip_runs(text, &matches);
        let mut segments = Vec::with_capacity(2);
        if !stripped.is_empty() {
            segments.push(Segment::Text(stripped));
        }
        if let Some(group) = self.aggregate(&matches, sources) {
            segments.push(Segment::Citations(group));
        }
        segments
    }
}

/// Parse with the default `"Sources"` fallback label.
pub fn parse_citation_markers_in_text(text: &str, sources: &SourceMap) -> Vec<Segment> {
    CitationParser::default().parse(text, sources)
}
