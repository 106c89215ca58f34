//! Citation markers in model output.
//!
//! Assistant text cites sources with bracketed numbers (`[1]`, `[2][3]`).
//! This crate finds those markers, merges runs separated only by whitespace,
//! strips them from display text and folds every number in a message into a
//! single [`CitationGroup`] badge resolved against caller-supplied sources.
//!
//! ```text
//! "Paris is the capital [1][2]."  ──►  ["Paris is the capital.", CitationGroup{1,2}]
//! ```
//!
//! Bracketed content that is not a non-negative integer (`[abc]`, `[-1]`,
//! `[1.2]`, `[]`) is ordinary text, never a citation. Nothing here fails:
//! unresolvable numbers are dropped and unparseable URLs fall back to a
//! display label.

pub mod group;
pub mod parser;
pub mod source;

pub use group::{CitationGroup, CitationParser, Segment, parse_citation_markers_in_text};
pub use parser::{
    CitationMatch, extract_citations, get_unique_citation_numbers, group_consecutive_citations,
    strip_citation_markers,
};
pub use source::{
    CitationSource, FALLBACK_DOMAIN_LABEL, SourceMap, is_valid_citation, primary_domain,
    primary_domain_with_fallback,
};
