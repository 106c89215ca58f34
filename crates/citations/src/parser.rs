//! Citation marker extraction.
//!
//! Grammar (informal):
//! ```text
//! marker = "[" DIGIT+ "]"
//! run    = marker (WHITESPACE* marker)*
//! ```
//!
//! Offsets are byte offsets into the original `&str`, so
//! `&text[m.start_index..m.end_index]` reproduces the raw run exactly.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("citation marker regex is valid"));

/// A run of one or more adjacent citation markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationMatch {
    /// Byte offset of the first `[`.
    pub start_index: usize,
    /// Byte offset one past the last `]`.
    pub end_index: usize,
    /// Numbers in left-to-right order, duplicates preserved.
    pub citation_numbers: Vec<u32>,
}

/// One match per bracketed integer, before grouping.
fn raw_markers(text: &str) -> Vec<CitationMatch> {
    MARKER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            // Numbers too large for u32 are treated as plain text.
            let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
            Some(CitationMatch {
                start_index: whole.start(),
                end_index: whole.end(),
                citation_numbers: vec![number],
            })
        })
        .collect()
}

/// Find citation marker runs in `text`, left to right.
pub fn extract_citations(text: &str) -> Vec<CitationMatch> {
    let grouped = group_consecutive_citations(&raw_markers(text), text);
    trace!(runs = grouped.len(), "Extracted citation runs");
    grouped
}

/// Merge matches whose gap in `text` is whitespace only.
///
/// Expects `matches` sorted by position. Matches with overlapping or
/// out-of-range offsets are never merged.
pub fn group_consecutive_citations(matches: &[CitationMatch], text: &str) -> Vec<CitationMatch> {
    matches
        .iter()
        .fold(Vec::<CitationMatch>::new(), |mut groups, current| {
            let mergeable = groups.last().is_some_and(|last| {
                last.end_index <= current.start_index
                    && text
                        .get(last.end_index..current.start_index)
                        .is_some_and(|gap| gap.chars().all(char::is_whitespace))
            });

            match groups.last_mut() {
                Some(last) if mergeable => {
                    last.end_index = current.end_index;
                    last.citation_numbers
                        .extend_from_slice(&current.citation_numbers);
                }
                _ => groups.push(current.clone()),
            }
            groups
        })
}

/// Every distinct citation number in `text`, ascending.
pub fn get_unique_citation_numbers(text: &str) -> Vec<u32> {
    raw_markers(text)
        .into_iter()
        .flat_map(|m| m.citation_numbers)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Remove every marker run from `text`.
///
/// Spaces or tabs right before a run go with it ("capital [1]." →
/// "capital."); a single space is kept when a word follows the run
/// directly. A run at the very start also takes the spaces after it.
/// Trailing whitespace is trimmed.
pub fn strip_citation_markers(text: &str) -> String {
    strip_runs(text, &extract_citations(text))
}

pub(crate) fn strip_runs(text: &str, runs: &[CitationMatch]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for run in runs {
        let Some(before) = text.get(cursor..run.start_index) else {
            continue;
        };
        let trimmed = before.trim_end_matches([' ', '\t']);
        out.push_str(trimmed);

        let had_gap = trimmed.len() < before.len();
        let word_follows = text[run.end_index..]
            .chars()
            .next()
            .is_some_and(char::is_alphanumeric);
        if had_gap && word_follows && !out.is_empty() {
            out.push(' ');
        }
        cursor = run.end_index;
        if out.is_empty() {
            // A run opening the text takes the spacing after it too.
            let rest = &text[cursor..];
            cursor += rest.len() - rest.trim_start_matches([' ', '\t']).len();
        }
    }
    out.push_str(&text[cursor..]);

    let len = out.trim_end().len();
    out.truncate(len);
    out
}
