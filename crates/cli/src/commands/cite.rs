//! `convoctx cite`: turn raw LLM output into text plus a citation badge.

use std::path::Path;

use convoctx_citations::{
    CitationMatch, CitationParser, Segment, SourceMap, extract_citations,
    get_unique_citation_numbers,
};
use convoctx_config::ConvoConfig;
use convoctx_core::{Error, Result};
use serde::Serialize;

use super::{print_json, read_input};

#[derive(Debug, Serialize)]
pub struct CiteReport {
    pub segments: Vec<Segment>,
    pub matches: Vec<CitationMatch>,
    pub unique_numbers: Vec<u32>,
}

/// Parse a JSON object keyed by citation number strings.
pub fn sources_from_json(json: &str) -> Result<SourceMap> {
    serde_json::from_str(json).map_err(|e| Error::InvalidSources(e.to_string()))
}

pub fn build(config: &ConvoConfig, path: &Path, sources: Option<&Path>) -> Result<CiteReport> {
    let text = read_input(path)?;
    let sources = match sources {
        Some(sources_path) => sources_from_json(&read_input(sources_path)?)?,
        None => SourceMap::new(),
    };

    let parser = CitationParser::new(config.citations.fallback_label.as_str());
    Ok(CiteReport {
        segments: parser.parse(&text, &sources),
        matches: extract_citations(&text),
        unique_numbers: get_unique_citation_numbers(&text),
    })
}

pub fn run(
    config: &ConvoConfig,
    path: &Path,
    sources: Option<&Path>,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    print_json(&build(config, path, sources)?)
}
