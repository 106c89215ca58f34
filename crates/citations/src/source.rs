//! Citation sources and domain labels.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Label shown when a source URL has no usable host.
pub const FALLBACK_DOMAIN_LABEL: &str = "Sources";

/// A source record a citation number can resolve to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationSource {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,
}

impl CitationSource {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: String::new(),
            favicon: None,
            relevance: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

/// Citation number → sources, as supplied by the caller.
pub type SourceMap = HashMap<u32, Vec<CitationSource>>;

/// True only if `number` maps to at least one source.
pub fn is_valid_citation(number: u32, sources: &SourceMap) -> bool {
    sources.get(&number).is_some_and(|list| !list.is_empty())
}

/// Display host of `url` without a leading `www.`, or `"Sources"`.
pub fn primary_domain(url: &str) -> String {
    primary_domain_with_fallback(url, FALLBACK_DOMAIN_LABEL)
}

/// Display host of `url` without a leading `www.`, or `fallback`.
pub fn primary_domain_with_fallback(url: &str, fallback: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return fallback.to_string();
    };
    match parsed.host_str() {
        Some(host) if !host.is_empty() => host.strip_prefix("www.").unwrap_or(host).to_string(),
        _ => fallback.to_string(),
    }
}
