//! `convoctx select`: split a conversation under a token budget.

use std::path::Path;

use convoctx_config::ConvoConfig;
use convoctx_context::{ContextSelection, ContextSelector, SelectionOptions, render_transcript};
use convoctx_core::Result;
use serde::Serialize;

use super::{estimator, load_conversation, print_json, ranking_weights};

/// Command-line values that win over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub budget: Option<usize>,
    pub keep_recent: Option<usize>,
    pub summary_budget: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SelectReport {
    #[serde(flatten)]
    pub selection: ContextSelection,
    /// Text to hand to the summarizer; empty when nothing was summarized.
    pub summary_input: String,
}

pub fn build(config: &ConvoConfig, path: &Path, overrides: Overrides) -> Result<SelectReport> {
    let conversation = load_conversation(path)?;
    let budget = overrides.budget.unwrap_or(config.context.token_budget);
    let options = SelectionOptions {
        tracked_entities: None,
        always_keep_recent: overrides
            .keep_recent
            .unwrap_or(config.context.always_keep_recent),
        summary_budget: overrides
            .summary_budget
            .unwrap_or(config.context.summary_budget),
        weights: ranking_weights(config),
    };

    let selection =
        ContextSelector::with_estimator(estimator(config)).select(&conversation.messages, budget, &options);
    let summary_input = render_transcript(&selection.summarized);
    Ok(SelectReport {
        selection,
        summary_input,
    })
}

pub fn run(
    config: &ConvoConfig,
    path: &Path,
    overrides: Overrides,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    print_json(&build(config, path, overrides)?)
}
