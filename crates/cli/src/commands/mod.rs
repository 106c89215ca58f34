//! Subcommand handlers.
//!
//! Each handler builds a serializable report from its inputs and prints it
//! as pretty JSON. The builders are separate from printing so they can be
//! tested without capturing stdout.

pub mod cite;
pub mod entities;
pub mod init;
pub mod rank;
pub mod select;

use std::path::Path;

use convoctx_config::ConvoConfig;
use convoctx_context::{HeuristicEstimator, RankingWeights};
use convoctx_core::{Conversation, Error, Result};
use serde::Serialize;

/// Read a whole input file, keeping the path in the error.
pub fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn load_conversation(path: &Path) -> Result<Conversation> {
    let conversation = Conversation::from_json(&read_input(path)?)?;
    tracing::debug!(
        path = %path.display(),
        messages = conversation.len(),
        "Loaded conversation"
    );
    Ok(conversation)
}

pub fn print_json<T: Serialize>(value: &T) -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn ranking_weights(config: &ConvoConfig) -> RankingWeights {
    let ranking = &config.context.ranking;
    RankingWeights {
        entity_weight: ranking.entity_weight,
        recency_weight: ranking.recency_weight,
        question_boost: ranking.question_boost,
    }
}

pub fn estimator(config: &ConvoConfig) -> HeuristicEstimator {
    HeuristicEstimator {
        chars_per_token: config.context.chars_per_token,
        overhead: config.context.message_overhead_tokens,
    }
}
