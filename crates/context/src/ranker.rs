//! Message importance ranking.
//!
//! Annotates every message with a relevance score; it never reorders. The
//! score combines three monotonic signals:
//!
//! ```text
//! score = entity_weight  * distinct tracked entities mentioned
//!       + recency_weight * (index + 1) / len
//!       + question_boost   (user turns that ask or request something)
//! ```
//!
//! With the default weights one extra entity mention always outweighs the
//! whole recency range, and the question boost stays below a single mention.

use convoctx_core::message::{Message, Role};
use serde::{Deserialize, Serialize};

use crate::entity::TrackedEntities;

/// Weights for the three scoring terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    /// Added per distinct tracked entity found in the message.
    pub entity_weight: f64,
    /// Scale of the recency term, which runs from ~0 (oldest) to 1 (newest).
    pub recency_weight: f64,
    /// Flat bonus for user messages that pose a question or request.
    pub question_boost: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            entity_weight: 2.0,
            recency_weight: 1.0,
            question_boost: 0.5,
        }
    }
}

/// A message paired with its importance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMessage {
    /// Position in the ranked slice.
    pub index: usize,
    pub message: Message,
    pub score: f64,
    /// Distinct tracked entities found in the content.
    pub entity_mentions: usize,
}

/// Rank messages with the default weights.
pub fn rank_message_importance(
    messages: &[Message],
    tracked_entities: &TrackedEntities,
) -> Vec<RankedMessage> {
    rank_message_importance_with(messages, tracked_entities, &RankingWeights::default())
}

/// Rank messages with explicit weights. Output is in input order.
pub fn rank_message_importance_with(
    messages: &[Message],
    tracked_entities: &TrackedEntities,
    weights: &RankingWeights,
) -> Vec<RankedMessage> {
    let len = messages.len();
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            let entity_mentions = tracked_entities.mentions_in(&message.content);
            let recency = (index + 1) as f64 / len as f64;
            let boost = if message.role == Role::User && is_direct_request(&message.content) {
                weights.question_boost
            } else {
                0.0
            };

            RankedMessage {
                index,
                message: message.clone(),
                score: weights.entity_weight * entity_mentions as f64
                    + weights.recency_weight * recency
                    + boost,
                entity_mentions,
            }
        })
        .collect()
}

/// Sort ranked messages by descending score. Ties go to the later message.
pub fn by_score(mut ranked: Vec<RankedMessage>) -> Vec<RankedMessage> {
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(b.index.cmp(&a.index)));
    ranked
}

const REQUEST_LEADS: &[&str] = &[
    "how", "what", "why", "when", "where", "who", "which", "can", "could", "would", "will",
    "should", "is", "are", "do", "does", "did", "please", "make", "add", "create", "change",
    "update", "fix", "show", "tell", "give", "write", "help", "explain", "remove", "delete",
    "build", "find", "let's", "lets", "list", "generate", "rewrite", "convert",
];

/// True when the text asks a question or opens with a request verb.
pub fn is_direct_request(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.contains('?') {
        return true;
    }
    trimmed
        .split_whitespace()
        .next()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .is_some_and(|lead| REQUEST_LEADS.contains(&lead.as_str()))
}
