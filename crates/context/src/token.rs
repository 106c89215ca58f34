//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, plus a fixed
//! per-message overhead for role names and delimiters. Exact tokenization
//! belongs to whichever LLM gateway the caller talks to; plug one in through
//! [`TokenEstimator`].

use convoctx_core::message::Message;

/// Default characters per token for the heuristic.
pub const CHARS_PER_TOKEN: usize = 4;

/// Default per-message overhead in tokens.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    estimate_tokens_with(text, CHARS_PER_TOKEN)
}

fn estimate_tokens_with(text: &str, chars_per_token: usize) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.chars().count().div_ceil(chars_per_token.max(1))
}

/// Estimate tokens for a single message including per-message overhead.
pub fn estimate_message_tokens(message: &Message) -> usize {
    MESSAGE_OVERHEAD_TOKENS + estimate_tokens(&message.content)
}

/// Estimate tokens for a slice of messages.
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

/// Cost model used by the context selector.
///
/// Units are whatever the caller's budget is expressed in; the selector only
/// compares sums against the budget.
pub trait TokenEstimator {
    /// Estimated cost of sending `message` verbatim.
    fn message_tokens(&self, message: &Message) -> usize;

    /// Estimated cost of a slice of messages.
    fn messages_tokens(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.message_tokens(m)).sum()
    }
}

/// Length-based estimator with configurable ratio and overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicEstimator {
    pub chars_per_token: usize,
    pub overhead: usize,
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: CHARS_PER_TOKEN,
            overhead: MESSAGE_OVERHEAD_TOKENS,
        }
    }
}

impl TokenEstimator for HeuristicEstimator {
    fn message_tokens(&self, message: &Message) -> usize {
        self.overhead + estimate_tokens_with(&message.content, self.chars_per_token)
    }
}
