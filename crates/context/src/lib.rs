//! Conversation context management for bounded-budget LLM calls.
//!
//! Decides which prior turns are sent verbatim and which are handed off for
//! summarization, so a fixed token budget is respected while the referents a
//! conversation depends on stay in view.
//!
//! # Stages
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | 1. Entity tracking | [`entity`] | [`TrackedEntities`] over the full history |
//! | 2. Importance ranking | [`ranker`] | one [`RankedMessage`] per message, input order |
//! | 3. Selection | [`selector`] | [`ContextSelection`] (selected + summarized) |
//!
//! Every stage is a pure function over in-memory data: no I/O, no global
//! mutable state, safe to call concurrently from any number of handlers.

pub mod entity;
pub mod ranker;
pub mod selector;
pub mod token;

pub use entity::{TrackedEntities, extract_entities, extract_entities_from_text};
pub use ranker::{
    RankedMessage, RankingWeights, by_score, is_direct_request, rank_message_importance,
    rank_message_importance_with,
};
pub use selector::{
    ContextSelection, ContextSelector, DEFAULT_ALWAYS_KEEP_RECENT, DEFAULT_SUMMARY_BUDGET,
    SelectionMetadata, SelectionOptions, render_transcript, select_context,
};
pub use token::{HeuristicEstimator, TokenEstimator, estimate_message_tokens, estimate_tokens};
