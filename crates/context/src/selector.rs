//! Context selection: decide which turns go to the LLM verbatim.
//!
//! Partitions a conversation into `selected` (sent as-is) and `summarized`
//! (handed to an external summarizer) under a token budget.
//!
//! # Algorithm
//!
//! 1. Reserve `summary_budget` tokens out of the total budget
//! 2. Always select the trailing `always_keep_recent` messages (the recency floor)
//! 3. Rank every older message by tracked-entity overlap, recency and role
//! 4. Walk them in descending score, selecting each one that still fits;
//!    a message that does not fit is skipped and smaller ones may still fit
//! 5. Everything not selected is summarized; both lists keep conversation order
//!
//! If the floor alone exceeds the budget it is still selected in full, the
//! budget is treated as exhausted, and `metadata.over_budget` is set.
//!
//! # Determinism
//!
//! No randomness or clock reads: identical inputs produce identical output.

use convoctx_core::message::Message;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::{TrackedEntities, extract_entities};
use crate::ranker::{RankingWeights, by_score, rank_message_importance_with};
use crate::token::{HeuristicEstimator, TokenEstimator};

/// Default size of the recency floor.
pub const DEFAULT_ALWAYS_KEEP_RECENT: usize = 3;

/// Default token reservation for the external summary.
pub const DEFAULT_SUMMARY_BUDGET: usize = 500;

// ── Types ─────────────────────────────────────────────────────────────────

/// Knobs for a single selection.
#[derive(Debug, Clone)]
pub struct SelectionOptions {
    /// Precomputed entity set. Computed from the full history when `None`.
    pub tracked_entities: Option<TrackedEntities>,
    /// Trailing messages that are always selected.
    pub always_keep_recent: usize,
    /// Tokens reserved for the summary of `summarized` messages.
    pub summary_budget: usize,
    /// Ranker weights.
    pub weights: RankingWeights,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            tracked_entities: None,
            always_keep_recent: DEFAULT_ALWAYS_KEEP_RECENT,
            summary_budget: DEFAULT_SUMMARY_BUDGET,
            weights: RankingWeights::default(),
        }
    }
}

impl SelectionOptions {
    pub fn with_entities(mut self, entities: TrackedEntities) -> Self {
        self.tracked_entities = Some(entities);
        self
    }
}

/// Result of a selection: two disjoint lists in conversation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSelection {
    /// Messages sent verbatim.
    pub selected: Vec<Message>,
    /// Messages earmarked for external summarization.
    pub summarized: Vec<Message>,
    pub metadata: SelectionMetadata,
}

/// Accounting for a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionMetadata {
    /// Caller-supplied total budget.
    pub budget: usize,
    /// Reserved for the summary (counted against `budget`).
    pub summary_budget: usize,
    /// Estimated cost of all selected messages, floor included.
    pub selected_tokens: usize,
    /// Estimated cost of the recency floor alone.
    pub floor_tokens: usize,
    /// Estimated cost of the summarized messages.
    pub summarized_tokens: usize,
    pub selected_count: usize,
    pub summarized_count: usize,
    /// The recency floor alone exceeded `budget - summary_budget`.
    pub over_budget: bool,
}

// ── Selector ──────────────────────────────────────────────────────────────

/// The context selector. Stateless, so one instance can be reused.
#[derive(Debug, Clone, Default)]
pub struct ContextSelector<E = HeuristicEstimator> {
    estimator: E,
}

impl ContextSelector<HeuristicEstimator> {
    /// Create a selector using the length-based estimator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: TokenEstimator> ContextSelector<E> {
    /// Create a selector with a custom cost model.
    pub fn with_estimator(estimator: E) -> Self {
        Self { estimator }
    }

    /// Partition `messages` under `token_budget`.
    pub fn select(
        &self,
        messages: &[Message],
        token_budget: usize,
        options: &SelectionOptions,
    ) -> ContextSelection {
        let len = messages.len();
        let floor_start = len - options.always_keep_recent.min(len);
        let costs: Vec<usize> = messages
            .iter()
            .map(|m| self.estimator.message_tokens(m))
            .collect();

        let available = token_budget.saturating_sub(options.summary_budget);
        let floor_tokens: usize = costs[floor_start..].iter().sum();
        let over_budget = floor_tokens > available;
        if over_budget {
            warn!(
                floor_tokens,
                available,
                floor_messages = len - floor_start,
                "Recent messages exceed the context budget; keeping them anyway"
            );
        }
        let mut remaining = available.saturating_sub(floor_tokens);

        let mut keep = vec![false; len];
        keep[floor_start..].fill(true);

        let older = &messages[..floor_start];
        if !older.is_empty() && remaining > 0 {
            let computed;
            let entities = match &options.tracked_entities {
                Some(entities) => entities,
                None => {
                    computed = extract_entities(messages);
                    &computed
                }
            };

            for ranked in by_score(rank_message_importance_with(older, entities, &options.weights))
            {
                let cost = costs[ranked.index];
                if cost <= remaining {
                    keep[ranked.index] = true;
                    remaining -= cost;
                }
                if remaining == 0 {
                    break;
                }
            }
        }

        let mut selected = Vec::new();
        let mut summarized = Vec::new();
        let mut selected_tokens = 0;
        let mut summarized_tokens = 0;
        for ((message, cost), kept) in messages.iter().zip(&costs).zip(&keep) {
            if *kept {
                selected_tokens += cost;
                selected.push(message.clone());
            } else {
                summarized_tokens += cost;
                summarized.push(message.clone());
            }
        }

        let metadata = SelectionMetadata {
            budget: token_budget,
            summary_budget: options.summary_budget,
            selected_tokens,
            floor_tokens,
            summarized_tokens,
            selected_count: selected.len(),
            summarized_count: summarized.len(),
            over_budget,
        };
        debug!(
            selected = metadata.selected_count,
            summarized = metadata.summarized_count,
            selected_tokens,
            budget = token_budget,
            "Context selection complete"
        );

        ContextSelection {
            selected,
            summarized,
            metadata,
        }
    }
}

/// Select context with the length-based estimator.
pub fn select_context(
    messages: &[Message],
    token_budget: usize,
    options: &SelectionOptions,
) -> ContextSelection {
    ContextSelector::new().select(messages, token_budget, options)
}

/// Render messages as a plain transcript for the external summarizer.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::estimate_message_tokens;

    /// Every message costs exactly `overhead + ceil(chars/4)`; "x" * 36 → 13.
    fn turn(i: usize) -> Message {
        let role_msg = if i % 2 == 0 {
            Message::user(format!("{:<36}", format!("turn {i}")))
        } else {
            Message::assistant(format!("{:<36}", format!("turn {i}")))
        };
        role_msg.with_id(format!("m{i}"))
    }

    fn ids(messages: &[Message]) -> Vec<String> {
        messages
            .iter()
            .map(|m| m.id.clone().map(|id| id.0).unwrap_or_default())
            .collect()
    }

    fn no_entities(keep: usize, summary: usize) -> SelectionOptions {
        SelectionOptions {
            tracked_entities: Some(TrackedEntities::new()),
            always_keep_recent: keep,
            summary_budget: summary,
            weights: RankingWeights::default(),
        }
    }

    #[test]
    fn generous_budget_selects_everything() {
        let messages: Vec<_> = (0..6).map(turn).collect();
        let result = select_context(&messages, 10_000, &no_entities(3, 100));
        assert_eq!(ids(&result.selected), ids(&messages));
        assert!(result.summarized.is_empty());
        assert!(!result.metadata.over_budget);
    }

    #[test]
    fn selection_is_a_partition_in_original_order() {
        let messages: Vec<_> = (0..10).map(turn).collect();
        let result = select_context(&messages, 80, &no_entities(2, 10));

        let mut all = ids(&result.selected);
        all.extend(ids(&result.summarized));
        all.sort();
        let mut expected = ids(&messages);
        expected.sort();
        assert_eq!(all, expected);

        let position = |id: &String| ids(&messages).iter().position(|m| m == id).unwrap();
        let sel: Vec<_> = ids(&result.selected).iter().map(position).collect();
        let sum: Vec<_> = ids(&result.summarized).iter().map(position).collect();
        assert!(sel.windows(2).all(|w| w[0] < w[1]));
        assert!(sum.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn recency_floor_always_selected() {
        let messages: Vec<_> = (0..8).map(turn).collect();
        let result = select_context(&messages, 60, &no_entities(3, 10));
        let selected = ids(&result.selected);
        for id in ["m5", "m6", "m7"] {
            assert!(selected.contains(&id.to_string()));
        }
    }

    #[test]
    fn budget_respected_outside_floor() {
        let messages: Vec<_> = (0..12).map(turn).collect();
        let budget = 100;
        let options = no_entities(2, 20);
        let result = select_context(&messages, budget, &options);

        assert!(result.metadata.selected_tokens + options.summary_budget <= budget);
        assert_eq!(result.metadata.floor_tokens, 26);
        // 100 - 20 - 26 = 54 tokens → four more 13-token turns.
        assert_eq!(result.selected.len(), 6);
        assert_eq!(result.summarized.len(), 6);
    }

    #[test]
    fn floor_over_budget_is_kept_and_exhausts_budget() {
        let messages: Vec<_> = (0..6).map(turn).collect();
        let result = select_context(&messages, 30, &no_entities(3, 10));
        assert_eq!(ids(&result.selected), vec!["m3", "m4", "m5"]);
        assert_eq!(ids(&result.summarized), vec!["m0", "m1", "m2"]);
        assert!(result.metadata.over_budget);
        assert_eq!(result.metadata.selected_tokens, 39);
    }

    #[test]
    fn summary_budget_larger_than_total_keeps_floor_only() {
        let messages: Vec<_> = (0..5).map(turn).collect();
        let result = select_context(&messages, 100, &no_entities(1, 500));
        assert_eq!(ids(&result.selected), vec!["m4"]);
        assert_eq!(result.summarized.len(), 4);
        assert!(result.metadata.over_budget);
    }

    #[test]
    fn entity_overlap_beats_recency() {
        let mut messages: Vec<_> = (0..6).map(turn).collect();
        messages[1] = Message::assistant("The Garland venue holds 300.").with_id("venue");
        let tracked: TrackedEntities = ["Garland", "venue"].into_iter().collect();
        let options = no_entities(2, 0).with_entities(tracked);

        // Floor = m4 + m5 = 26. One more slot of ~13 tokens.
        let result = select_context(&messages, 26 + 13, &options);
        let selected = ids(&result.selected);
        assert!(selected.contains(&"venue".to_string()));
        assert!(!selected.contains(&"m3".to_string()));
    }

    #[test]
    fn without_entities_most_recent_older_turns_win() {
        let messages: Vec<_> = (0..6).map(turn).collect();
        let result = select_context(&messages, 26 + 26, &no_entities(2, 0));
        assert_eq!(ids(&result.selected), vec!["m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn entities_are_computed_when_absent() {
        let messages = vec![
            Message::user("Book the Community Center for the Garland party.").with_id("a"),
            Message::assistant(format!("{:<60}", "ok")).with_id("b"),
            Message::assistant(format!("{:<60}", "noted")).with_id("c"),
            Message::user("Is the Community Center free on Friday?").with_id("d"),
        ];
        let options = SelectionOptions {
            always_keep_recent: 1,
            summary_budget: 0,
            ..SelectionOptions::default()
        };
        let floor = estimate_message_tokens(&messages[3]);
        let first = estimate_message_tokens(&messages[0]);
        let result = select_context(&messages, floor + first, &options);
        assert_eq!(ids(&result.selected), vec!["a", "d"]);
    }

    #[test]
    fn oversized_candidates_are_skipped_not_blocking() {
        let messages = vec![
            Message::assistant("short").with_id("small"),
            Message::assistant("x".repeat(400)).with_id("huge"),
            Message::user("latest?").with_id("last"),
        ];
        let result = select_context(&messages, 40, &no_entities(1, 0));
        assert_eq!(ids(&result.selected), vec!["small", "last"]);
        assert_eq!(ids(&result.summarized), vec!["huge"]);
    }

    #[test]
    fn keep_recent_larger_than_history() {
        let messages: Vec<_> = (0..2).map(turn).collect();
        let result = select_context(&messages, 1, &no_entities(10, 0));
        assert_eq!(result.selected.len(), 2);
        assert!(result.summarized.is_empty());
        assert!(result.metadata.over_budget);
    }

    #[test]
    fn zero_floor_allows_empty_selection() {
        let messages: Vec<_> = (0..3).map(turn).collect();
        let result = select_context(&messages, 5, &no_entities(0, 0));
        assert!(result.selected.is_empty());
        assert_eq!(result.summarized.len(), 3);
        assert!(!result.metadata.over_budget);
    }

    #[test]
    fn empty_conversation() {
        let result = select_context(&[], 100, &SelectionOptions::default());
        assert!(result.selected.is_empty());
        assert!(result.summarized.is_empty());
        assert_eq!(result.metadata.selected_tokens, 0);
    }

    #[test]
    fn deterministic_selection() {
        let messages: Vec<_> = (0..9).map(turn).collect();
        let options = SelectionOptions::default();
        let a = select_context(&messages, 90, &options);
        let b = select_context(&messages, 90, &options);
        assert_eq!(ids(&a.selected), ids(&b.selected));
        assert_eq!(a.metadata, b.metadata);
    }

    #[test]
    fn custom_estimator_is_used() {
        struct PerMessage;
        impl TokenEstimator for PerMessage {
            fn message_tokens(&self, _message: &Message) -> usize {
                1
            }
        }
        let messages: Vec<_> = (0..5).map(turn).collect();
        let selector = ContextSelector::with_estimator(PerMessage);
        let result = selector.select(&messages, 3, &no_entities(1, 0));
        assert_eq!(result.selected.len(), 3);
        assert_eq!(result.metadata.selected_tokens, 3);
    }

    #[test]
    fn metadata_counts_add_up() {
        let messages: Vec<_> = (0..7).map(turn).collect();
        let result = select_context(&messages, 70, &no_entities(2, 5));
        let total: usize = messages.iter().map(estimate_message_tokens).sum();
        let meta = &result.metadata;
        assert_eq!(meta.selected_tokens + meta.summarized_tokens, total);
        assert_eq!(meta.selected_count + meta.summarized_count, messages.len());
    }

    #[test]
    fn selection_serializes_for_the_orchestrator() {
        let messages: Vec<_> = (0..4).map(turn).collect();
        let result = select_context(&messages, 30, &no_entities(1, 0));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["selected"].as_array().unwrap().len(), result.selected.len());
        assert_eq!(json["metadata"]["budget"], 30);
        assert_eq!(json["selected"][0]["role"], "user");
    }

    #[test]
    fn transcript_labels_roles() {
        let text = render_transcript(&[Message::user("Hi"), Message::assistant("Hello")]);
        assert_eq!(text, "User: Hi\n\nAssistant: Hello");
    }
}
