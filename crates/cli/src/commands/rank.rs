//! `convoctx rank`: importance of every message.

use std::path::Path;

use convoctx_config::ConvoConfig;
use convoctx_context::{RankedMessage, by_score, extract_entities, rank_message_importance_with};
use convoctx_core::Result;

use super::{load_conversation, print_json, ranking_weights};

pub fn build(config: &ConvoConfig, path: &Path, sorted: bool) -> Result<Vec<RankedMessage>> {
    let conversation = load_conversation(path)?;
    let entities = extract_entities(&conversation.messages);
    let ranked =
        rank_message_importance_with(&conversation.messages, &entities, &ranking_weights(config));
    Ok(if sorted { by_score(ranked) } else { ranked })
}

pub fn run(
    config: &ConvoConfig,
    path: &Path,
    sorted: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    print_json(&build(config, path, sorted)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{EVENT_PLANNING, write_temp};

    #[test]
    fn conversation_order_by_default() {
        let file = write_temp(EVENT_PLANNING);
        let ranked = build(&ConvoConfig::default(), file.path(), false).unwrap();
        let indices: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn sorted_output_descends() {
        let file = write_temp(EVENT_PLANNING);
        let ranked = build(&ConvoConfig::default(), file.path(), true).unwrap();
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn small_talk_ranks_below_the_opening_request() {
        let file = write_temp(EVENT_PLANNING);
        let ranked = build(&ConvoConfig::default(), file.path(), false).unwrap();
        assert!(ranked[0].score > ranked[4].score);
        assert_eq!(ranked[4].entity_mentions, 0);
    }
}
