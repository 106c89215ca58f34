//! `convoctx entities`: what the conversation is about.

use std::path::Path;

use convoctx_context::{TrackedEntities, extract_entities};
use convoctx_core::{ConversationId, Result};
use serde::Serialize;

use super::{load_conversation, print_json};

#[derive(Debug, Serialize)]
pub struct EntitiesReport {
    pub conversation_id: ConversationId,
    pub count: usize,
    pub entities: TrackedEntities,
}

pub fn build(path: &Path) -> Result<EntitiesReport> {
    let conversation = load_conversation(path)?;
    let entities = extract_entities(&conversation.messages);
    Ok(EntitiesReport {
        conversation_id: conversation.id,
        count: entities.len(),
        entities,
    })
}

pub fn run(path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
    print_json(&build(path)?)
}
