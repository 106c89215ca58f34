//! Message and Conversation domain types.
//!
//! A conversation is an ordered list of user/assistant turns. The pure
//! processing stages only ever read these values; selection re-packages
//! clones and never mutates the caller's history.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of a single message, when the caller has one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
///
/// Closed on purpose: an unknown role string fails deserialization instead
/// of silently bypassing role-dependent scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    /// Transcript label ("User" / "Assistant").
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Optional stable identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,

    /// Who sent this message
    pub role: Role,

    /// The text content (may contain markdown, code fences, citation markers)
    pub content: String,
}

impl Message {
    /// Create a new user message without an identifier.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message without an identifier.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Attach a stable identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(MessageId(id.into()));
        self
    }
}

/// A conversation is an ordered sequence of messages with shared context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    #[serde(default)]
    pub id: ConversationId,

    /// Optional title (auto-generated or user-set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Ordered messages
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Either shape accepted on the wire: a full conversation or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConversationWire {
    Full(Conversation),
    Bare(Vec<Message>),
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            title: None,
            messages: Vec::new(),
        }
    }

    /// Build a conversation around an existing message list.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::new()
        }
    }

    /// Parse a conversation from JSON.
    ///
    /// Accepts either `{"id": .., "messages": [..]}` or a bare array of
    /// messages.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !(value.is_array() || value.is_object()) {
            return Err(Error::InvalidConversation(
                "expected a JSON object or an array of messages".into(),
            ));
        }
        let wire: ConversationWire = serde_json::from_value(value)
            .map_err(|e| Error::InvalidConversation(e.to_string()))?;
        Ok(match wire {
            ConversationWire::Full(conversation) => conversation,
            ConversationWire::Bare(messages) => Self::from_messages(messages),
        })
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.id.is_none());
    }

    #[test]
    fn with_id_attaches_identifier() {
        let msg = Message::assistant("Sure").with_id("m-1");
        assert_eq!(msg.id, Some(MessageId::from("m-1")));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(json.contains(r#""role":"user""#));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = serde_json::from_str::<Message>(r#"{"role":"system","content":"x"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn conversation_tracks_pushes() {
        let mut conv = Conversation::new();
        assert!(conv.is_empty());
        conv.push(Message::user("First message"));
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn from_json_accepts_bare_array() {
        let conv = Conversation::from_json(
            r#"[{"role":"user","content":"Hi"},{"role":"assistant","content":"Hello","id":"a1"}]"#,
        )
        .unwrap();
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages[1].id, Some(MessageId::from("a1")));
    }

    #[test]
    fn from_json_accepts_full_object() {
        let conv = Conversation::from_json(
            r#"{"id":"c-9","title":"Planning","messages":[{"role":"user","content":"Hi"}]}"#,
        )
        .unwrap();
        assert_eq!(conv.id, ConversationId::from("c-9"));
        assert_eq!(conv.title.as_deref(), Some("Planning"));
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn from_json_rejects_scalars() {
        let err = Conversation::from_json("42").unwrap_err();
        assert!(matches!(err, Error::InvalidConversation(_)));
    }

    #[test]
    fn from_json_reports_syntax_errors() {
        let err = Conversation::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
