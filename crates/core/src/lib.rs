//! # convoctx core
//!
//! Domain types and error definitions shared by the context-selection and
//! citation crates. This crate performs **no I/O**; it only defines the
//! values that flow between the chat orchestrator and the pure processing
//! stages.
//!
//! ## Pipeline
//!
//! ```text
//! Conversation ──► entity tracker ──► context selector ──► LLM call (external)
//!                                                              │
//! rendered text ◄── citation parser ◄──────────────────────────┘
//! ```

pub mod error;
pub mod message;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Conversation, ConversationId, Message, MessageId, Role};
