//! Durable conversation history.
//!
//! History is read in full before a conversational request and one turn is
//! appended after it. Stores never rewrite or trim existing turns.

pub mod dynamodb;
pub mod in_memory;

pub use dynamodb::DynamoConversationStore;
pub use in_memory::InMemoryConversationStore;

use crate::types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One exchange: the user's question and the model's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Author of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Human,
    Ai,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::Human => "human",
            MessageRole::Ai => "ai",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "human" => Some(MessageRole::Human),
            "ai" => Some(MessageRole::Ai),
            _ => None,
        }
    }
}

/// Pair a flat message log into turns.
///
/// Each human message opens a turn and the next ai message closes it. A
/// human message followed by another human message, or left unanswered at
/// the end, is dropped, as is an ai message with no open question.
pub fn pair_turns<I>(messages: I) -> Vec<Turn>
where
    I: IntoIterator<Item = (MessageRole, String)>,
{
    let mut turns = Vec::new();
    let mut pending: Option<String> = None;

    for (role, content) in messages {
        match role {
            MessageRole::Human => pending = Some(content),
            MessageRole::Ai => {
                if let Some(question) = pending.take() {
                    turns.push(Turn::new(question, content));
                }
            }
        }
    }

    turns
}

/// Append-only history keyed by conversation id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Backend name used in logs.
    fn provider_name(&self) -> &'static str;

    /// All turns of a conversation, oldest first. Unknown ids have no turns.
    async fn load(&self, conversation_id: &str) -> Result<Vec<Turn>>;

    /// Append one turn to the end of a conversation.
    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<()>;
}
