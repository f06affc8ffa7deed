use super::{ConversationStore, Turn};
use crate::types::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-local history, lost on restart.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, Vec<Turn>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    fn provider_name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, conversation_id: &str) -> Result<Vec<Turn>> {
        Ok(self
            .conversations
            .read()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<()> {
        self.conversations
            .write()
            .entry(conversation_id.to_string())
            .or_default()
            .push(turn);
        Ok(())
    }
}
