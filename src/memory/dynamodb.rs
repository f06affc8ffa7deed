use super::{pair_turns, ConversationStore, MessageRole, Turn};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;

const KEY_ATTRIBUTE: &str = "SessionId";
const HISTORY_ATTRIBUTE: &str = "History";
const APPEND_EXPRESSION: &str = "SET History = list_append(if_not_exists(History, :empty), :turn)";

/// History in a DynamoDB table, one item per conversation.
///
/// Items look like
/// `{ SessionId: S, History: L[ M{ type: S, data: M{ content: S, type: S } } ] }`.
pub struct DynamoConversationStore {
    client: Client,
    table: String,
}

impl DynamoConversationStore {
    pub fn new(client: Client, table: String) -> Self {
        Self { client, table }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig, table: String) -> Self {
        Self::new(Client::new(config), table)
    }
}

fn message_attribute(role: MessageRole, content: String) -> AttributeValue {
    let data = HashMap::from([
        ("content".to_string(), AttributeValue::S(content)),
        ("type".to_string(), AttributeValue::S(role.as_str().to_string())),
    ]);
    AttributeValue::M(HashMap::from([
        ("type".to_string(), AttributeValue::S(role.as_str().to_string())),
        ("data".to_string(), AttributeValue::M(data)),
    ]))
}

/// Parse one stored message; entries that do not look like a message are skipped.
fn parse_message(value: &AttributeValue) -> Option<(MessageRole, String)> {
    let fields = value.as_m().ok()?;
    let role = MessageRole::parse(fields.get("type")?.as_s().ok()?)?;
    let content = fields.get("data")?.as_m().ok()?.get("content")?.as_s().ok()?;
    Some((role, content.clone()))
}

fn history_from_item(item: &HashMap<String, AttributeValue>) -> Vec<Turn> {
    let messages = item
        .get(HISTORY_ATTRIBUTE)
        .and_then(|h| h.as_l().ok())
        .map(|list| list.iter().filter_map(parse_message).collect::<Vec<_>>())
        .unwrap_or_default();
    pair_turns(messages)
}

#[async_trait]
impl ConversationStore for DynamoConversationStore {
    fn provider_name(&self) -> &'static str {
        "dynamodb"
    }

    async fn load(&self, conversation_id: &str) -> Result<Vec<Turn>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(conversation_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to read conversation '{}' from {}: {}",
                    conversation_id,
                    self.table,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(output
            .item
            .as_ref()
            .map(history_from_item)
            .unwrap_or_default())
    }

    async fn append(&self, conversation_id: &str, turn: Turn) -> Result<()> {
        let messages = AttributeValue::L(vec![
            message_attribute(MessageRole::Human, turn.question),
            message_attribute(MessageRole::Ai, turn.answer),
        ]);

        self.client
            .update_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(conversation_id.to_string()))
            .update_expression(APPEND_EXPRESSION)
            .expression_attribute_values(":empty", AttributeValue::L(Vec::new()))
            .expression_attribute_values(":turn", messages)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to append to conversation '{}' in {}: {}",
                    conversation_id,
                    self.table,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }
}
