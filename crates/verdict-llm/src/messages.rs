//! Message types for model conversations

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text { text: String },

    /// Tool call requested by the assistant
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Result of a tool call, sent back as a user turn
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Message content: either simple text or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Text(text.into())),
        }
    }

    /// Create an assistant message that requests one tool call
    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input,
            }])),
        }
    }

    /// Create a user message carrying a tool result
    pub fn tool_result(tool_use_id: impl Into<String>, result: impl Into<String>, is_error: bool) -> Self {
        Self {
            role: Role::User,
            content: Some(MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: result.into(),
                is_error: is_error.then_some(true),
            }])),
        }
    }

    /// First text content of the message
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(MessageContent::Text(s)) => Some(s),
            Some(MessageContent::Blocks(blocks)) => blocks.iter().find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            }),
            None => None,
        }
    }

    /// Tool calls requested in this message as `(id, name, input)`
    pub fn tool_uses(&self) -> Vec<(&str, &str, &serde_json::Value)> {
        match &self.content {
            Some(MessageContent::Blocks(blocks)) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, input } => {
                        Some((id.as_str(), name.as_str(), input))
                    }
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_message() {
        let msg = Message::user("Analyze AAPL");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), Some("Analyze AAPL"));
        assert!(msg.tool_uses().is_empty());
    }

    #[test]
    fn test_tool_call_message() {
        let msg = Message::tool_call("call_1", "fetch_headlines", json!({"ticker": "AAPL"}));
        let uses = msg.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].1, "fetch_headlines");
        assert_eq!(msg.text(), None);
    }

    #[test]
    fn test_tool_result_error_flag() {
        let msg = Message::tool_result("call_1", "boom", true);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"][0]["is_error"], true);
    }
}
