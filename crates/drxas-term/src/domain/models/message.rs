#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
use serde::Deserialize;
use serde::Serialize;

use super::Role;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default, Debug)]
pub enum MessageType {
    #[default]
    Normal,
    /// Placeholder shown while a request is in flight.
    Provisional,
    Error,
}

/// One piece of a chat message.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
    Text { text: String },
    Code { text: String },
    /// Reference to an image, a URL or a storage key.
    Image { source: String },
}

impl MessagePart {
    pub fn text(&self) -> &str {
        match self {
            MessagePart::Text { text } => return text,
            MessagePart::Code { text } => return text,
            MessagePart::Image { source } => return source,
        }
    }

    /// Splits markdown-ish text into prose and fenced code parts.
    pub fn parse(text: &str) -> Vec<MessagePart> {
        let mut parts: Vec<MessagePart> = vec![];
        let mut current: Vec<&str> = vec![];
        let mut in_codeblock = false;

        for line in text.split('\n') {
            if line.trim().starts_with("```") {
                let joined = current.join("\n");
                if in_codeblock {
                    parts.push(MessagePart::Code { text: joined });
                } else if !joined.trim().is_empty() {
                    parts.push(MessagePart::Text { text: joined });
                }
                current = vec![];
                in_codeblock = !in_codeblock;
                continue;
            }

            current.push(line);
        }

        // An unterminated fence is kept as prose.
        let rest = current.join("\n");
        if in_codeblock {
            parts.push(MessagePart::Text {
                text: format!("```\n{rest}"),
            });
        } else if !rest.trim().is_empty() || parts.is_empty() {
            parts.push(MessagePart::Text { text: rest });
        }

        return parts;
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default, Debug)]
pub struct Message {
    pub role: Role,
    pub content: Vec<MessagePart>,
    pub message_type: MessageType,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message::new_with_type(role, MessageType::Normal, text);
    }

    pub fn new_with_type(role: Role, message_type: MessageType, text: &str) -> Message {
        return Message {
            role,
            content: MessagePart::parse(&text.replace('\t', "  ")),
            message_type,
        };
    }

    pub fn message_type(&self) -> MessageType {
        return self.message_type.clone();
    }

    pub fn is_provisional(&self) -> bool {
        return self.message_type == MessageType::Provisional;
    }

    pub fn is_error(&self) -> bool {
        return self.message_type == MessageType::Error;
    }

    /// Flattened text, code parts re-fenced.
    pub fn text(&self) -> String {
        return self
            .content
            .iter()
            .map(|part| match part {
                MessagePart::Text { text } => text.to_string(),
                MessagePart::Code { text } => format!("```\n{text}\n```"),
                MessagePart::Image { source } => format!("[image: {source}]"),
            })
            .collect::<Vec<String>>()
            .join("\n");
    }

    pub fn codeblocks(&self) -> Vec<String> {
        return self
            .content
            .iter()
            .filter_map(|part| match part {
                MessagePart::Code { text } => Some(text.to_string()),
                _ => None,
            })
            .collect();
    }

    pub fn apply(&self, patch: &MessagePatch) -> Message {
        let mut message = self.clone();
        if let Some(role) = patch.role {
            message.role = role;
        }
        if let Some(content) = &patch.content {
            message.content = content.clone();
        }
        if let Some(message_type) = &patch.message_type {
            message.message_type = message_type.clone();
        }

        return message;
    }
}

/// Partial update applied to a message in place.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct MessagePatch {
    pub role: Option<Role>,
    pub content: Option<Vec<MessagePart>>,
    pub message_type: Option<MessageType>,
}

impl MessagePatch {
    pub fn replace(message_type: MessageType, text: &str) -> MessagePatch {
        return MessagePatch {
            role: None,
            content: Some(MessagePart::parse(&text.replace('\t', "  "))),
            message_type: Some(message_type),
        };
    }

    pub fn error(text: &str) -> MessagePatch {
        return MessagePatch::replace(MessageType::Error, text);
    }
}
