use serde::{ Serialize, Deserialize };
use serde_json::{ Map, Value };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    Human,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "System"),
            Role::Human => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// Free-form metadata attached to a message. `provider` carries provider-specific
/// extras returned alongside a completion, `response` carries response bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub provider: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub response: Map<String, Value>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.provider.is_empty() && self.response.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    pub content: String,
    #[serde(default, skip_serializing_if = "MessageMetadata::is_empty")]
    pub metadata: MessageMetadata,
}

/// One conversational turn. Serialized as `{"role": ..., "content": ..., "metadata"?: ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System(MessageBody),
    Human(MessageBody),
    Assistant(MessageBody),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System(MessageBody { content: content.into(), metadata: MessageMetadata::default() })
    }

    pub fn human(content: impl Into<String>) -> Self {
        Message::Human(MessageBody { content: content.into(), metadata: MessageMetadata::default() })
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant(MessageBody { content: content.into(), metadata: MessageMetadata::default() })
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.body_mut().metadata = metadata;
        self
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System(_) => Role::System,
            Message::Human(_) => Role::Human,
            Message::Assistant(_) => Role::Assistant,
        }
    }

    pub fn body(&self) -> &MessageBody {
        match self {
            Message::System(body) | Message::Human(body) | Message::Assistant(body) => body,
        }
    }

    pub fn body_mut(&mut self) -> &mut MessageBody {
        match self {
            Message::System(body) | Message::Human(body) | Message::Assistant(body) => body,
        }
    }

    pub fn content(&self) -> &str {
        &self.body().content
    }

    pub fn metadata(&self) -> &MessageMetadata {
        &self.body().metadata
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Message::System(_))
    }
}

/// A unit of retrieved context. Rank is implied by position in the returned list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self { text: text.into(), source_id: source_id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_role_tag() {
        let json = serde_json::to_value(Message::human("hello")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "human", "content": "hello" }));
    }

    #[test]
    fn metadata_is_kept_when_present() {
        let mut metadata = MessageMetadata::default();
        metadata.response.insert("model".into(), Value::String("llama3".into()));
        let msg = Message::assistant("hi").with_metadata(metadata.clone());

        let raw = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.role(), Role::Assistant);
        assert_eq!(back.metadata(), &metadata);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed = serde_json::from_str::<Message>(r#"{"role":"tool","content":"x"}"#);
        assert!(parsed.is_err());
    }
}
