use crate::models::chat::{ Chunk, Message };

pub const DEFAULT_THREAD_ID: &str = "default";

/// Resolves a possibly missing thread identifier to the one used for storage.
pub fn resolve_thread_id(thread_id: Option<&str>) -> String {
    match thread_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => DEFAULT_THREAD_ID.to_string(),
    }
}

/// State of one conversation for the duration of a single question/answer cycle.
/// Only `messages` outlives the turn; `input`, `answer` and `context` are transient.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversationState {
    pub thread_id: String,
    pub messages: Vec<Message>,
    pub input: String,
    pub answer: String,
    pub context: Vec<Chunk>,
}

impl ConversationState {
    pub fn new(thread_id: Option<&str>) -> Self {
        Self {
            thread_id: resolve_thread_id(thread_id),
            messages: Vec::new(),
            input: String::new(),
            answer: String::new(),
            context: Vec::new(),
        }
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Most recent human turn together with every message before it. This is the
    /// question the answer stage works on and the history it is asked against.
    pub fn latest_question(&self) -> Option<(&str, &[Message])> {
        let at = self.messages.iter().rposition(|m| matches!(m, Message::Human(_)))?;
        Some((self.messages[at].content(), &self.messages[..at]))
    }

    pub fn merge(mut self, delta: StateDelta) -> Self {
        if let Some(messages) = delta.replace_messages {
            self.messages = messages;
        }
        self.messages.extend(delta.append_messages);
        if let Some(answer) = delta.answer {
            self.answer = answer;
        }
        if let Some(context) = delta.context {
            self.context = context;
        }
        self
    }
}

/// Changes produced by one pipeline stage. Replacement of the history is applied
/// before any appended messages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateDelta {
    pub replace_messages: Option<Vec<Message>>,
    pub append_messages: Vec<Message>,
    pub answer: Option<String>,
    pub context: Option<Vec<Chunk>>,
}

impl StateDelta {
    pub fn none() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_thread_resolves_to_sentinel() {
        assert_eq!(resolve_thread_id(None), DEFAULT_THREAD_ID);
        assert_eq!(resolve_thread_id(Some("   ")), DEFAULT_THREAD_ID);
        assert_eq!(resolve_thread_id(Some("t1")), "t1");
    }

    #[test]
    fn replacement_happens_before_append() {
        let state = ConversationState::new(Some("t1")).with_messages(vec![Message::human("stale")]);
        let merged = state.merge(StateDelta {
            replace_messages: Some(vec![Message::human("restored")]),
            append_messages: vec![Message::human("new")],
            ..StateDelta::none()
        });

        let contents: Vec<&str> = merged.messages.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["restored", "new"]);
    }

    #[test]
    fn latest_question_skips_assistant_turns() {
        let state = ConversationState::new(None).with_messages(vec![
            Message::human("first"),
            Message::assistant("reply"),
            Message::human("second"),
            Message::assistant("reply two"),
        ]);
        let (question, history) = state.latest_question().unwrap();
        assert_eq!(question, "second");
        assert_eq!(history.len(), 2);
        assert!(ConversationState::new(None).latest_question().is_none());
    }
}
