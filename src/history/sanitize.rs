use crate::models::chat::{ Message, MessageMetadata };
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{ Map, Value };

static REASONING_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<think>.*?</think>|<thinking>.*?</thinking>").expect("valid reasoning markup regex")
});

/// Metadata keys that only make sense inside a single provider round trip.
pub const INTERNAL_METADATA_KEYS: [&str; 3] = ["reasoning_content", "reasoning", "thinking"];

/// Removes every `<think>…</think>` / `<thinking>…</thinking>` segment. Removal is
/// repeated until nothing matches, so segments uncovered by an earlier removal go too.
/// Text that carried markup is trimmed afterwards; other text is returned untouched.
pub fn strip_reasoning(text: &str) -> String {
    if !REASONING_MARKUP.is_match(text) {
        return text.to_string();
    }
    let mut current = text.to_string();
    loop {
        let next = REASONING_MARKUP.replace_all(&current, "");
        if next == current {
            break;
        }
        current = next.into_owned();
    }
    current.trim().to_string()
}

fn is_internal_key(key: &str) -> bool {
    key.starts_with("__") || INTERNAL_METADATA_KEYS.contains(&key)
}

fn strip_internal_keys(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| !is_internal_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub fn sanitize_metadata(metadata: &MessageMetadata) -> MessageMetadata {
    MessageMetadata {
        provider: strip_internal_keys(&metadata.provider),
        response: strip_internal_keys(&metadata.response),
    }
}

/// Storable copy of a message: same role, reasoning markup and internal metadata removed.
pub fn sanitize_message(message: &Message) -> Message {
    let mut clean = message.clone();
    let body = clean.body_mut();
    body.content = strip_reasoning(&body.content);
    body.metadata = sanitize_metadata(&body.metadata);
    clean
}
