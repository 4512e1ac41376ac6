use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{ Duration, Instant };
use tokio::sync::RwLock;

use crate::error::BoxError;
use crate::history::{ decode_payload, encode_payload, history_key, HistoryStore };
use crate::models::chat::Message;

struct Entry {
    raw: String,
    expires_at: Option<Instant>,
}

/// Process-local store. Records go through the same encoding as the Redis store.
pub struct MemoryHistoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    key_prefix: String,
    ttl_secs: u64,
}

impl MemoryHistoryStore {
    pub fn new(key_prefix: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            key_prefix: key_prefix.into(),
            ttl_secs,
        }
    }

    /// Stored JSON for a thread, if present and not expired.
    pub async fn raw(&self, thread_id: &str) -> Option<String> {
        let key = history_key(&self.key_prefix, thread_id);
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|e| !is_expired(e))
            .map(|e| e.raw.clone())
    }

    /// Writes a raw record, bypassing encoding.
    pub async fn put_raw(&self, thread_id: &str, raw: impl Into<String>) {
        let key = history_key(&self.key_prefix, thread_id);
        self.entries.write().await.insert(key, Entry { raw: raw.into(), expires_at: None });
    }
}

fn is_expired(entry: &Entry) -> bool {
    entry.expires_at.map_or(false, |at| Instant::now() >= at)
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self, thread_id: &str) -> Result<Vec<Message>, BoxError> {
        let key = history_key(&self.key_prefix, thread_id);
        let mut entries = self.entries.write().await;
        let expired = match entries.get(&key) {
            Some(entry) => is_expired(entry),
            None => return Ok(Vec::new()),
        };
        if expired {
            entries.remove(&key);
            return Ok(Vec::new());
        }
        Ok(entries.get(&key).map(|e| decode_payload(&key, &e.raw)).unwrap_or_default())
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<(), BoxError> {
        let key = history_key(&self.key_prefix, thread_id);
        let raw = encode_payload(messages)?;
        let expires_at = if self.ttl_secs > 0 {
            Some(Instant::now() + Duration::from_secs(self.ttl_secs))
        } else {
            None
        };
        self.entries.write().await.insert(key, Entry { raw, expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_thread_loads_empty() {
        let store = MemoryHistoryStore::new("h:", 0);
        assert!(store.load("never-seen").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn threads_do_not_collide() {
        let store = MemoryHistoryStore::new("h:", 0);
        store.save("a", &[Message::human("from a")]).await.unwrap();
        store.save("b", &[Message::human("from b")]).await.unwrap();

        assert_eq!(store.load("a").await.unwrap(), vec![Message::human("from a")]);
        assert_eq!(store.load("b").await.unwrap(), vec![Message::human("from b")]);
    }

    #[tokio::test]
    async fn save_overwrites_previous_record() {
        let store = MemoryHistoryStore::new("h:", 0);
        store.save("t", &[Message::human("one")]).await.unwrap();
        store.save("t", &[Message::human("one"), Message::assistant("two")]).await.unwrap();
        assert_eq!(store.load("t").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_record_loads_empty() {
        let store = MemoryHistoryStore::new("h:", 0);
        store.put_raw("t", "{broken").await;
        assert!(store.load("t").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_record_is_gone() {
        let store = MemoryHistoryStore::new("h:", 1);
        store.save("t", &[Message::human("short lived")]).await.unwrap();
        assert_eq!(store.load("t").await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(store.load("t").await.unwrap().is_empty());
        assert!(store.raw("t").await.is_none());
    }
}
