use async_trait::async_trait;
use log::{ debug, info, warn };
use redis::aio::MultiplexedConnection;
use redis::{ AsyncCommands, Client, RedisError };
use tokio::sync::Mutex;

use crate::error::BoxError;
use crate::history::{ decode_payload, encode_payload, history_key, HistoryStore };
use crate::models::chat::Message;

/// Redis-backed history. Owns its client and a single multiplexed connection that
/// is opened on first use and dropped again after a connection-level failure, so
/// the next call reconnects instead of reusing a dead handle.
pub struct RedisHistoryStore {
    client: Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    key_prefix: String,
    ttl_secs: u64,
}

impl RedisHistoryStore {
    pub fn new(url: &str, key_prefix: String, ttl_secs: u64) -> Result<Self, BoxError> {
        Ok(Self {
            client: Client::open(url)?,
            connection: Mutex::new(None),
            key_prefix,
            ttl_secs,
        })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, RedisError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        info!("Connected to history store at {}", self.client.get_connection_info().addr);
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset_if_broken(&self, err: &RedisError) {
        if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
            if self.connection.lock().await.take().is_some() {
                warn!("Dropping history store connection after failure: {}", err);
            }
        }
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn load(&self, thread_id: &str) -> Result<Vec<Message>, BoxError> {
        let key = history_key(&self.key_prefix, thread_id);
        let mut conn = self.get_connection().await?;
        let raw: Option<String> = match conn.get(&key).await {
            Ok(raw) => raw,
            Err(e) => {
                self.reset_if_broken(&e).await;
                return Err(Box::new(e));
            }
        };
        match raw {
            Some(raw) => Ok(decode_payload(&key, &raw)),
            None => {
                debug!("No stored history at '{}'", key);
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> Result<(), BoxError> {
        let key = history_key(&self.key_prefix, thread_id);
        let json_payload = encode_payload(messages)?;
        let mut conn = self.get_connection().await?;
        let result = if self.ttl_secs > 0 {
            conn.set_ex::<_, _, ()>(&key, &json_payload, self.ttl_secs).await
        } else {
            conn.set::<_, _, ()>(&key, &json_payload).await
        };
        if let Err(e) = result {
            self.reset_if_broken(&e).await;
            return Err(Box::new(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_rejected_up_front() {
        assert!(RedisHistoryStore::new("not a url", "h:".into(), 0).is_err());
    }

    #[tokio::test]
    async fn unreachable_store_is_an_error_and_not_cached() {
        let store = RedisHistoryStore::new("redis://127.0.0.1:1", "h:".into(), 0).unwrap();
        assert!(store.load("t1").await.is_err());
        assert!(store.connection.lock().await.is_none());
        assert!(store.save("t1", &[Message::human("q")]).await.is_err());
    }

    #[tokio::test]
    async fn connection_dropped_mid_session_is_cleared() {
        use tokio::io::{ AsyncReadExt, AsyncWriteExt };
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            // First GET gets a nil reply, the next command gets a hang-up.
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(b"$-1\r\n").await.unwrap();
            let _ = socket.read(&mut buf).await;
        });

        let store = RedisHistoryStore::new(&format!("redis://{}", addr), "h:".into(), 0).unwrap();
        assert!(store.load("t1").await.unwrap().is_empty());
        assert!(store.connection.lock().await.is_some());

        assert!(store.load("t1").await.is_err());
        server.await.unwrap();
        assert!(store.connection.lock().await.is_none());
    }

    // Integration tests require a running Redis instance
    // These are marked as ignored by default

    #[tokio::test]
    #[ignore]
    async fn test_save_and_load() {
        let store = RedisHistoryStore::new("redis://127.0.0.1:6379", "rag:test:".into(), 60).unwrap();
        let messages = vec![Message::human("What is the refund policy?"), Message::assistant("30 days.")];

        store.save("roundtrip", &messages).await.unwrap();
        assert_eq!(store.load("roundtrip").await.unwrap(), messages);
        assert!(store.load("missing-thread").await.unwrap().is_empty());
    }
}
