pub mod provider;

use async_trait::async_trait;
use std::sync::Arc;

use super::LlmConfig;
use self::provider::ProviderEmbeddingClient;
use crate::error::BoxError;

#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse, BoxError>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn EmbeddingClient>, BoxError> {
    let client = ProviderEmbeddingClient::from_config(config)?;
    Ok(Arc::new(client))
}
