use async_trait::async_trait;
use rllm::{ builder::{ LLMBackend, LLMBuilder }, LLMProvider };

use super::{ EmbeddingClient, EmbeddingResponse };
use crate::error::BoxError;
use crate::llm::{ LlmConfig, LlmType };

/// Query embedder for the backends that expose an embedding endpoint.
pub struct ProviderEmbeddingClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    llm_type: LlmType,
}

fn embedding_backend(llm_type: LlmType) -> Result<(LLMBackend, &'static str), BoxError> {
    match llm_type {
        LlmType::Ollama => Ok((LLMBackend::Ollama, "nomic-embed-text")),
        LlmType::OpenAI => Ok((LLMBackend::OpenAI, "text-embedding-3-small")),
        LlmType::Gemini => Ok((LLMBackend::Google, "text-embedding-004")),
        other => Err(format!("{} does not provide an embedding endpoint", other).into()),
    }
}

impl ProviderEmbeddingClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, BoxError> {
        let (backend, default_model) = embedding_backend(config.llm_type)?;
        let model = config.embedding_model.clone().unwrap_or_else(|| default_model.to_string());

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(model)
            .stream(false);

        match (config.llm_type, config.api_key.clone()) {
            (LlmType::Ollama, _) => {
                let url = config.base_url.clone().unwrap_or_else(|| "http://localhost:11434".to_string());
                builder = builder.base_url(url);
            }
            (_, Some(key)) => {
                builder = builder.api_key(key);
                if let Some(url) = &config.base_url {
                    builder = builder.base_url(url);
                }
            }
            (other, None) => {
                return Err(format!("API key is required for {} embeddings", other).into());
            }
        }

        let llm = builder.build()?;

        Ok(Self { llm, llm_type: config.llm_type })
    }
}

#[async_trait]
impl EmbeddingClient for ProviderEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<EmbeddingResponse, BoxError> {
        let mut embeddings = self.llm.embed(vec![text.to_string()]).await?;
        let embedding = embeddings
            .pop()
            .ok_or_else(|| format!("{} embedding generation returned no results", self.llm_type))?;

        Ok(EmbeddingResponse { embedding })
    }
}
