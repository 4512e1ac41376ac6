pub mod hosted;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use super::{ LlmConfig, LlmType };
use self::hosted::HostedChatClient;
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;
use crate::error::BoxError;
use crate::models::chat::MessageMetadata;

/// Result of one completion. `response` is empty when the provider returned no text.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub response: String,
    pub metadata: MessageMetadata,
}

impl CompletionResponse {
    pub fn text(response: impl Into<String>) -> Self {
        Self { response: response.into(), metadata: MessageMetadata::default() }
    }
}

/// The generation service: one system instruction plus one user prompt in, text out.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        prompt: &str
    ) -> Result<CompletionResponse, BoxError>;

    fn get_model(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, BoxError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::Anthropic | LlmType::Gemini | LlmType::DeepSeek | LlmType::XAI | LlmType::Groq => {
            let specific_client = HostedChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
