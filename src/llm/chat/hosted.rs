use async_trait::async_trait;
use log::debug;
use rllm::{
    builder::{ LLMBackend, LLMBuilder },
    chat::{ ChatMessage, ChatRole, MessageType },
    LLMProvider,
};

use super::{ ChatClient, CompletionResponse };
use crate::error::BoxError;
use crate::llm::{ LlmConfig, LlmType };

/// Chat client for the hosted providers reached through `rllm`.
pub struct HostedChatClient {
    llm: Box<dyn LLMProvider + Send + Sync>,
    llm_type: LlmType,
    model: String,
}

fn backend_defaults(llm_type: LlmType) -> Result<(LLMBackend, &'static str), BoxError> {
    match llm_type {
        LlmType::Anthropic => Ok((LLMBackend::Anthropic, "claude-3-5-haiku-latest")),
        LlmType::Gemini => Ok((LLMBackend::Google, "gemini-1.5-flash-latest")),
        LlmType::DeepSeek => Ok((LLMBackend::DeepSeek, "deepseek-chat")),
        LlmType::XAI => Ok((LLMBackend::XAI, "grok-3-latest")),
        LlmType::Groq => Ok((LLMBackend::Groq, "llama-3.1-8b-instant")),
        other => Err(format!("{} is not served by the hosted chat client", other).into()),
    }
}

/// Folds the system instruction into the single user turn sent to the provider.
fn combined_prompt(system: &str, prompt: &str) -> String {
    if system.is_empty() {
        prompt.to_string()
    } else {
        format!("{}\n\n{}", system, prompt)
    }
}

impl HostedChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, BoxError> {
        let (backend, default_model) = backend_defaults(config.llm_type)?;
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| format!("API key is required for {} chat", config.llm_type))?;
        let model = config.completion_model.clone().unwrap_or_else(|| default_model.to_string());

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .api_key(api_key)
            .model(&model)
            .stream(false);

        if let Some(url) = &config.base_url {
            builder = builder.base_url(url);
        }

        let llm = builder.build()?;

        Ok(Self { llm, llm_type: config.llm_type, model })
    }
}

#[async_trait]
impl ChatClient for HostedChatClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<CompletionResponse, BoxError> {
        let messages = vec![ChatMessage {
            role: ChatRole::User,
            content: combined_prompt(system, prompt),
            message_type: MessageType::Text,
        }];
        debug!("{} chat → model={}", self.llm_type, self.model);
        let resp = self.llm.chat(&messages).await?;
        Ok(CompletionResponse::text(resp.text().unwrap_or_default()))
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backends_are_not_hosted() {
        assert!(backend_defaults(LlmType::Ollama).is_err());
        assert!(backend_defaults(LlmType::OpenAI).is_err());
        assert!(backend_defaults(LlmType::Groq).is_ok());
    }

    #[test]
    fn system_instruction_leads_the_prompt() {
        assert_eq!(combined_prompt("Be terse.", "Why?"), "Be terse.\n\nWhy?");
        assert_eq!(combined_prompt("", "Why?"), "Why?");
    }

    #[test]
    fn api_key_is_required() {
        let config = LlmConfig { llm_type: LlmType::Anthropic, ..LlmConfig::default() };
        assert!(HostedChatClient::from_config(&config).is_err());
    }
}
