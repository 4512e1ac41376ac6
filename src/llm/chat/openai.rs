use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChatClient, CompletionResponse};
use crate::error::BoxError;
use crate::llm::LlmConfig;
use crate::models::chat::MessageMetadata;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    endpoint: String,
}

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OpenAIResponse {
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    usage: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct OpenAIResponseMessage {
    content: Option<String>,
    reasoning_content: Option<String>,
}

impl OpenAIResponse {
    fn into_completion(self) -> CompletionResponse {
        let mut metadata = MessageMetadata::default();
        if let Some(model) = self.model {
            metadata.response.insert("model".into(), Value::String(model));
        }
        if let Some(usage) = self.usage {
            metadata.response.insert("token_usage".into(), usage);
        }
        let first = self.choices.into_iter().next().unwrap_or_default();
        if let Some(reason) = first.finish_reason {
            metadata.response.insert("finish_reason".into(), Value::String(reason));
        }
        if let Some(reasoning) = first.message.reasoning_content {
            metadata.provider.insert("reasoning_content".into(), Value::String(reasoning));
        }
        CompletionResponse {
            response: first.message.content.unwrap_or_default(),
            metadata,
        }
    }
}

/// Accepts either a bare host (`https://api.openai.com`, `http://localhost:8000/`) or a
/// full chat-completions URL.
fn chat_endpoint(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else if trimmed.ends_with("/v1") {
        format!("{}/chat/completions", trimmed)
    } else {
        format!("{}/v1/chat/completions", trimmed)
    }
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, BoxError> {
        let chat_model = model.unwrap_or_else(|| "gpt-4o".to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            model: chat_model,
            endpoint: chat_endpoint(&api_url),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, BoxError> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "OpenAI API key is required".to_string())?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<CompletionResponse, BoxError> {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(OpenAIMessage { role: "system", content: system });
        }
        messages.push(OpenAIMessage { role: "user", content: prompt });

        let req = OpenAIChatRequest {
            model: &self.model,
            messages,
            temperature: 0.2,
            max_completion_tokens: Some(2048),
            store: Some(false),
        };

        debug!("OpenAI chat → model={} endpoint={}", self.model, self.endpoint);
        let resp = self.http.post(&self.endpoint)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json::<OpenAIResponse>()
            .await?;

        Ok(resp.into_completion())
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_accepts_host_or_full_url() {
        assert_eq!(chat_endpoint("https://api.openai.com"), "https://api.openai.com/v1/chat/completions");
        assert_eq!(chat_endpoint("http://localhost:8000/v1/"), "http://localhost:8000/v1/chat/completions");
        assert_eq!(
            chat_endpoint("https://api.openai.com/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn empty_choices_give_empty_text() {
        let resp: OpenAIResponse = serde_json::from_str(r#"{"model":"gpt-4o","choices":[]}"#).unwrap();
        let completion = resp.into_completion();
        assert_eq!(completion.response, "");
        assert_eq!(completion.metadata.response["model"], "gpt-4o");
    }

    #[test]
    fn reasoning_content_goes_to_provider_metadata() {
        let raw = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": "Answer", "reasoning_content": "hidden"},
                "finish_reason": "stop"
            }],
            "usage": {"total_tokens": 12}
        }"#;
        let completion = serde_json::from_str::<OpenAIResponse>(raw).unwrap().into_completion();
        assert_eq!(completion.response, "Answer");
        assert_eq!(completion.metadata.provider["reasoning_content"], "hidden");
        assert_eq!(completion.metadata.response["finish_reason"], "stop");
    }

    #[test]
    fn api_key_is_required() {
        let config = LlmConfig { llm_type: crate::llm::LlmType::OpenAI, ..LlmConfig::default() };
        assert!(OpenAIChatClient::from_config(&config).is_err());
    }
}
