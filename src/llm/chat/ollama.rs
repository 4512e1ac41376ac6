use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use serde_json::Value;

use super::{ ChatClient, CompletionResponse };
use crate::error::BoxError;
use crate::llm::{ LlmConfig, LlmType };
use crate::models::chat::MessageMetadata;

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    stream: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
    response: String,
    thinking: Option<String>,
    model: Option<String>,
    done_reason: Option<String>,
    eval_count: Option<u64>,
}

impl GenerateResponse {
    fn into_completion(self) -> CompletionResponse {
        let mut metadata = MessageMetadata::default();
        if let Some(thinking) = self.thinking {
            metadata.provider.insert("thinking".into(), Value::String(thinking));
        }
        if let Some(model) = self.model {
            metadata.response.insert("model".into(), Value::String(model));
        }
        if let Some(reason) = self.done_reason {
            metadata.response.insert("done_reason".into(), Value::String(reason));
        }
        if let Some(count) = self.eval_count {
            metadata.response.insert("eval_count".into(), Value::from(count));
        }
        CompletionResponse { response: self.response, metadata }
    }
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, completion_model: Option<String>) -> Self {
        let model = completion_model.unwrap_or_else(|| "cogito:3b".to_string());
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());

        Self {
            http: HttpClient::new(),
            base_url: url,
            completion_model: model,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, BoxError> {
        if config.llm_type != LlmType::Ollama {
            return Err("Invalid config type for OllamaClient".into());
        }

        Ok(Self::new(config.base_url.clone(), config.completion_model.clone()))
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<CompletionResponse, BoxError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let req = GenerateRequest {
            model: &self.completion_model,
            prompt,
            system,
            stream: false,
        };
        debug!("Ollama generate → model={} url={}", self.completion_model, url);
        let resp = self.http.post(&url).json(&req).send().await?.error_for_status()?;
        let data = resp.json::<GenerateResponse>().await?;
        Ok(data.into_completion())
    }

    fn get_model(&self) -> String {
        self.completion_model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_response_field_reads_as_empty_text() {
        let data: GenerateResponse = serde_json::from_str(r#"{"model":"llama3","done":true}"#).unwrap();
        let completion = data.into_completion();
        assert_eq!(completion.response, "");
        assert_eq!(completion.metadata.response["model"], "llama3");
    }

    #[test]
    fn thinking_is_kept_as_provider_metadata() {
        let data: GenerateResponse = serde_json
            ::from_str(r#"{"response":"42","thinking":"let me see"}"#)
            .unwrap();
        let completion = data.into_completion();
        assert_eq!(completion.response, "42");
        assert_eq!(completion.metadata.provider["thinking"], "let me see");
    }

    #[test]
    fn empty_system_is_not_sent() {
        let req = GenerateRequest { model: "m", prompt: "p", system: "", stream: false };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn rejects_foreign_config() {
        let config = LlmConfig { llm_type: LlmType::OpenAI, ..LlmConfig::default() };
        assert!(OllamaClient::from_config(&config).is_err());
    }
}
