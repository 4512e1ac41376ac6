pub mod chat;
pub mod embedding;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Provider family behind a chat or embedding client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LlmType {
    #[default]
    Ollama,
    OpenAI,
    Anthropic,
    Gemini,
    DeepSeek,
    XAI,
    Groq,
}

const PROVIDER_NAMES: [(&str, LlmType); 7] = [
    ("ollama", LlmType::Ollama),
    ("openai", LlmType::OpenAI),
    ("anthropic", LlmType::Anthropic),
    ("gemini", LlmType::Gemini),
    ("deepseek", LlmType::DeepSeek),
    ("xai", LlmType::XAI),
    ("groq", LlmType::Groq),
];

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = PROVIDER_NAMES.iter()
            .find(|(_, t)| t == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown");
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
#[error("Unsupported LLM type: {0}")]
pub struct ParseLlmTypeError(String);

impl FromStr for LlmType {
    type Err = ParseLlmTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = match s.trim().to_lowercase().as_str() {
            "google" => "gemini".to_string(),
            other => other.to_string(),
        };
        PROVIDER_NAMES.iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, t)| *t)
            .ok_or_else(|| ParseLlmTypeError(s.to_string()))
    }
}

/// Connection settings for one client; unset fields fall back to adapter defaults.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub embedding_model: Option<String>,
    pub base_url: Option<String>,
}

pub fn parse_llm_type(type_str: &str) -> Result<LlmType, ParseLlmTypeError> {
    type_str.parse()
}

/// Treats an empty key as "not configured".
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
