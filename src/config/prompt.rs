use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;

const DEFAULT_ANSWER_SYSTEM: &str =
    "You are an assistant for question-answering tasks. \
Use only the pieces of retrieved context below to answer the question. \
If the context does not contain the answer, say that you do not have enough information to answer. \
Do not use outside knowledge. Always answer in {language}.\n\n\
Context:\n{context}";

const DEFAULT_ANSWER_USER: &str = "{history}Question: {question}";

const DEFAULT_SUMMARY_SYSTEM: &str =
    "You compress conversations. Summarize the conversation below into one short paragraph that keeps \
every fact, decision, name and open question a later turn might need. Reply with the summary only.";

const DEFAULT_SUMMARY_USER: &str = "Conversation:\n{transcript}";

#[derive(Debug)]
pub enum PromptError {
    MissingPlaceholder(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::MissingPlaceholder(key) =>
                write!(f, "Prompt template is missing placeholder '{}'", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// Templates for the answering and summarization calls. A prompts file only needs
/// to name the templates it overrides.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    pub answer_system: String,
    pub answer_user: String,
    pub summary_system: String,
    pub summary_user: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            answer_system: DEFAULT_ANSWER_SYSTEM.to_string(),
            answer_user: DEFAULT_ANSWER_USER.to_string(),
            summary_system: DEFAULT_SUMMARY_SYSTEM.to_string(),
            summary_user: DEFAULT_SUMMARY_USER.to_string(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        let required = [
            (&self.answer_system, "answer_system:{context}", "{context}"),
            (&self.answer_user, "answer_user:{question}", "{question}"),
            (&self.summary_user, "summary_user:{transcript}", "{transcript}"),
        ];
        for (template, label, placeholder) in required {
            if !template.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder(label.to_string()));
            }
        }
        Ok(())
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    info!("Loaded prompt templates from {}", path.as_ref().display());
    Ok(Arc::new(config))
}

/// Loads the prompts file when one is configured, otherwise the built-in templates.
pub fn load_or_default(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) if !p.trim().is_empty() => load_prompts(p),
        _ => Ok(Arc::new(PromptConfig::default())),
    }
}

/// Single-pass placeholder substitution, so values that happen to contain
/// `{placeholder}` text are never expanded a second time.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'outer: while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        for (key, value) in values {
            let token_len = key.len() + 2;
            if
                tail.len() >= token_len &&
                tail[1..].starts_with(key) &&
                tail[1 + key.len()..].starts_with('}')
            {
                out.push_str(value);
                rest = &tail[token_len..];
                continue 'outer;
            }
        }
        out.push('{');
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

pub fn get_answer_system_prompt(config: &PromptConfig, language: &str, context: &str) -> String {
    render(&config.answer_system, &[("language", language), ("context", context)])
}

pub fn get_answer_user_prompt(config: &PromptConfig, history: &str, question: &str) -> String {
    render(&config.answer_user, &[("history", history), ("question", question)])
}

pub fn get_summary_user_prompt(config: &PromptConfig, transcript: &str) -> String {
    render(&config.summary_user, &[("transcript", transcript)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_does_not_expand_inserted_values() {
        let out = render("{history}Q: {question}", &[("history", "{question}\n"), ("question", "why?")]);
        assert_eq!(out, "{question}\nQ: why?");
    }

    #[test]
    fn render_keeps_unknown_braces() {
        assert_eq!(render("a {b} {c", &[("x", "y")]), "a {b} {c");
    }

    #[test]
    fn answer_system_prompt_mentions_language_and_context() {
        let prompt = get_answer_system_prompt(&PromptConfig::default(), "Thai", "[a.md] hello");
        assert!(prompt.contains("Always answer in Thai."));
        assert!(prompt.ends_with("Context:\n[a.md] hello"));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config: PromptConfig = serde_json::from_str(r#"{"answer_user":"Ask: {question}"}"#).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.answer_user, "Ask: {question}");
        assert_eq!(config.summary_system, DEFAULT_SUMMARY_SYSTEM);
    }

    #[test]
    fn override_without_placeholder_is_rejected() {
        let config: PromptConfig = serde_json::from_str(r#"{"summary_user":"nothing"}"#).unwrap();
        assert!(matches!(config.validate(), Err(PromptError::MissingPlaceholder(_))));
    }
}
