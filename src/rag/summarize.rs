use crate::config::AssistantSettings;
use crate::config::prompt::{ self, PromptConfig };
use crate::error::BoxError;
use crate::history::sanitize::strip_reasoning;
use crate::history::{ estimate_size, format_transcript };
use crate::llm::chat::ChatClient;
use crate::models::chat::Message;

use log::{ debug, info, warn };
use std::sync::Arc;

/// Size-triggered history compression. System messages are always kept; among
/// the rest, the newest `keep_last` stay verbatim and everything older is folded
/// into one summary message.
#[derive(Clone)]
pub struct Summarizer {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
    enabled: bool,
    max_bytes: i64,
    keep_last: usize,
    prefix: String,
}

impl Summarizer {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        prompt_config: Arc<PromptConfig>,
        settings: &AssistantSettings
    ) -> Self {
        Self {
            chat_client,
            prompt_config,
            enabled: settings.summarization_enabled(),
            max_bytes: settings.summary_max_bytes,
            keep_last: settings.summary_keep_last,
            prefix: settings.summary_prefix.clone(),
        }
    }

    /// Returns the history to store. Any failure leaves the history untouched.
    pub async fn maybe_summarize(&self, messages: &[Message]) -> Vec<Message> {
        if !self.enabled {
            return messages.to_vec();
        }
        let size = estimate_size(messages);
        if (size as i64) <= self.max_bytes {
            debug!("History is {} bytes, within the {} byte budget", size, self.max_bytes);
            return messages.to_vec();
        }

        let (system_messages, rest): (Vec<Message>, Vec<Message>) = messages
            .iter()
            .cloned()
            .partition(Message::is_system);
        if rest.len() <= self.keep_last {
            debug!(
                "History is {} bytes but only {} non-system message(s); nothing older to compress",
                size,
                rest.len()
            );
            return messages.to_vec();
        }

        info!(
            "History is {} bytes (budget {}), summarizing {} older message(s)",
            size,
            self.max_bytes,
            rest.len() - self.keep_last
        );
        match self.summarize(&rest, self.keep_last, &self.prefix).await {
            Ok(Some(compacted)) => {
                let mut result = system_messages;
                result.extend(compacted);
                result
            }
            Ok(None) => {
                warn!("Summarization produced no usable output, keeping full history");
                messages.to_vec()
            }
            Err(e) => {
                warn!("Summarization failed, keeping full history: {}", e);
                messages.to_vec()
            }
        }
    }

    /// Generation side of summarization: replaces all but the newest `keep_last_n`
    /// messages with one summary message starting with `prefix`. `Ok(None)` when
    /// there is nothing older to fold or the model returned no text.
    pub async fn summarize(
        &self,
        messages: &[Message],
        keep_last_n: usize,
        prefix: &str
    ) -> Result<Option<Vec<Message>>, BoxError> {
        if messages.len() <= keep_last_n {
            return Ok(None);
        }
        let split = messages.len() - keep_last_n;
        let (older, recent) = messages.split_at(split);

        let transcript = format_transcript(older);
        let user_prompt = prompt::get_summary_user_prompt(&self.prompt_config, &transcript);
        let completion = self.chat_client
            .complete(&self.prompt_config.summary_system, &user_prompt).await?;

        let summary = strip_reasoning(&completion.response);
        let summary = summary.trim();
        if summary.is_empty() {
            return Ok(None);
        }

        let mut compacted = Vec::with_capacity(recent.len() + 1);
        compacted.push(Message::assistant(format!("{}{}", prefix, summary)));
        compacted.extend_from_slice(recent);
        Ok(Some(compacted))
    }
}
