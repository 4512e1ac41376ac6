use crate::config::AssistantSettings;
use crate::config::prompt::{ self, PromptConfig };
use crate::error::AssistantError;
use crate::history::format_history_for_prompt;
use crate::llm::chat::ChatClient;
use crate::models::chat::{ Chunk, Message, MessageMetadata };
use crate::retrieval::Retriever;

use log::{ debug, info };
use std::sync::Arc;

/// Prior turns shown to the model alongside the retrieved context.
const HISTORY_FOR_PROMPT_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutput {
    pub answer: String,
    pub metadata: MessageMetadata,
    pub context: Vec<Chunk>,
}

#[derive(Clone)]
pub struct RagEngine {
    retriever: Arc<dyn Retriever>,
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
    top_k: usize,
    answer_language: String,
    max_context_bytes: usize,
}

fn truncate_to_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

impl RagEngine {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        chat_client: Arc<dyn ChatClient>,
        prompt_config: Arc<PromptConfig>,
        settings: &AssistantSettings
    ) -> Self {
        Self {
            retriever,
            chat_client,
            prompt_config,
            top_k: settings.top_k,
            answer_language: settings.answer_language.clone(),
            max_context_bytes: settings.max_context_bytes,
        }
    }

    /// Joins chunks in rank order as `[source] text` blocks until `max_bytes` is
    /// reached. A first chunk larger than the bound is cut rather than dropped.
    pub fn format_documents_for_prompt(chunks: &[Chunk], max_bytes: usize) -> String {
        let mut docs_text = String::new();
        for chunk in chunks {
            let block = format!("[{}] {}", chunk.source_id, chunk.text.trim());
            let separator = if docs_text.is_empty() { "" } else { "\n\n" };
            if docs_text.len() + separator.len() + block.len() > max_bytes {
                if docs_text.is_empty() {
                    docs_text.push_str(truncate_to_boundary(&block, max_bytes));
                }
                break;
            }
            docs_text.push_str(separator);
            docs_text.push_str(&block);
        }
        docs_text
    }

    /// Retrieves context for `question` and asks the model for a grounded answer.
    /// `history` holds the turns before the question.
    pub async fn answer(
        &self,
        question: &str,
        history: &[Message]
    ) -> Result<AnswerOutput, AssistantError> {
        let context = self.retriever
            .search(question, self.top_k).await
            .map_err(AssistantError::Retrieval)?;
        info!("→ Retrieved {} chunk(s) for the question", context.len());

        let docs_text = Self::format_documents_for_prompt(&context, self.max_context_bytes);
        let system_prompt = prompt::get_answer_system_prompt(
            &self.prompt_config,
            &self.answer_language,
            &docs_text
        );
        let history_text = format_history_for_prompt(history, HISTORY_FOR_PROMPT_LEN);
        let user_prompt = prompt::get_answer_user_prompt(&self.prompt_config, &history_text, question);

        debug!("--- Answer Prompt ---\n{}\n{}\n---------------------", system_prompt, user_prompt);

        let completion = self.chat_client
            .complete(&system_prompt, &user_prompt).await
            .map_err(AssistantError::Generation)?;

        Ok(AnswerOutput {
            answer: completion.response,
            metadata: completion.metadata,
            context,
        })
    }
}
