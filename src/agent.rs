use crate::cli::Args;
use crate::config::AssistantSettings;
use crate::config::prompt;
use crate::error::{ AssistantError, BoxError };
use crate::history::{ initialize_history_store, HistoryStore };
use crate::llm::{ non_empty, parse_llm_type, LlmConfig };
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::llm::embedding::new_client as new_embedding_client;
use crate::models::chat::{ Chunk, Message };
use crate::models::state::{ ConversationState, StateDelta };
use crate::rag::answer::RagEngine;
use crate::rag::summarize::Summarizer;
use crate::retrieval::QdrantRetriever;

use log::{ debug, error, info, warn };
use std::sync::Arc;

/// Log target for failed writes, so lost turns can be alerted on separately.
pub const DURABILITY_TARGET: &str = "rag_assistant::durability";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Hydrate,
    Ingest,
    Answer,
    Summarize,
    Persist,
}

/// Stages of one turn, in execution order.
pub const PIPELINE: [Stage; 5] = [
    Stage::Hydrate,
    Stage::Ingest,
    Stage::Answer,
    Stage::Summarize,
    Stage::Persist,
];

#[derive(Debug, Clone, PartialEq)]
pub struct AskResponse {
    pub answer: String,
    pub context: Vec<Chunk>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub state: ConversationState,
    pub answer: String,
    pub context: Vec<Chunk>,
}

/// Runs question/answer turns against one history store, retriever and model.
/// Holds no per-conversation state, so one instance serves many threads at once.
#[derive(Clone)]
pub struct ConversationAgent {
    history_store: Arc<dyn HistoryStore>,
    rag_tool: RagEngine,
    summarizer: Summarizer,
}

impl ConversationAgent {
    fn initialize_llm_clients(
        args: &Args
    ) -> Result<(Arc<dyn ChatClient>, Arc<dyn ChatClient>, LlmConfig), BoxError> {
        let chat_config = LlmConfig {
            llm_type: parse_llm_type(&args.chat_llm_type)?,
            base_url: args.chat_base_url.clone(),
            api_key: non_empty(&args.chat_api_key),
            completion_model: args.chat_model.clone(),
            embedding_model: None,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={:?}",
            chat_config.llm_type,
            chat_client.get_model(),
            chat_config.base_url.as_deref().unwrap_or("adapter default")
        );

        let summary_type_str = match &args.summary_llm_type {
            Some(s) if !s.trim().is_empty() => s.as_str(),
            _ => &args.chat_llm_type,
        };
        let summary_config = LlmConfig {
            llm_type: parse_llm_type(summary_type_str)?,
            base_url: args.summary_base_url.clone().or_else(|| args.chat_base_url.clone()),
            api_key: args.summary_api_key
                .as_deref()
                .and_then(non_empty)
                .or_else(|| non_empty(&args.chat_api_key)),
            completion_model: args.summary_model.clone().or_else(|| args.chat_model.clone()),
            embedding_model: None,
        };
        let summary_client = new_chat_client(&summary_config)?;
        info!(
            "Summary client configured: Type={}, Model={}",
            summary_config.llm_type,
            summary_client.get_model()
        );

        let embedding_config = LlmConfig {
            llm_type: parse_llm_type(&args.embedding_llm_type)?,
            base_url: args.embedding_base_url.clone(),
            api_key: non_empty(&args.embedding_api_key),
            embedding_model: args.embedding_model.clone(),
            completion_model: None,
        };
        info!(
            "Embedding client configured: Type={}, Model={:?}, BaseURL={:?}",
            embedding_config.llm_type,
            embedding_config.embedding_model.as_deref().unwrap_or("adapter default"),
            embedding_config.base_url.as_deref().unwrap_or("adapter default")
        );

        Ok((chat_client, summary_client, embedding_config))
    }

    pub async fn new(args: Args) -> Result<Self, BoxError> {
        let settings = AssistantSettings::try_from(&args)?;
        let (chat_client, summary_client, embedding_config) = Self::initialize_llm_clients(&args)?;
        let embedding_client = new_embedding_client(&embedding_config)?;
        let retriever = Arc::new(QdrantRetriever::new(&args, embedding_client)?);
        let prompt_config = prompt::load_or_default(args.prompts_path.as_deref())
            .map_err(AssistantError::from)?;
        let history_store = initialize_history_store(&args, &settings)?;

        let rag_tool = RagEngine::new(retriever, chat_client, Arc::clone(&prompt_config), &settings);
        let summarizer = Summarizer::new(summary_client, prompt_config, &settings);

        Ok(Self::from_parts(history_store, rag_tool, summarizer))
    }

    pub fn from_parts(
        history_store: Arc<dyn HistoryStore>,
        rag_tool: RagEngine,
        summarizer: Summarizer
    ) -> Self {
        Self { history_store, rag_tool, summarizer }
    }

    /// Answers `question` within the conversation `thread_id` (the default thread
    /// when absent) and stores the updated history.
    pub async fn ask(
        &self,
        thread_id: Option<&str>,
        question: &str
    ) -> Result<AskResponse, AssistantError> {
        let outcome = self.run(ConversationState::new(thread_id), question).await?;
        Ok(AskResponse { answer: outcome.answer, context: outcome.context })
    }

    /// Runs one turn starting from `state`. A stored history for the thread
    /// replaces whatever messages `state` carries.
    pub async fn run(
        &self,
        state: ConversationState,
        question: &str
    ) -> Result<TurnOutcome, AssistantError> {
        if question.trim().is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }

        let mut state = ConversationState {
            input: question.to_string(),
            answer: String::new(),
            context: Vec::new(),
            ..state
        };
        for stage in PIPELINE {
            debug!("Thread '{}': {:?}", state.thread_id, stage);
            let delta = self.run_stage(stage, &state).await?;
            state = state.merge(delta);
        }

        let answer = std::mem::take(&mut state.answer);
        let context = std::mem::take(&mut state.context);
        state.input.clear();
        Ok(TurnOutcome { state, answer, context })
    }

    async fn run_stage(
        &self,
        stage: Stage,
        state: &ConversationState
    ) -> Result<StateDelta, AssistantError> {
        match stage {
            Stage::Hydrate => Ok(self.hydrate(state).await),
            Stage::Ingest => Ok(Self::ingest(state)),
            Stage::Answer => self.answer(state).await,
            Stage::Summarize => Ok(self.summarize(state).await),
            Stage::Persist => Ok(self.persist(state).await),
        }
    }

    async fn hydrate(&self, state: &ConversationState) -> StateDelta {
        match self.history_store.load(&state.thread_id).await {
            Ok(messages) if !messages.is_empty() => {
                info!("Restored {} message(s) for thread '{}'", messages.len(), state.thread_id);
                StateDelta { replace_messages: Some(messages), ..StateDelta::none() }
            }
            Ok(_) => {
                debug!("No stored history for thread '{}'", state.thread_id);
                StateDelta::none()
            }
            Err(e) => {
                warn!(
                    "History load failed for thread '{}', continuing without stored history: {}",
                    state.thread_id,
                    e
                );
                StateDelta::none()
            }
        }
    }

    fn ingest(state: &ConversationState) -> StateDelta {
        StateDelta {
            append_messages: vec![Message::human(state.input.clone())],
            ..StateDelta::none()
        }
    }

    async fn answer(&self, state: &ConversationState) -> Result<StateDelta, AssistantError> {
        let (question, history) = state
            .latest_question()
            .unwrap_or((state.input.as_str(), &state.messages[..]));

        let output = self.rag_tool.answer(question, history).await.map_err(|e| {
            error!("Answering failed for thread '{}': {}", state.thread_id, e);
            e
        })?;

        Ok(StateDelta {
            append_messages: vec![Message::assistant(output.answer.clone()).with_metadata(output.metadata)],
            answer: Some(output.answer),
            context: Some(output.context),
            ..StateDelta::none()
        })
    }

    async fn summarize(&self, state: &ConversationState) -> StateDelta {
        let compacted = self.summarizer.maybe_summarize(&state.messages).await;
        if compacted == state.messages {
            return StateDelta::none();
        }
        info!(
            "Compressed thread '{}' from {} to {} message(s)",
            state.thread_id,
            state.messages.len(),
            compacted.len()
        );
        StateDelta { replace_messages: Some(compacted), ..StateDelta::none() }
    }

    async fn persist(&self, state: &ConversationState) -> StateDelta {
        if let Err(e) = self.history_store.save(&state.thread_id, &state.messages).await {
            error!(
                target: DURABILITY_TARGET,
                "Could not persist {} message(s) for thread '{}'; this turn will be missing from stored history: {}",
                state.messages.len(),
                state.thread_id,
                e
            );
        }
        StateDelta::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_runs_stages_in_order() {
        assert_eq!(
            PIPELINE,
            [Stage::Hydrate, Stage::Ingest, Stage::Answer, Stage::Summarize, Stage::Persist]
        );
    }

    #[test]
    fn ingest_appends_the_question() {
        let mut state = ConversationState::new(Some("t1")).with_messages(vec![Message::assistant("earlier")]);
        state.input = "What now?".to_string();
        let delta = ConversationAgent::ingest(&state);
        assert_eq!(delta.append_messages, vec![Message::human("What now?")]);
        assert!(delta.replace_messages.is_none());
    }
}
