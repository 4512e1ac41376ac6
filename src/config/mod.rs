pub mod prompt;

use crate::cli::Args;
use crate::error::AssistantError;

pub const SUMMARY_PREFIX: &str = "[Conversation summary] ";

/// Behavioural knobs of one assistant instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSettings {
    /// Number of chunks requested from the retrieval service.
    pub top_k: usize,
    /// Language every answer is written in.
    pub answer_language: String,
    /// Upper bound on the concatenated context block, in bytes.
    pub max_context_bytes: usize,
    /// Serialized-history size above which older turns are summarized. Zero or
    /// negative disables summarization.
    pub summary_max_bytes: i64,
    pub summary_keep_last: usize,
    pub summary_prefix: String,
    pub history_key_prefix: String,
    /// Expiry of stored histories in seconds. Zero keeps them forever.
    pub history_ttl_secs: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            answer_language: "English".to_string(),
            max_context_bytes: 12_000,
            summary_max_bytes: 0,
            summary_keep_last: 6,
            summary_prefix: SUMMARY_PREFIX.to_string(),
            history_key_prefix: "rag:history:".to_string(),
            history_ttl_secs: 0,
        }
    }
}

impl AssistantSettings {
    pub fn summarization_enabled(&self) -> bool {
        self.summary_max_bytes > 0
    }
}

impl TryFrom<&Args> for AssistantSettings {
    type Error = AssistantError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        if args.rag_top_k == 0 {
            return Err(AssistantError::Config("RAG_TOP_K must be greater than 0".to_string()));
        }
        Ok(Self {
            top_k: args.rag_top_k,
            answer_language: args.answer_language.clone(),
            max_context_bytes: args.max_context_bytes,
            summary_max_bytes: args.summary_max_bytes,
            summary_keep_last: args.summary_keep_last,
            summary_prefix: SUMMARY_PREFIX.to_string(),
            history_key_prefix: args.history_redis_prefix.clone(),
            history_ttl_secs: args.history_ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_disable_summarization() {
        assert!(!AssistantSettings::default().summarization_enabled());
    }

    #[test]
    fn settings_follow_command_line() {
        let args = Args::parse_from([
            "rag-assistant",
            "--rag-top-k",
            "3",
            "--summary-max-bytes",
            "2048",
            "--summary-keep-last",
            "2",
            "--history-ttl-secs",
            "60",
            "what",
            "now?",
        ]);
        let settings = AssistantSettings::try_from(&args).unwrap();
        assert_eq!(settings.top_k, 3);
        assert!(settings.summarization_enabled());
        assert_eq!(settings.summary_keep_last, 2);
        assert_eq!(settings.history_ttl_secs, 60);
        assert_eq!(args.question_text(), "what now?");
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let args = Args::parse_from(["rag-assistant", "--rag-top-k", "0", "hello"]);
        let err = AssistantSettings::try_from(&args).unwrap_err();
        assert!(matches!(err, AssistantError::Config(_)));
        assert_eq!(err.to_string(), "configuration error: RAG_TOP_K must be greater than 0");
    }
}
