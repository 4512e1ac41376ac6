use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a whole question/answer turn. Store and summarization problems are
/// absorbed inside the pipeline and never surface here.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("retrieval failed: {0}")]
    Retrieval(#[source] BoxError),

    #[error("answer generation failed: {0}")]
    Generation(#[source] BoxError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<crate::config::prompt::PromptError> for AssistantError {
    fn from(err: crate::config::prompt::PromptError) -> Self {
        AssistantError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::PromptError;

    #[test]
    fn prompt_errors_become_configuration_errors() {
        let err = AssistantError::from(PromptError::MissingPlaceholder("context".to_string()));
        assert!(matches!(err, AssistantError::Config(_)));
        assert!(err.to_string().contains("'context'"));
    }
}
