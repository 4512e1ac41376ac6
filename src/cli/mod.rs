use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- History Store Args ---
    /// History chat store type (redis, memory)
    #[arg(long, env = "HISTORY_TYPE", default_value = "redis")]
    pub history_type: String,

    /// History chat store host endpoint, credentials may be embedded (e.g., redis://:secret@127.0.0.1:6379)
    #[arg(long, env = "HISTORY_HOST", default_value = "redis://127.0.0.1:6379")]
    pub history_host: String,

    /// Prefix for history keys. The thread id is appended to it.
    #[arg(long, env = "HISTORY_REDIS_PREFIX", default_value = "rag:history:")]
    pub history_redis_prefix: String,

    /// Time-to-live in seconds for stored histories. 0 means no expiry.
    #[arg(long, env = "HISTORY_TTL_SECS", default_value = "0")]
    pub history_ttl_secs: u64,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (ollama, openai, anthropic, gemini, deepseek, xai, groq)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "ollama")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (e.g., OpenAI, Anthropic)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gpt-4o, llama3)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    // --- Summary LLM Provider Args (Optional) ---
    /// Type of LLM provider for history summarization. Defaults to CHAT_LLM_TYPE if not set.
    #[arg(long, env = "SUMMARY_LLM_TYPE")]
    pub summary_llm_type: Option<String>,

    /// Base URL for the summarization provider. Defaults to CHAT_BASE_URL if not set.
    #[arg(long, env = "SUMMARY_BASE_URL")]
    pub summary_base_url: Option<String>,

    /// API Key for the summarization provider. Defaults to CHAT_API_KEY if not set.
    #[arg(long, env = "SUMMARY_API_KEY")]
    pub summary_api_key: Option<String>,

    /// Model name for summarization. Defaults to CHAT_MODEL if not set.
    #[arg(long, env = "SUMMARY_MODEL")]
    pub summary_model: Option<String>,

    // --- Embedding LLM Provider Args ---
    /// Type of LLM provider for text embedding (ollama, openai)
    #[arg(long, env = "EMBEDDING_LLM_TYPE", default_value = "ollama")]
    pub embedding_llm_type: String,

    /// Base URL for the Embedding LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "EMBEDDING_BASE_URL")]
    pub embedding_base_url: Option<String>,

    /// API Key for the Embedding LLM provider
    #[arg(long, env = "EMBEDDING_API_KEY", default_value = "")]
    pub embedding_api_key: String,

    /// Model name for text embedding (e.g., text-embedding-3-small, nomic-embed-text)
    #[arg(long, env = "EMBEDDING_MODEL")]
    pub embedding_model: Option<String>,

    // --- Vector Store Args ---
    /// Qdrant endpoint holding the document chunks (gRPC port)
    #[arg(long, env = "VECTOR_HOST", default_value = "http://localhost:6334")]
    pub host: String,

    /// API key for Qdrant
    #[arg(short = 'k', long, env = "VECTOR_SECRET", default_value = "")]
    pub secret: String,

    /// Collection holding the document chunks
    #[arg(long, env = "VECTOR_INDEX_NAME", default_value = "documents")]
    pub indexes: String,

    /// Payload field carrying the chunk text
    #[arg(long, env = "VECTOR_TEXT_FIELD", default_value = "text")]
    pub vector_text_field: String,

    /// Payload field carrying the chunk source identifier
    #[arg(long, env = "VECTOR_SOURCE_FIELD", default_value = "source")]
    pub vector_source_field: String,

    // --- Answering Args ---
    /// Number of chunks to retrieve for each question.
    #[arg(long, env = "RAG_TOP_K", default_value = "4")]
    pub rag_top_k: usize,

    /// Language the assistant answers in.
    #[arg(long, env = "ANSWER_LANGUAGE", default_value = "English")]
    pub answer_language: String,

    /// Upper bound in bytes for the retrieved context placed in the prompt.
    #[arg(long, env = "MAX_CONTEXT_BYTES", default_value = "12000")]
    pub max_context_bytes: usize,

    /// Path to a JSON file overriding the built-in prompt templates.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- Summarization Args ---
    /// Serialized history size in bytes above which older turns are summarized. 0 or less disables it.
    #[arg(long, env = "SUMMARY_MAX_BYTES", default_value = "0", allow_negative_numbers = true)]
    pub summary_max_bytes: i64,

    /// Number of most recent non-system messages kept verbatim when summarizing.
    #[arg(long, env = "SUMMARY_KEEP_LAST", default_value = "6")]
    pub summary_keep_last: usize,

    // --- Conversation Args ---
    /// Conversation thread identifier. Turns sharing it share history.
    #[arg(long, env = "THREAD_ID")]
    pub thread_id: Option<String>,

    /// The question to ask.
    #[arg(trailing_var_arg = true)]
    pub question: Vec<String>,
}

impl Args {
    pub fn question_text(&self) -> String {
        self.question.join(" ")
    }
}
