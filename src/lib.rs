pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod rag;
pub mod retrieval;

use agent::ConversationAgent;
use cli::Args;
use error::BoxError;
use history::redact_url;
use log::info;

pub async fn run(args: Args) -> Result<(), BoxError> {
    info!("--- Core Configuration ---");
    info!("History Store Type: {}", args.history_type);
    info!("History Store Host: {}", redact_url(&args.history_host));
    info!("History Key Prefix: {}", args.history_redis_prefix);
    info!("History TTL (secs): {}", args.history_ttl_secs);
    info!("Vector Store Host: {}", args.host);
    info!("Vector Collection: {}", args.indexes);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Embedding LLM Type: {}", args.embedding_llm_type);
    info!("Top K: {}", args.rag_top_k);
    info!("Answer Language: {}", args.answer_language);
    info!("Summary Max Bytes: {}", args.summary_max_bytes);
    if args.summary_max_bytes > 0 {
        info!("Summary Keep Last: {}", args.summary_keep_last);
    }
    info!("-------------------------");

    let question = args.question_text();
    let thread_id = args.thread_id.clone();
    let agent = ConversationAgent::new(args).await?;
    let response = agent.ask(thread_id.as_deref(), &question).await?;

    println!("{}", response.answer.trim());
    if !response.context.is_empty() {
        println!();
        println!("Sources:");
        for chunk in &response.context {
            println!("  - {}", chunk.source_id);
        }
    }

    Ok(())
}
