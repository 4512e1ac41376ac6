mod qdrant;

pub use self::qdrant::QdrantRetriever;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::models::chat::Chunk;

/// Similarity search over the document index.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Best matches first. Returns fewer than `k` chunks when the index holds fewer
    /// matches; an empty result is not an error.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Chunk>, BoxError>;
}
