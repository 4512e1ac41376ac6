use async_trait::async_trait;
use log::{ debug, info, warn };
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    point_id::PointIdOptions,
    value::Kind,
    PointId,
    ScoredPoint,
    SearchPointsBuilder,
    Value as QdrantValue,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cli::Args;
use crate::error::BoxError;
use crate::llm::embedding::EmbeddingClient;
use crate::llm::non_empty;
use crate::models::chat::Chunk;
use super::Retriever;

/// Retrieval over an existing Qdrant collection. The query is embedded with the
/// same model used at ingestion time and matched against the stored vectors.
pub struct QdrantRetriever {
    client: Qdrant,
    collection_name: String,
    embedding_client: Arc<dyn EmbeddingClient>,
    text_field: String,
    source_field: String,
}

impl QdrantRetriever {
    pub fn new(
        args: &Args,
        embedding_client: Arc<dyn EmbeddingClient>
    ) -> Result<Self, BoxError> {
        let client = Qdrant::from_url(&args.host).api_key(non_empty(&args.secret)).build()?;
        info!("Retrieval collection '{}' at {}", args.indexes, args.host);

        Ok(Self {
            client,
            collection_name: args.indexes.clone(),
            embedding_client,
            text_field: args.vector_text_field.clone(),
            source_field: args.vector_source_field.clone(),
        })
    }
}

/// Looks up a payload field; dots descend into nested objects (`metadata.source`).
fn lookup<'a>(payload: &'a HashMap<String, QdrantValue>, path: &str) -> Option<&'a QdrantValue> {
    let mut parts = path.split('.');
    let mut current = payload.get(parts.next()?)?;
    for part in parts {
        match &current.kind {
            Some(Kind::StructValue(inner)) => {
                current = inner.fields.get(part)?;
            }
            _ => {
                return None;
            }
        }
    }
    Some(current)
}

fn value_to_string(value: &QdrantValue) -> Option<String> {
    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        Some(Kind::IntegerValue(i)) => Some(i.to_string()),
        Some(Kind::DoubleValue(d)) => Some(d.to_string()),
        _ => None,
    }
}

fn point_id_to_string(id: &Option<PointId>) -> String {
    match id.as_ref().and_then(|p| p.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => "unknown".to_string(),
    }
}

fn point_to_chunk(point: &ScoredPoint, text_field: &str, source_field: &str) -> Option<Chunk> {
    let text = lookup(&point.payload, text_field).and_then(value_to_string)?;
    let source_id = lookup(&point.payload, source_field)
        .and_then(value_to_string)
        .unwrap_or_else(|| point_id_to_string(&point.id));
    Some(Chunk { text, source_id })
}

#[async_trait]
impl Retriever for QdrantRetriever {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Chunk>, BoxError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedding_client.embed(query).await?.embedding;
        let response = self.client.search_points(
            SearchPointsBuilder::new(&self.collection_name, embedding, k as u64).with_payload(true)
        ).await?;

        let mut chunks = Vec::with_capacity(response.result.len());
        for point in &response.result {
            match point_to_chunk(point, &self.text_field, &self.source_field) {
                Some(chunk) => chunks.push(chunk),
                None =>
                    warn!(
                        "Skipping point {} without a '{}' payload field",
                        point_id_to_string(&point.id),
                        self.text_field
                    ),
            }
        }
        debug!("Retrieved {} of {} requested chunks", chunks.len(), k);
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::Struct;

    fn string_value(s: &str) -> QdrantValue {
        QdrantValue { kind: Some(Kind::StringValue(s.to_string())) }
    }

    fn point(payload: HashMap<String, QdrantValue>, id: u64) -> ScoredPoint {
        ScoredPoint {
            id: Some(PointId { point_id_options: Some(PointIdOptions::Num(id)) }),
            payload,
            score: 0.9,
            ..Default::default()
        }
    }

    #[test]
    fn maps_flat_payload() {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), string_value("Refunds within 30 days."));
        payload.insert("source".to_string(), string_value("policy.md"));

        let chunk = point_to_chunk(&point(payload, 1), "text", "source").unwrap();
        assert_eq!(chunk, Chunk::new("Refunds within 30 days.", "policy.md"));
    }

    #[test]
    fn follows_nested_source_path() {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), string_value("docs/faq.md"));
        let mut payload = HashMap::new();
        payload.insert("page_content".to_string(), string_value("Shipping is free."));
        payload.insert(
            "metadata".to_string(),
            QdrantValue { kind: Some(Kind::StructValue(Struct { fields: metadata })) }
        );

        let chunk = point_to_chunk(&point(payload, 2), "page_content", "metadata.source").unwrap();
        assert_eq!(chunk.source_id, "docs/faq.md");
    }

    #[test]
    fn missing_source_falls_back_to_point_id() {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), string_value("orphan"));
        let chunk = point_to_chunk(&point(payload, 42), "text", "source").unwrap();
        assert_eq!(chunk.source_id, "42");
    }

    #[test]
    fn point_without_text_is_skipped() {
        let mut payload = HashMap::new();
        payload.insert("source".to_string(), string_value("a.md"));
        assert!(point_to_chunk(&point(payload, 3), "text", "source").is_none());
    }
}
