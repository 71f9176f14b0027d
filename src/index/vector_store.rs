/// In-memory dense vector store.
///
/// Holds the stored document embeddings and answers nearest-neighbour queries by
/// exhaustive squared-L2 distance against the embedded query. Loaded once at
/// startup and never mutated afterwards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::errors::SearchError;
use crate::retrieval::{StoredMetadata, VectorBackend, VectorMatch};

/// One stored vector with the text and metadata it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    /// Text that was embedded (typically title + content)
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub metadata: StoredMetadata,
    pub embedding: Vec<f32>,
}

/// On-disk layout of the vector store (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreFile {
    /// Embedding model the store was built with, if recorded
    #[serde(default)]
    pub model: Option<String>,
    pub dimension: usize,
    pub records: Vec<VectorRecord>,
}

impl VectorStoreFile {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.dimension == 0 {
            return Err(SearchError::Config("Vector store dimension must be greater than 0".into()));
        }
        if self.records.is_empty() {
            return Err(SearchError::Config("Vector store contains no records".into()));
        }
        if let Some(bad) = self.records.iter().find(|r| r.embedding.len() != self.dimension) {
            return Err(SearchError::Config(format!(
                "Vector record '{}' has {} dimensions, store declares {}",
                bad.id,
                bad.embedding.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum()
}

pub struct InMemoryVectorStore {
    provider: Arc<dyn EmbeddingProvider>,
    records: Vec<VectorRecord>,
}

impl InMemoryVectorStore {
    /// Build a store from an already-parsed file, checking it against the provider.
    pub fn new(file: VectorStoreFile, provider: Arc<dyn EmbeddingProvider>) -> Result<Self, SearchError> {
        file.validate()?;
        if file.dimension != provider.dimension() {
            return Err(SearchError::Config(format!(
                "Vector store dimension {} does not match embedding model '{}' ({} dimensions)",
                file.dimension,
                provider.model_name(),
                provider.dimension()
            )));
        }
        if let Some(model) = file.model.as_deref() {
            if model != provider.model_name() {
                tracing::warn!(
                    store_model = %model,
                    provider_model = %provider.model_name(),
                    "Vector store was built with a different embedding model"
                );
            }
        }
        Ok(InMemoryVectorStore {
            provider,
            records: file.records,
        })
    }

    pub async fn load(path: impl AsRef<Path>, provider: Arc<dyn EmbeddingProvider>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            SearchError::Config(format!("Failed to read vector store {}: {}", path.display(), e))
        })?;
        let file: VectorStoreFile = serde_json::from_str(&raw).map_err(|e| {
            SearchError::Config(format!("Malformed vector store {}: {}", path.display(), e))
        })?;
        Self::new(file, provider)
    }
}

#[async_trait]
impl VectorBackend for InMemoryVectorStore {
    async fn query(&self, query: &str, count: usize) -> Result<Vec<VectorMatch>, SearchError> {
        let embedding = self.provider.embed(query).await?;
        if embedding.len() != self.provider.dimension() {
            return Err(SearchError::backend(
                crate::document::Modality::Vector,
                format!("Query embedding has {} dimensions, expected {}", embedding.len(), self.provider.dimension()),
            ));
        }

        let mut scored: Vec<(f64, &VectorRecord)> = self
            .records
            .iter()
            .map(|r| (squared_l2(&embedding, &r.embedding), r))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        scored.truncate(count);

        Ok(scored
            .into_iter()
            .map(|(distance, r)| VectorMatch {
                id: r.id.clone(),
                document: r.document.clone(),
                metadata: r.metadata.clone(),
                distance,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn model_name(&self) -> &str {
        self.provider.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::ngram::NgramEmbeddingProvider;

    fn provider() -> Arc<NgramEmbeddingProvider> {
        Arc::new(NgramEmbeddingProvider::new(64).unwrap())
    }

    fn record(p: &NgramEmbeddingProvider, id: &str, text: &str) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            document: text.to_string(),
            metadata: StoredMetadata::default(),
            embedding: p.vectorize(text),
        }
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        let narrow = NgramEmbeddingProvider::new(32).unwrap();
        let file = VectorStoreFile { model: None, dimension: 32, records: vec![record(&narrow, "1", "图书馆")] };
        assert!(file.validate().is_ok());
        let result = InMemoryVectorStore::new(file, provider());
        assert!(matches!(result, Err(SearchError::Config(ref m)) if m.contains("does not match")));
    }

    #[test]
    fn test_rejects_empty_store() {
        let file = VectorStoreFile { model: None, dimension: 64, records: vec![] };
        assert!(matches!(file.validate(), Err(SearchError::Config(ref m)) if m.contains("no records")));
        assert!(InMemoryVectorStore::new(file, provider()).is_err());
    }

    #[test]
    fn test_rejects_ragged_records() {
        let p = provider();
        let mut r = record(&p, "1", "图书馆");
        r.embedding.pop();
        let file = VectorStoreFile { model: None, dimension: 64, records: vec![r] };
        assert!(file.validate().is_err());
    }

    #[tokio::test]
    async fn test_query_orders_by_distance() {
        let p = provider();
        let file = VectorStoreFile {
            model: Some("ngram-64".into()),
            dimension: 64,
            records: vec![
                record(&p, "far", "食堂饭菜价格"),
                record(&p, "exact", "图书馆开放时间"),
                record(&p, "near", "图书馆周末开放时间"),
            ],
        };
        let store = InMemoryVectorStore::new(file, p).unwrap();
        let matches = store.query("图书馆开放时间", 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "exact");
        assert!(matches[0].distance < 1e-9);
        assert_eq!(matches[1].id, "near");
        assert!(matches[0].distance <= matches[1].distance);
    }

    #[tokio::test]
    async fn test_query_returns_fewer_when_store_small() {
        let p = provider();
        let file = VectorStoreFile { model: None, dimension: 64, records: vec![record(&p, "1", "选课")] };
        let store = InMemoryVectorStore::new(file, p).unwrap();
        assert_eq!(store.query("选课", 10).await.unwrap().len(), 1);
        assert_eq!(store.len(), 1);
    }
}
