/// Vector retrieval adapter.
///
/// Distances from the backend become similarities `1 / (1 + d)`; a zero distance
/// (identical vector) maps to 1.0.

use async_trait::async_trait;
use std::sync::Arc;

use super::{RetrievalAdapter, VectorBackend, VectorMatch};
use crate::document::{Document, Modality, RetrievalHit};
use crate::errors::SearchError;
use crate::search::normalize::{distance_to_similarity, ScoreNormalizer};

pub struct VectorAdapter {
    backend: Arc<dyn VectorBackend>,
    normalizer: ScoreNormalizer,
}

impl VectorAdapter {
    pub fn new(backend: Arc<dyn VectorBackend>, normalizer: ScoreNormalizer) -> Self {
        VectorAdapter { backend, normalizer }
    }

    fn to_hit(&self, position: usize, m: VectorMatch) -> RetrievalHit {
        let raw_score = distance_to_similarity(m.distance);
        RetrievalHit {
            document: Document {
                id: m.id.clone(),
                title: m.metadata.title,
                content: m.document,
                author: m.metadata.author,
                url: m.metadata.url,
                timestamp: m.metadata.timestamp,
            },
            document_id: m.id,
            raw_score,
            score: self.normalizer.normalize(Modality::Vector, raw_score),
            source_rank: position + 1,
            modality: Modality::Vector,
        }
    }
}

#[async_trait]
impl RetrievalAdapter for VectorAdapter {
    fn modality(&self) -> Modality {
        Modality::Vector
    }

    async fn try_retrieve(&self, query: &str, n: usize) -> Result<Vec<RetrievalHit>, SearchError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let matches = self.backend.query(query, n).await?;
        tracing::debug!(requested = n, returned = matches.len(), "Vector backend answered");
        Ok(matches
            .into_iter()
            .take(n)
            .enumerate()
            .map(|(i, m)| self.to_hit(i, m))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::StoredMetadata;

    struct StaticBackend(Vec<(&'static str, f64)>);

    #[async_trait]
    impl VectorBackend for StaticBackend {
        async fn query(&self, _query: &str, count: usize) -> Result<Vec<VectorMatch>, SearchError> {
            Ok(self
                .0
                .iter()
                .take(count)
                .map(|(id, distance)| VectorMatch {
                    id: id.to_string(),
                    document: format!("content of {}", id),
                    metadata: StoredMetadata::default(),
                    distance: *distance,
                })
                .collect())
        }

        fn len(&self) -> usize {
            self.0.len()
        }

        fn model_name(&self) -> &str {
            "static"
        }
    }

    struct DownBackend;

    #[async_trait]
    impl VectorBackend for DownBackend {
        async fn query(&self, _query: &str, _count: usize) -> Result<Vec<VectorMatch>, SearchError> {
            Err(SearchError::backend(Modality::Vector, "connection refused"))
        }

        fn len(&self) -> usize {
            0
        }

        fn model_name(&self) -> &str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_maps_distance_and_rank() {
        let adapter = VectorAdapter::new(
            Arc::new(StaticBackend(vec![("a", 0.0), ("b", 1.0), ("c", 3.0)])),
            ScoreNormalizer::default(),
        );
        let hits = adapter.try_retrieve("q", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "a");
        assert_eq!(hits[0].raw_score, 1.0);
        assert_eq!(hits[0].source_rank, 1);
        assert_eq!(hits[1].raw_score, 0.5);
        assert_eq!(hits[1].score, 0.5);
        assert_eq!(hits[1].source_rank, 2);
        assert_eq!(hits[1].modality, Modality::Vector);
        assert_eq!(hits[1].document.content, "content of b");
        assert_eq!(hits[1].document.title, "Untitled");
        assert_eq!(hits[1].document.author, "Unknown author");
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_empty() {
        let adapter = VectorAdapter::new(Arc::new(DownBackend), ScoreNormalizer::default());
        assert!(adapter.try_retrieve("q", 5).await.is_err());
        assert!(adapter.retrieve("q", 5).await.is_empty());
    }
}
