/// Retrieval adapters and the backend contracts they wrap.
///
/// Each adapter turns one external backend's raw answer into an ordered list of
/// `RetrievalHit`s with 1-based `source_rank`s. Backend failures stop at the
/// adapter boundary: `retrieve()` logs them and yields an empty list, so a
/// search always reaches fusion.

pub mod keyword;
pub mod vector;

pub use keyword::KeywordAdapter;
pub use vector::VectorAdapter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{default_author, default_title, Document, Modality, RetrievalHit};
use crate::errors::SearchError;

/// Display metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMetadata {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Default for StoredMetadata {
    fn default() -> Self {
        StoredMetadata {
            title: default_title(),
            author: default_author(),
            url: String::new(),
            timestamp: String::new(),
        }
    }
}

/// One nearest-neighbour answer from the vector backend. Smaller distance = more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    pub document: String,
    pub metadata: StoredMetadata,
    pub distance: f64,
}

/// Dense-vector index: (query, count) -> matches ordered by ascending distance.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    async fn query(&self, query: &str, count: usize) -> Result<Vec<VectorMatch>, SearchError>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Sparse lexical index: tokens -> one score per document position.
///
/// Scores are aligned with the document order fixed at index-build time;
/// `document(i)` maps a position back to its display record.
pub trait KeywordBackend: Send + Sync {
    fn get_scores(&self, tokens: &[String]) -> Result<Vec<f64>, SearchError>;

    fn document(&self, position: usize) -> Option<&Document>;

    fn len(&self) -> usize;
}

/// Uniform contract of both adapters.
#[async_trait]
pub trait RetrievalAdapter: Send + Sync {
    fn modality(&self) -> Modality;

    /// Fetch up to `n` candidates, surfacing backend errors.
    async fn try_retrieve(&self, query: &str, n: usize) -> Result<Vec<RetrievalHit>, SearchError>;

    /// Fetch up to `n` candidates; any failure degrades to zero candidates.
    async fn retrieve(&self, query: &str, n: usize) -> Vec<RetrievalHit> {
        match self.try_retrieve(query, n).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(
                    modality = %self.modality(),
                    error = %e,
                    "Retrieval failed, continuing with zero candidates from this modality"
                );
                Vec::new()
            }
        }
    }
}
