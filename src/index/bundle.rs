/// Keyword index bundle loading.
///
/// The bundle is written by the offline index build and read once at startup.
/// Position `i` of `documents` and position `i` of `corpus_tokens` describe the
/// same post; BM25 scores come back in that same order.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::bm25::{Bm25Okapi, Bm25Params};
use crate::document::Document;
use crate::errors::SearchError;
use crate::retrieval::KeywordBackend;

/// On-disk layout of the keyword index bundle (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordIndexBundle {
    pub documents: Vec<Document>,
    pub corpus_tokens: Vec<Vec<String>>,
    #[serde(default)]
    pub bm25: Bm25Params,
}

impl KeywordIndexBundle {
    /// Read and validate a bundle. Any failure is a configuration error: the
    /// process must not start serving without its keyword index.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            SearchError::Config(format!("Failed to read keyword index bundle {}: {}", path.display(), e))
        })?;
        let bundle: KeywordIndexBundle = serde_json::from_str(&raw).map_err(|e| {
            SearchError::Config(format!("Malformed keyword index bundle {}: {}", path.display(), e))
        })?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.documents.len() != self.corpus_tokens.len() {
            return Err(SearchError::Config(format!(
                "Keyword index bundle is inconsistent: {} documents but {} token rows",
                self.documents.len(),
                self.corpus_tokens.len()
            )));
        }
        if self.documents.is_empty() {
            return Err(SearchError::Config("Keyword index bundle contains no documents".into()));
        }
        Ok(())
    }
}

/// In-memory keyword backend: BM25 statistics plus the position-indexed document mapping.
pub struct KeywordIndex {
    documents: Vec<Document>,
    scorer: Bm25Okapi,
}

impl KeywordIndex {
    pub fn from_bundle(bundle: KeywordIndexBundle) -> Self {
        let scorer = Bm25Okapi::new(&bundle.corpus_tokens, bundle.bm25);
        KeywordIndex {
            documents: bundle.documents,
            scorer,
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let bundle = KeywordIndexBundle::load(path).await?;
        Ok(Self::from_bundle(bundle))
    }
}

impl KeywordBackend for KeywordIndex {
    fn get_scores(&self, tokens: &[String]) -> Result<Vec<f64>, SearchError> {
        Ok(self.scorer.get_scores(tokens))
    }

    fn document(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }

    fn len(&self) -> usize {
        self.documents.len()
    }
}
