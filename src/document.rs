/// Data model shared by the retrieval, fusion and assembly stages.
///
/// `Document` is owned by the external indices; everything else is created per
/// request and dropped when the response has been produced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SearchError;

/// A forum post as stored by the indices. Immutable once indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, unique across the corpus
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub url: String,
    /// Opaque display string, never parsed
    #[serde(default)]
    pub timestamp: String,
}

pub(crate) fn default_title() -> String {
    "Untitled".to_string()
}

pub(crate) fn default_author() -> String {
    "Unknown author".to_string()
}

/// Which retrieval signal produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Vector,
    Keyword,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Vector => write!(f, "vector"),
            Modality::Keyword => write!(f, "keyword"),
        }
    }
}

/// One candidate returned by one modality.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalHit {
    pub document_id: String,
    /// Modality-specific scale: similarity in (0, 1] for vectors, unbounded BM25 for keywords
    pub raw_score: f64,
    /// `raw_score` after the score normalizer; what simple merge sorts by
    pub score: f64,
    /// 1-based position within the modality's returned list
    pub source_rank: usize,
    pub modality: Modality,
    /// Denormalized display copy so fusion never needs a second lookup
    pub document: Document,
}

/// Per-modality rank of a fused document; `None` when the modality did not return it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributingRanks {
    pub vector: Option<usize>,
    pub keyword: Option<usize>,
}

/// Output of fusion for a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedResult {
    pub document_id: String,
    /// Only comparable within the same fusion run
    pub fused_score: f64,
    pub contributing_ranks: ContributingRanks,
    /// Display fields from the winning hit (vector preferred)
    pub document: Document,
    /// Filled in by the result assembler
    pub summary: String,
}

/// Fusion policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethod {
    #[default]
    Rrf,
    Weighted,
    Simple,
}

impl fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionMethod::Rrf => write!(f, "rrf"),
            FusionMethod::Weighted => write!(f, "weighted"),
            FusionMethod::Simple => write!(f, "simple"),
        }
    }
}

impl FromStr for FusionMethod {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rrf" => Ok(FusionMethod::Rrf),
            "weighted" => Ok(FusionMethod::Weighted),
            "simple" => Ok(FusionMethod::Simple),
            other => Err(SearchError::validation(
                "fusion_method",
                &format!("Unknown fusion method '{}': expected one of rrf, weighted, simple", other),
            )),
        }
    }
}

/// A search call as received at the request boundary.
///
/// `fusion_method` stays a string here so an unknown value can be rejected
/// before any adapter runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
    pub fusion_method: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        SearchRequest {
            query: query.into(),
            top_k: None,
            fusion_method: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_fusion(mut self, method: impl Into<String>) -> Self {
        self.fusion_method = Some(method.into());
        self
    }
}

/// Display record for one result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub url: String,
    pub timestamp: String,
    pub score: f64,
    pub summary: String,
}

impl From<FusedResult> for SearchResult {
    fn from(fused: FusedResult) -> Self {
        let doc = fused.document;
        SearchResult {
            id: fused.document_id,
            title: doc.title,
            content: doc.content,
            author: doc.author,
            url: doc.url,
            timestamp: doc.timestamp,
            score: fused.fused_score,
            summary: fused.summary,
        }
    }
}

/// Response envelope returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Echo of the request query
    pub query: String,
    pub total_results: usize,
    pub results: Vec<SearchResult>,
    /// Wall-clock time for the whole search, observability only
    pub search_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fusion_method_parse() {
        assert_eq!("rrf".parse::<FusionMethod>().unwrap(), FusionMethod::Rrf);
        assert_eq!(" Weighted ".parse::<FusionMethod>().unwrap(), FusionMethod::Weighted);
        assert_eq!("SIMPLE".parse::<FusionMethod>().unwrap(), FusionMethod::Simple);
    }

    #[test]
    fn test_fusion_method_rejects_unknown() {
        let err = "bogus".parse::<FusionMethod>().unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_fusion_method_display_roundtrips() {
        for method in [FusionMethod::Rrf, FusionMethod::Weighted, FusionMethod::Simple] {
            assert_eq!(method.to_string().parse::<FusionMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_document_defaults_for_missing_metadata() {
        let doc: Document = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.author, "Unknown author");
        assert_eq!(doc.content, "");
        assert_eq!(doc.url, "");
    }

    #[test]
    fn test_search_result_from_fused() {
        let fused = FusedResult {
            document_id: "7".to_string(),
            fused_score: 0.5,
            contributing_ranks: ContributingRanks { vector: Some(1), keyword: None },
            document: Document {
                id: "7".to_string(),
                title: "t".to_string(),
                content: "c".to_string(),
                author: "a".to_string(),
                url: "u".to_string(),
                timestamp: "2024-01-01".to_string(),
            },
            summary: "c".to_string(),
        };
        let result = SearchResult::from(fused);
        assert_eq!(result.id, "7");
        assert_eq!(result.score, 0.5);
        assert_eq!(result.summary, "c");
        assert_eq!(result.timestamp, "2024-01-01");
    }
}
