/// Keyword retrieval adapter.
///
/// Tokenizes the query, drops single-character and whitespace tokens, scores every
/// indexed position with the keyword backend, then keeps the best `n` positions.
/// Zero and negative scores are still candidates; only NaN is discarded. Scoring
/// runs on the blocking pool since it walks the whole corpus.

use async_trait::async_trait;
use std::sync::Arc;

use super::{KeywordBackend, RetrievalAdapter};
use crate::document::{Modality, RetrievalHit};
use crate::errors::SearchError;
use crate::search::normalize::ScoreNormalizer;
use crate::tokenizer::Tokenizer;

pub struct KeywordAdapter {
    backend: Arc<dyn KeywordBackend>,
    tokenizer: Arc<dyn Tokenizer>,
    normalizer: ScoreNormalizer,
}

/// Tokens worth scoring: trimmed, longer than one character.
pub fn query_terms(tokenizer: &dyn Tokenizer, query: &str) -> Vec<String> {
    tokenizer
        .tokenize(query)
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| t.chars().count() > 1)
        .collect()
}

/// Positions of the best `n` scores: descending score, equal scores by descending position.
fn top_positions(scores: &[f64], n: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
    ranked.truncate(n);
    ranked
}

impl KeywordAdapter {
    pub fn new(backend: Arc<dyn KeywordBackend>, tokenizer: Arc<dyn Tokenizer>, normalizer: ScoreNormalizer) -> Self {
        KeywordAdapter {
            backend,
            tokenizer,
            normalizer,
        }
    }
}

#[async_trait]
impl RetrievalAdapter for KeywordAdapter {
    fn modality(&self) -> Modality {
        Modality::Keyword
    }

    async fn try_retrieve(&self, query: &str, n: usize) -> Result<Vec<RetrievalHit>, SearchError> {
        let terms = query_terms(self.tokenizer.as_ref(), query);
        if terms.is_empty() || n == 0 {
            tracing::debug!(query = %query, "No usable keyword terms");
            return Ok(Vec::new());
        }
        tracing::debug!(terms = ?terms, "Keyword query terms");

        let backend = Arc::clone(&self.backend);
        let scores = tokio::task::spawn_blocking(move || backend.get_scores(&terms)).await??;
        if scores.len() != self.backend.len() {
            return Err(SearchError::backend(
                Modality::Keyword,
                format!("Score vector has {} entries for {} documents", scores.len(), self.backend.len()),
            ));
        }

        let mut hits = Vec::with_capacity(n.min(scores.len()));
        for (position, raw_score) in top_positions(&scores, n) {
            let Some(document) = self.backend.document(position) else {
                return Err(SearchError::backend(
                    Modality::Keyword,
                    format!("No document stored at position {}", position),
                ));
            };
            hits.push(RetrievalHit {
                document_id: document.id.clone(),
                raw_score,
                score: self.normalizer.normalize(Modality::Keyword, raw_score),
                source_rank: hits.len() + 1,
                modality: Modality::Keyword,
                document: document.clone(),
            });
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::tokenizer::UnicodeSegmenter;

    struct WhitespaceTokenizer;

    impl Tokenizer for WhitespaceTokenizer {
        fn tokenize(&self, text: &str) -> Vec<String> {
            text.split(' ').map(String::from).collect()
        }
    }

    struct FixedScores {
        scores: Vec<f64>,
        documents: Vec<Document>,
    }

    impl FixedScores {
        fn new(scores: Vec<f64>) -> Self {
            let documents = (0..scores.len())
                .map(|i| Document {
                    id: format!("doc-{}", i),
                    title: format!("title {}", i),
                    content: String::new(),
                    author: "a".into(),
                    url: String::new(),
                    timestamp: String::new(),
                })
                .collect();
            FixedScores { scores, documents }
        }
    }

    impl KeywordBackend for FixedScores {
        fn get_scores(&self, _tokens: &[String]) -> Result<Vec<f64>, SearchError> {
            Ok(self.scores.clone())
        }

        fn document(&self, position: usize) -> Option<&Document> {
            self.documents.get(position)
        }

        fn len(&self) -> usize {
            self.documents.len()
        }
    }

    fn adapter(scores: Vec<f64>) -> KeywordAdapter {
        KeywordAdapter::new(
            Arc::new(FixedScores::new(scores)),
            Arc::new(WhitespaceTokenizer),
            ScoreNormalizer::default(),
        )
    }

    #[test]
    fn test_query_terms_drop_short_tokens() {
        let terms = query_terms(&WhitespaceTokenizer, "a  rust b tokio");
        assert_eq!(terms, vec!["rust", "tokio"]);
    }

    #[test]
    fn test_top_positions_keep_zero_and_break_ties() {
        let ranked = top_positions(&[0.0, 1.5, -0.5, 1.5, 3.0, f64::NAN, 0.0], 10);
        let positions: Vec<usize> = ranked.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![4, 3, 1, 6, 0, 2]);
    }

    #[test]
    fn test_top_positions_truncate() {
        let ranked = top_positions(&[0.0, 2.0, 0.0], 2);
        assert_eq!(ranked, vec![(1, 2.0), (2, 0.0)]);
    }

    #[tokio::test]
    async fn test_ranks_and_normalizes() {
        let hits = adapter(vec![0.0, 1.0, 3.0, -1.0]).try_retrieve("rust tokio", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "doc-2");
        assert_eq!(hits[0].source_rank, 1);
        assert_eq!(hits[0].raw_score, 3.0);
        assert_eq!(hits[0].score, 1.0);
        assert_eq!(hits[1].document_id, "doc-1");
        assert_eq!(hits[1].source_rank, 2);
        assert_eq!(hits[1].score, 0.75);
        assert_eq!(hits[1].modality, Modality::Keyword);
    }

    #[tokio::test]
    async fn test_zero_and_negative_scores_are_candidates() {
        let hits = adapter(vec![0.0, -1.0]).try_retrieve("rust", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "doc-0");
        assert_eq!(hits[0].score, 0.5);
        assert_eq!(hits[1].document_id, "doc-1");
        assert_eq!(hits[1].score, 0.25);
        assert_eq!(hits[1].source_rank, 2);
    }

    #[tokio::test]
    async fn test_no_usable_terms() {
        let hits = adapter(vec![1.0]).try_retrieve("a b", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_misaligned_scores_degrade() {
        let mut backend = FixedScores::new(vec![1.0, 2.0]);
        backend.documents.pop();
        let adapter = KeywordAdapter::new(Arc::new(backend), Arc::new(WhitespaceTokenizer), ScoreNormalizer::default());
        assert!(adapter.try_retrieve("rust", 5).await.is_err());
        assert!(adapter.retrieve("rust", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_with_unicode_segmenter() {
        let adapter = KeywordAdapter::new(
            Arc::new(FixedScores::new(vec![0.5])),
            Arc::new(UnicodeSegmenter),
            ScoreNormalizer::default(),
        );
        let hits = adapter.try_retrieve("图书馆", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
