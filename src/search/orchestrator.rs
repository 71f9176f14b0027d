/// Per-request search pipeline.
///
/// Idle -> Retrieving (vector and keyword concurrently) -> Fusing -> Summarizing -> Done.
/// Input is validated before either adapter is touched. Adapters never fail the
/// request; only a malformed request or the request deadline does.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use crate::config::{Config, SearchConfig};
use crate::document::{FusionMethod, SearchRequest, SearchResponse, SearchResult};
use crate::errors::SearchError;
use crate::retrieval::RetrievalAdapter;

use super::fusion::FusionEngine;
use super::summary::Summarizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Retrieving,
    Fusing,
    Summarizing,
    Done,
    Failed,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchPhase::Retrieving => "retrieving",
            SearchPhase::Fusing => "fusing",
            SearchPhase::Summarizing => "summarizing",
            SearchPhase::Done => "done",
            SearchPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct SearchOrchestrator {
    vector: Arc<dyn RetrievalAdapter>,
    keyword: Arc<dyn RetrievalAdapter>,
    fusion: FusionEngine,
    summarizer: Summarizer,
    settings: SearchConfig,
}

impl SearchOrchestrator {
    pub fn new(vector: Arc<dyn RetrievalAdapter>, keyword: Arc<dyn RetrievalAdapter>, config: &Config) -> Self {
        let settings = config.search.clone();
        SearchOrchestrator {
            vector,
            keyword,
            fusion: FusionEngine::new(settings.rrf_k, config.fusion),
            summarizer: Summarizer::new(settings.summary_max_chars, settings.sentence_terminator),
            settings,
        }
    }

    /// Run one search end to end.
    ///
    /// # Errors
    /// - `Validation` for a blank query, `top_k == 0` or an unknown fusion method
    /// - `Timeout` when the request deadline passes; in-flight retrievals are dropped
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let started = Instant::now();

        let query = request.query.trim();
        if query.is_empty() {
            return Err(SearchError::validation("query", "Query cannot be empty"));
        }
        let method = match request.fusion_method.as_deref() {
            Some(raw) => raw.parse::<FusionMethod>()?,
            None => self.settings.default_fusion,
        };
        let top_k = self.resolve_top_k(request.top_k)?;

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("search", %request_id, fusion = %method, top_k);
        let deadline = Duration::from_millis(self.settings.timeout_ms);

        let outcome = tokio::time::timeout(deadline, self.run(query, method, top_k))
            .instrument(span.clone())
            .await;
        let elapsed = started.elapsed();

        let results = match outcome {
            Ok(results) => results,
            Err(_) => {
                let elapsed_ms = elapsed.as_millis() as u64;
                tracing::debug!(parent: &span, phase = %SearchPhase::Failed, "Search deadline exceeded");
                tracing::warn!(parent: &span, elapsed_ms, timeout_ms = self.settings.timeout_ms, "Search timed out");
                return Err(SearchError::Timeout { elapsed_ms });
            }
        };

        let search_time_ms = elapsed.as_secs_f64() * 1000.0;
        tracing::debug!(parent: &span, phase = %SearchPhase::Done, "Search finished");
        tracing::info!(parent: &span, results = results.len(), search_time_ms, "Search completed");

        Ok(SearchResponse {
            query: request.query.clone(),
            total_results: results.len(),
            results,
            search_time_ms,
        })
    }

    async fn run(&self, query: &str, method: FusionMethod, top_k: usize) -> Vec<SearchResult> {
        let candidates = top_k.saturating_mul(self.settings.candidate_multiplier);
        tracing::debug!(phase = %SearchPhase::Retrieving, candidates, "Querying retrieval adapters");

        let (vector_hits, keyword_hits) = tokio::join!(
            self.vector.retrieve(query, candidates),
            self.keyword.retrieve(query, candidates),
        );

        tracing::debug!(
            phase = %SearchPhase::Fusing,
            vector_hits = vector_hits.len(),
            keyword_hits = keyword_hits.len(),
            "Fusing candidates"
        );
        let fused = self.fusion.fuse(method, &vector_hits, &keyword_hits, top_k);

        tracing::debug!(phase = %SearchPhase::Summarizing, fused = fused.len(), "Building summaries");
        self.summarizer.assemble(fused)
    }

    fn resolve_top_k(&self, requested: Option<usize>) -> Result<usize, SearchError> {
        match requested {
            None => Ok(self.settings.default_top_k),
            Some(0) => Err(SearchError::validation("top_k", "top_k must be a positive integer")),
            Some(k) => Ok(k),
        }
    }
}
