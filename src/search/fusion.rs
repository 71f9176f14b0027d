/// Rank fusion of the vector and keyword candidate lists.
///
/// Three policies share one input shape (two ordered hit lists plus `top_k`):
///   - rrf:      sum of 1/(k + rank) per modality; a missing modality counts as rank k + 1
///   - weighted: the same contributions, each multiplied by its modality weight
///   - simple:   union keyed by id, vector hits win collisions, sorted by each hit's own score
///
/// Every policy orders by fused score descending, then document id ascending, and
/// emits each document id at most once.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::FusionConfig;
use crate::document::{ContributingRanks, FusedResult, FusionMethod, RetrievalHit};

/// Fusion settings resolved once from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FusionEngine {
    rrf_k: usize,
    weights: FusionConfig,
}

impl FusionEngine {
    pub fn new(rrf_k: usize, weights: FusionConfig) -> Self {
        FusionEngine { rrf_k, weights }
    }

    pub fn fuse(
        &self,
        method: FusionMethod,
        vector_hits: &[RetrievalHit],
        keyword_hits: &[RetrievalHit],
        top_k: usize,
    ) -> Vec<FusedResult> {
        match method {
            FusionMethod::Rrf => rrf_fuse(vector_hits, keyword_hits, self.rrf_k, top_k),
            FusionMethod::Weighted => weighted_fuse(vector_hits, keyword_hits, self.rrf_k, self.weights, top_k),
            FusionMethod::Simple => simple_merge(vector_hits, keyword_hits, top_k),
        }
    }
}

/// Reciprocal Rank Fusion with equal, unit weights.
pub fn rrf_fuse(vector_hits: &[RetrievalHit], keyword_hits: &[RetrievalHit], k: usize, top_k: usize) -> Vec<FusedResult> {
    rank_fuse(vector_hits, keyword_hits, k, (1.0, 1.0), top_k)
}

/// Reciprocal Rank Fusion with per-modality weights applied to each contribution.
pub fn weighted_fuse(
    vector_hits: &[RetrievalHit],
    keyword_hits: &[RetrievalHit],
    k: usize,
    weights: FusionConfig,
    top_k: usize,
) -> Vec<FusedResult> {
    rank_fuse(vector_hits, keyword_hits, k, (weights.vector_weight, weights.keyword_weight), top_k)
}

/// Union keyed by document id. Vector hits are inserted first and keep their slot on collision.
///
/// The fused score is the winning hit's own `score`. Vector similarity and normalized
/// keyword scores are not calibrated against each other, so the cross-modality order
/// is approximate; rrf does not have this caveat.
pub fn simple_merge(vector_hits: &[RetrievalHit], keyword_hits: &[RetrievalHit], top_k: usize) -> Vec<FusedResult> {
    let vector_ranks = first_ranks(vector_hits);
    let keyword_ranks = first_ranks(keyword_hits);

    let mut merged: HashMap<&str, &RetrievalHit> = HashMap::new();
    for hit in vector_hits.iter().chain(keyword_hits) {
        merged.entry(hit.document_id.as_str()).or_insert(hit);
    }

    let results = merged
        .into_iter()
        .map(|(id, hit)| FusedResult {
            document_id: id.to_string(),
            fused_score: hit.score,
            contributing_ranks: ContributingRanks {
                vector: vector_ranks.get(id).map(|(rank, _)| *rank),
                keyword: keyword_ranks.get(id).map(|(rank, _)| *rank),
            },
            document: hit.document.clone(),
            summary: String::new(),
        })
        .collect();

    finish(results, top_k)
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// id -> (source_rank, hit) for the first occurrence of each id in a list.
fn first_ranks(hits: &[RetrievalHit]) -> HashMap<&str, (usize, &RetrievalHit)> {
    let mut ranks = HashMap::with_capacity(hits.len());
    for hit in hits {
        ranks.entry(hit.document_id.as_str()).or_insert((hit.source_rank, hit));
    }
    ranks
}

fn rank_fuse(
    vector_hits: &[RetrievalHit],
    keyword_hits: &[RetrievalHit],
    k: usize,
    (vector_weight, keyword_weight): (f64, f64),
    top_k: usize,
) -> Vec<FusedResult> {
    let vector_ranks = first_ranks(vector_hits);
    let keyword_ranks = first_ranks(keyword_hits);
    let k = k as f64;
    // Rank assigned to a document the modality did not return
    let missing_rank = k + 1.0;

    let mut universe: Vec<&str> = vector_ranks.keys().chain(keyword_ranks.keys()).copied().collect();
    universe.sort_unstable();
    universe.dedup();

    let results = universe
        .into_iter()
        .filter_map(|id| {
            let vector = vector_ranks.get(id);
            let keyword = keyword_ranks.get(id);
            let rank_v = vector.map(|(r, _)| *r as f64).unwrap_or(missing_rank);
            let rank_k = keyword.map(|(r, _)| *r as f64).unwrap_or(missing_rank);
            let fused_score = vector_weight / (k + rank_v) + keyword_weight / (k + rank_k);

            let (_, hit) = vector.or(keyword)?;
            Some(FusedResult {
                document_id: id.to_string(),
                fused_score,
                contributing_ranks: ContributingRanks {
                    vector: vector.map(|(r, _)| *r),
                    keyword: keyword.map(|(r, _)| *r),
                },
                document: hit.document.clone(),
                summary: String::new(),
            })
        })
        .collect();

    finish(results, top_k)
}

fn finish(mut results: Vec<FusedResult>, top_k: usize) -> Vec<FusedResult> {
    results.sort_by(compare_fused);
    results.truncate(top_k);
    results
}

fn compare_fused(a: &FusedResult, b: &FusedResult) -> Ordering {
    b.fused_score
        .total_cmp(&a.fused_score)
        .then_with(|| a.document_id.cmp(&b.document_id))
}
