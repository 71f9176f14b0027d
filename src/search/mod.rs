/// Hybrid search core: score normalization, rank fusion, summaries and the
/// per-request orchestrator that drives them.

pub mod fusion;
pub mod normalize;
pub mod orchestrator;
pub mod summary;

pub use fusion::{rrf_fuse, simple_merge, weighted_fuse, FusionEngine};
pub use normalize::ScoreNormalizer;
pub use orchestrator::{SearchOrchestrator, SearchPhase};
pub use summary::Summarizer;
