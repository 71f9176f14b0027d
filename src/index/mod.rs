/// Read-only backends behind the retrieval adapters.
///
/// Both are built offline and loaded once at process start; searches only read them,
/// so concurrent requests share them without locking.

pub mod bm25;
pub mod bundle;
pub mod vector_store;

pub use bundle::{KeywordIndex, KeywordIndexBundle};
pub use vector_store::{InMemoryVectorStore, VectorRecord, VectorStoreFile};
