/// Process-wide search context.
///
/// Built once at startup from `Config`: loads the keyword index bundle and the
/// vector store, creates the embedding provider, and wires both retrieval adapters
/// into a `SearchOrchestrator`. Every request handler borrows this through an `Arc`.
/// Any failure here is a configuration error and the process must not serve.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::document::{SearchRequest, SearchResponse};
use crate::embedding::local::LocalEmbeddingProvider;
use crate::embedding::ngram::NgramEmbeddingProvider;
use crate::embedding::openai::OpenAIEmbeddingProvider;
use crate::embedding::EmbeddingProvider;
use crate::errors::SearchError;
use crate::index::{InMemoryVectorStore, KeywordIndex};
use crate::retrieval::{KeywordAdapter, KeywordBackend, VectorAdapter, VectorBackend};
use crate::search::{ScoreNormalizer, SearchOrchestrator};
use crate::tokenizer::UnicodeSegmenter;

/// Document counts and model name reported by `index_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub vector_documents: usize,
    pub keyword_documents: usize,
    pub embedding_model: String,
}

pub struct SearchContext {
    orchestrator: SearchOrchestrator,
    stats: IndexStats,
    started_at: Instant,
}

/// Create the embedding provider based on configuration.
pub async fn create_embedding_provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>, SearchError> {
    let embedding = &config.embedding;
    let provider: Arc<dyn EmbeddingProvider> = match embedding.provider.as_str() {
        "openai" => {
            let api_key = embedding.openai_api_key.clone().ok_or_else(|| {
                SearchError::Config(
                    "OpenAI API key required when provider is 'openai'. \
                     Set FORUMSEARCH_EMBEDDING__OPENAI_API_KEY or embedding.openai_api_key in forumsearch.toml"
                        .into(),
                )
            })?;
            Arc::new(
                OpenAIEmbeddingProvider::new(&embedding.openai_base_url, api_key, embedding.openai_model.clone())
                    .map_err(|e| SearchError::Config(e.to_string()))?,
            )
        }
        "ngram" => Arc::new(
            NgramEmbeddingProvider::new(embedding.ngram_dimension).map_err(|e| SearchError::Config(e.to_string()))?,
        ),
        "local" => Arc::new(
            LocalEmbeddingProvider::new(&embedding.model, &embedding.cache_dir)
                .await
                .map_err(|e| SearchError::Config(e.to_string()))?,
        ),
        other => {
            return Err(SearchError::Config(format!(
                "Unknown embedding provider '{}': expected one of local, openai, ngram",
                other
            )))
        }
    };
    tracing::info!(
        provider = %embedding.provider,
        model = %provider.model_name(),
        dimension = provider.dimension(),
        "Embedding provider initialized"
    );
    Ok(provider)
}

impl SearchContext {
    /// Load both indices and build the search pipeline.
    pub async fn initialize(config: &Config) -> Result<Self, SearchError> {
        let provider = create_embedding_provider(config).await?;

        let (keyword_index, vector_store) = tokio::join!(
            KeywordIndex::load(&config.index.bundle_path),
            InMemoryVectorStore::load(&config.index.vector_store_path, provider),
        );
        let keyword_index = keyword_index?;
        let vector_store = vector_store?;

        tracing::info!(
            bundle_path = %config.index.bundle_path,
            documents = keyword_index.len(),
            "Keyword index loaded"
        );
        tracing::info!(
            vector_store_path = %config.index.vector_store_path,
            documents = vector_store.len(),
            "Vector store loaded"
        );

        Ok(Self::new(Arc::new(vector_store), Arc::new(keyword_index), config))
    }

    /// Assemble a context from already-loaded backends.
    pub fn new(vector: Arc<dyn VectorBackend>, keyword: Arc<dyn KeywordBackend>, config: &Config) -> Self {
        let stats = IndexStats {
            vector_documents: vector.len(),
            keyword_documents: keyword.len(),
            embedding_model: vector.model_name().to_string(),
        };
        let normalizer = ScoreNormalizer::new(&config.normalizer);
        let vector_adapter = VectorAdapter::new(vector, normalizer);
        let keyword_adapter = KeywordAdapter::new(keyword, Arc::new(UnicodeSegmenter), normalizer);

        SearchContext {
            orchestrator: SearchOrchestrator::new(Arc::new(vector_adapter), Arc::new(keyword_adapter), config),
            stats,
            started_at: Instant::now(),
        }
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.orchestrator.search(request).await
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn backends_loaded(&self) -> bool {
        self.stats.vector_documents > 0 && self.stats.keyword_documents > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::index::{KeywordIndexBundle, VectorRecord, VectorStoreFile};
    use crate::index::bm25::Bm25Params;
    use crate::retrieval::StoredMetadata;
    use crate::tokenizer::Tokenizer;

    fn ngram_config(dimension: usize) -> Config {
        let mut config = Config::default();
        config.embedding.provider = "ngram".to_string();
        config.embedding.ngram_dimension = dimension;
        config
    }

    fn fixture_context() -> SearchContext {
        let config = ngram_config(64);
        let provider = Arc::new(NgramEmbeddingProvider::new(64).unwrap());
        let posts = [
            ("p1", "图书馆开放时间", "图书馆周一到周五早八点开放。周末闭馆。"),
            ("p2", "食堂推荐", "二食堂的麻辣烫很好吃。"),
            ("p3", "选课攻略", "选课系统早上九点开放。"),
        ];

        let segmenter = UnicodeSegmenter;
        let bundle = KeywordIndexBundle {
            documents: posts
                .iter()
                .map(|(id, title, content)| Document {
                    id: id.to_string(),
                    title: title.to_string(),
                    content: content.to_string(),
                    author: "同学".to_string(),
                    url: String::new(),
                    timestamp: String::new(),
                })
                .collect(),
            corpus_tokens: posts
                .iter()
                .map(|(_, title, content)| segmenter.tokenize(&format!("{} {}", title, content)))
                .collect(),
            bm25: Bm25Params::default(),
        };
        let store = VectorStoreFile {
            model: Some("ngram-64".into()),
            dimension: 64,
            records: posts
                .iter()
                .map(|(id, title, content)| VectorRecord {
                    id: id.to_string(),
                    document: content.to_string(),
                    metadata: StoredMetadata { title: title.to_string(), ..StoredMetadata::default() },
                    embedding: provider.vectorize(&format!("{} {}", title, content)),
                })
                .collect(),
        };
        let vector = InMemoryVectorStore::new(store, provider).unwrap();
        SearchContext::new(Arc::new(vector), Arc::new(KeywordIndex::from_bundle(bundle)), &config)
    }

    #[test]
    fn test_stats_reflect_backends() {
        let context = fixture_context();
        assert_eq!(
            context.stats(),
            &IndexStats { vector_documents: 3, keyword_documents: 3, embedding_model: "ngram-64".into() }
        );
        assert!(context.backends_loaded());
    }

    #[tokio::test]
    async fn test_search_finds_matching_post_first() {
        let context = fixture_context();
        let response = context.search(&SearchRequest::new("图书馆开放时间").with_top_k(2)).await.unwrap();
        assert_eq!(response.total_results, 2);
        assert_eq!(response.results[0].id, "p1");
        assert_eq!(response.results[0].title, "图书馆开放时间");
    }

    #[tokio::test]
    async fn test_unknown_provider_is_config_error() {
        let mut config = Config::default();
        config.embedding.provider = "word2vec".to_string();
        let result = create_embedding_provider(&config).await;
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[tokio::test]
    async fn test_openai_requires_key() {
        let mut config = Config::default();
        config.embedding.provider = "openai".to_string();
        config.embedding.openai_api_key = None;
        assert!(matches!(create_embedding_provider(&config).await, Err(SearchError::Config(_))));
    }

    #[tokio::test]
    async fn test_initialize_missing_files_fails() {
        let mut config = ngram_config(32);
        config.index.bundle_path = "/nonexistent/bundle.json".to_string();
        config.index.vector_store_path = "/nonexistent/vectors.json".to_string();
        assert!(matches!(SearchContext::initialize(&config).await, Err(SearchError::Config(_))));
    }
}
