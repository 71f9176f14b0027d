/// Local embedding provider using fastembed
///
/// Provides offline query embedding with models whose weights are downloaded once
/// and cached locally. No API key required.
/// All CPU-bound fastembed calls are wrapped in spawn_blocking to avoid blocking async runtime.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task;

use super::{EmbeddingError, EmbeddingProvider};

/// Map a configured model name to the fastembed model and its output dimension.
fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    match name {
        "all-MiniLM-L6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "paraphrase-multilingual-MiniLM-L12-v2" => Ok((EmbeddingModel::ParaphraseMLMiniLML12V2, 384)),
        "bge-small-zh-v1.5" => Ok((EmbeddingModel::BGESmallZHV15, 512)),
        other => Err(EmbeddingError::NotConfigured(format!(
            "Unsupported local embedding model '{}': expected all-MiniLM-L6-v2, \
             paraphrase-multilingual-MiniLM-L12-v2 or bge-small-zh-v1.5",
            other
        ))),
    }
}

/// Local embedding provider backed by fastembed.
///
/// fastembed is synchronous and its session is not shareable across threads
/// without a lock, so the model sits behind a Mutex and embed() uses spawn_blocking.
pub struct LocalEmbeddingProvider {
    model: Arc<Mutex<TextEmbedding>>,
    name: String,
    dim: usize,
}

impl LocalEmbeddingProvider {
    /// Create a new LocalEmbeddingProvider, downloading model weights if not cached.
    ///
    /// # Arguments
    /// * `model_name` - One of the supported model identifiers
    /// * `cache_dir` - Directory to cache model weights (fastembed downloads on first use)
    pub async fn new(model_name: &str, cache_dir: &str) -> Result<Self, EmbeddingError> {
        let (model_kind, dim) = resolve_model(model_name)?;
        let cache_path = PathBuf::from(cache_dir);

        let model = task::spawn_blocking(move || {
            std::fs::create_dir_all(&cache_path)
                .map_err(|e| EmbeddingError::ModelInit(format!("Failed to create cache dir: {}", e)))?;
            TextEmbedding::try_new(
                TextInitOptions::new(model_kind)
                    .with_cache_dir(cache_path)
                    .with_show_download_progress(false),
            )
            .map_err(|e| EmbeddingError::ModelInit(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::ModelInit(e.to_string()))??;

        Ok(LocalEmbeddingProvider {
            model: Arc::new(Mutex::new(model)),
            name: model_name.to_string(),
            dim,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        let input = vec![text.to_string()];

        let mut embeddings = task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| EmbeddingError::Generation("Embedding model lock poisoned".to_string()))?;
            model
                .embed(input, None)
                .map_err(|e| EmbeddingError::Generation(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::Generation(e.to_string()))??;

        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::Generation("Model returned no embedding".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
