/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. TOML file: forumsearch.toml (in working directory)
/// 3. Environment variables: prefixed FORUMSEARCH_, nested sections split on "__"
///    (e.g., FORUMSEARCH_SEARCH__RRF_K=30, FORUMSEARCH_EMBEDDING__PROVIDER=ngram)

use figment::{
    Figment,
    providers::{Env, Format, Toml, Serialized},
};
use serde::{Deserialize, Serialize};
use crate::document::FusionMethod;
use crate::errors::SearchError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional file path for JSON log output (in addition to stderr)
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

/// Locations of the read-only index files produced by the offline build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Keyword index bundle: document mapping + tokenized corpus
    #[serde(default = "default_bundle_path")]
    pub bundle_path: String,

    /// Vector store: stored embeddings + display metadata
    #[serde(default = "default_vector_store_path")]
    pub vector_store_path: String,
}

fn default_bundle_path() -> String {
    "data/keyword_index.json".to_string()
}

fn default_vector_store_path() -> String {
    "data/vector_store.json".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            bundle_path: default_bundle_path(),
            vector_store_path: default_vector_store_path(),
        }
    }
}

/// Embedding provider used to turn the query into a vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "local" (fastembed), "openai", or "ngram" (offline hashed character n-grams)
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Model name for the local provider
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Directory where fastembed caches model weights
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Vector width of the ngram provider; must match the vector store
    #[serde(default = "default_ngram_dimension")]
    pub ngram_dimension: usize,
}

fn default_embedding_provider() -> String {
    "local".to_string()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_cache_dir() -> String {
    dirs::cache_dir()
        .map(|d| d.join("forumsearch").join("models"))
        .unwrap_or_else(|| std::path::PathBuf::from(".fastembed_cache"))
        .to_string_lossy()
        .into_owned()
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ngram_dimension() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            cache_dir: default_cache_dir(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
            ngram_dimension: default_ngram_dimension(),
        }
    }
}

/// Request-level search behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result count when the request does not specify one
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Each adapter is asked for top_k * candidate_multiplier candidates
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,

    /// Smoothing constant for rank-reciprocal fusion
    #[serde(default = "default_rrf_k")]
    pub rrf_k: usize,

    #[serde(default)]
    pub default_fusion: FusionMethod,

    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    #[serde(default = "default_sentence_terminator")]
    pub sentence_terminator: char,

    /// Request deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_top_k() -> usize {
    20
}

fn default_candidate_multiplier() -> usize {
    2
}

fn default_rrf_k() -> usize {
    60
}

fn default_summary_max_chars() -> usize {
    100
}

fn default_sentence_terminator() -> char {
    '。'
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            default_top_k: default_top_k(),
            candidate_multiplier: default_candidate_multiplier(),
            rrf_k: default_rrf_k(),
            default_fusion: FusionMethod::default(),
            summary_max_chars: default_summary_max_chars(),
            sentence_terminator: default_sentence_terminator(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Per-modality weights for the weighted fusion policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default = "default_weight")]
    pub vector_weight: f64,

    #[serde(default = "default_weight")]
    pub keyword_weight: f64,
}

fn default_weight() -> f64 {
    0.5
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            vector_weight: default_weight(),
            keyword_weight: default_weight(),
        }
    }
}

/// Affine clip applied to keyword scores: clamp((raw + offset) / scale, 0, 1).
///
/// The defaults assume BM25 scores mostly fall in [-2, 2]; they are empirical and
/// dataset-dependent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_keyword_offset")]
    pub keyword_offset: f64,

    #[serde(default = "default_keyword_scale")]
    pub keyword_scale: f64,
}

fn default_keyword_offset() -> f64 {
    2.0
}

fn default_keyword_scale() -> f64 {
    4.0
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            keyword_offset: default_keyword_offset(),
            keyword_scale: default_keyword_scale(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            log_file: None,
            index: IndexConfig::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            fusion: FusionConfig::default(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML file, and environment variables
    ///
    /// Environment variables override TOML file values.
    /// Example: FORUMSEARCH_LOG_LEVEL=debug overrides log_level in forumsearch.toml
    pub fn load() -> Result<Config, SearchError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("forumsearch.toml"))
            .merge(Env::prefixed("FORUMSEARCH_").split("__"))
            .extract()
            .map_err(|e| SearchError::Config(format!("Failed to load config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the search pipeline cannot run with.
    pub fn validate(&self) -> Result<(), SearchError> {
        let s = &self.search;
        if s.default_top_k == 0 {
            return Err(SearchError::Config("search.default_top_k must be greater than 0".into()));
        }
        if s.candidate_multiplier == 0 {
            return Err(SearchError::Config("search.candidate_multiplier must be greater than 0".into()));
        }
        if s.timeout_ms == 0 {
            return Err(SearchError::Config("search.timeout_ms must be greater than 0".into()));
        }

        let f = &self.fusion;
        if !f.vector_weight.is_finite() || !f.keyword_weight.is_finite() {
            return Err(SearchError::Config("fusion weights must be finite".into()));
        }
        if f.vector_weight < 0.0 || f.keyword_weight < 0.0 {
            return Err(SearchError::Config("fusion weights must be non-negative".into()));
        }
        if f.vector_weight + f.keyword_weight <= 0.0 {
            return Err(SearchError::Config("fusion weights must sum to a positive value".into()));
        }

        let n = &self.normalizer;
        if !n.keyword_offset.is_finite() || !n.keyword_scale.is_finite() || n.keyword_scale <= 0.0 {
            return Err(SearchError::Config("normalizer.keyword_scale must be a positive finite number".into()));
        }

        if self.embedding.provider == "ngram" && self.embedding.ngram_dimension == 0 {
            return Err(SearchError::Config("embedding.ngram_dimension must be greater than 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, None);
        assert_eq!(config.index.bundle_path, "data/keyword_index.json");
        assert_eq!(config.embedding.provider, "local");
        assert_eq!(config.search.default_top_k, 20);
        assert_eq!(config.search.rrf_k, 60);
        assert_eq!(config.search.candidate_multiplier, 2);
        assert_eq!(config.search.summary_max_chars, 100);
        assert_eq!(config.search.sentence_terminator, '。');
        assert_eq!(config.search.default_fusion, FusionMethod::Rrf);
        assert_eq!(config.fusion.vector_weight, 0.5);
        assert_eq!(config.normalizer.keyword_offset, 2.0);
        assert_eq!(config.normalizer.keyword_scale, 4.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut config = Config::default();
        config.fusion.vector_weight = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_weight_sum() {
        let mut config = Config::default();
        config.fusion.vector_weight = 0.0;
        config.fusion.keyword_weight = 0.0;
        assert!(config.validate().is_err());

        config.fusion.keyword_weight = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let mut config = Config::default();
        config.normalizer.keyword_scale = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_default_top_k() {
        let mut config = Config::default();
        config.search.default_top_k = 0;
        assert!(config.validate().is_err());
        config.search.default_top_k = 500;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                log_level = "debug"
                [search]
                rrf_k = 30
                default_fusion = "simple"
                [embedding]
                provider = "ngram"
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.search.rrf_k, 30);
        assert_eq!(config.search.default_fusion, FusionMethod::Simple);
        assert_eq!(config.search.default_top_k, 20);
        assert_eq!(config.embedding.provider, "ngram");
    }
}
