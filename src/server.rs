use rmcp::{
    ServerHandler,
    tool,
    model::{ServerCapabilities, Implementation, ProtocolVersion, CallToolResult},
    handler::server::wrapper::Parameters,
    ErrorData as McpError,
};
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use serde_json::json;
use std::sync::Arc;

use crate::context::SearchContext;
use crate::document::SearchRequest;
use crate::errors::SearchError;

pub struct SearchService {
    context: Arc<SearchContext>,
}

impl SearchService {
    pub fn new(context: Arc<SearchContext>) -> Self {
        Self { context }
    }
}

// Parameter structs

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchPostsParams {
    /// Natural language search query (required)
    pub query: String,
    /// Maximum number of results to return (default: search.default_top_k, 20)
    pub top_k: Option<usize>,
    /// Fusion policy: "rrf", "weighted" or "simple" (default: "rrf")
    pub fusion_method: Option<String>,
}

// Helper: convert SearchError to CallToolResult with isError: true
fn search_error_to_result(err: SearchError) -> CallToolResult {
    match err {
        SearchError::Validation { message, field } => {
            let mut obj = json!({
                "isError": true,
                "error": message,
            });
            if let Some(f) = field {
                obj["field"] = json!(f);
            }
            CallToolResult::structured_error(obj)
        }
        SearchError::Timeout { elapsed_ms } => {
            CallToolResult::structured_error(json!({
                "isError": true,
                "error": format!("Search timed out after {} ms", elapsed_ms),
                "hint": "Retry, or lower top_k"
            }))
        }
        other => {
            CallToolResult::structured_error(json!({
                "isError": true,
                "error": other.to_string()
            }))
        }
    }
}

// Tool implementations
#[rmcp::tool_router]
impl SearchService {
    #[tool(description = "Search forum posts with hybrid semantic + keyword retrieval. Returns ranked posts with summaries.")]
    async fn search_posts(
        &self,
        Parameters(params): Parameters<SearchPostsParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            tool = "search_posts",
            query = %params.query,
            top_k = ?params.top_k,
            fusion_method = ?params.fusion_method,
            "Tool called"
        );

        let request = SearchRequest {
            query: params.query,
            top_k: params.top_k,
            fusion_method: params.fusion_method,
        };

        match self.context.search(&request).await {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(value) => Ok(CallToolResult::structured(value)),
                Err(e) => Ok(search_error_to_result(SearchError::Internal(e.to_string()))),
            },
            Err(e) => Ok(search_error_to_result(e)),
        }
    }

    #[tool(description = "Check server health. Returns status, version, uptime and whether both indices are loaded.")]
    async fn health_check(
        &self,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = "health_check", "Tool called");

        let response = json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": self.context.uptime_seconds(),
            "backends_loaded": self.context.backends_loaded(),
        });

        Ok(CallToolResult::structured(response))
    }

    #[tool(description = "Report index statistics: vector and keyword document counts and the embedding model in use.")]
    async fn index_stats(
        &self,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = "index_stats", "Tool called");

        let stats = self.context.stats();
        Ok(CallToolResult::structured(json!({
            "vector_documents": stats.vector_documents,
            "keyword_documents": stats.keyword_documents,
            "embedding_model": stats.embedding_model,
        })))
    }
}

#[rmcp::tool_handler(router = Self::tool_router())]
impl ServerHandler for SearchService {
    fn get_info(&self) -> rmcp::model::InitializeResult {
        rmcp::model::InitializeResult {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "forumsearch".to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some("Hybrid vector + BM25 search over forum posts".to_string()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Forum post search server. Tools: search_posts (query, top_k, fusion_method), health_check, index_stats.".to_string()
            ),
        }
    }
}
