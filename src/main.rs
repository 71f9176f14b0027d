use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use forumsearch::config::Config;
use forumsearch::context::SearchContext;
use forumsearch::document::SearchRequest;
use forumsearch::logging;
use forumsearch::server::SearchService;
use rmcp::ServiceExt;

#[derive(Parser)]
#[command(name = "forumsearch", version, about = "Hybrid vector + keyword search over forum posts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server over stdio (default)
    Serve,
    /// Run one search and print the response as JSON
    Search {
        /// Natural language query
        query: String,
        /// Number of results (default: search.default_top_k)
        #[arg(long)]
        top_k: Option<usize>,
        /// Fusion policy: rrf, weighted or simple
        #[arg(long)]
        fusion: Option<String>,
    },
    /// Print index statistics as JSON
    Stats,
    /// Load configuration and both indices, then exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse CLI args
    let cli = Cli::parse();

    // 2. Load configuration; an invalid configuration is fatal
    let config = Config::load()?;

    // 3. Initialize logging FIRST (before any other output)
    // CRITICAL: logging goes to stderr only; stdout is reserved for JSON-RPC and CLI output
    let _log_guard = logging::init_logging(&config);

    // 4. Build the search context; refuse to continue without both indices
    let context = match SearchContext::initialize(&config).await {
        Ok(context) => Arc::new(context),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize search context");
            return Err(e.into());
        }
    };

    // 5. Handle subcommands
    match cli.command {
        Some(Commands::Search { query, top_k, fusion }) => {
            let request = SearchRequest {
                query,
                top_k,
                fusion_method: fusion,
            };
            let response = context.search(&request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Some(Commands::Stats) => {
            println!("{}", serde_json::to_string_pretty(context.stats())?);
        }

        Some(Commands::Check) => {
            let stats = context.stats();
            println!(
                "OK: {} vector documents, {} keyword documents, model '{}'",
                stats.vector_documents, stats.keyword_documents, stats.embedding_model
            );
        }

        Some(Commands::Serve) | None => {
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                "forumsearch server starting"
            );

            let service = SearchService::new(context);

            // Serve via stdio transport
            let (stdin, stdout) = rmcp::transport::io::stdio();
            let server = service.serve((stdin, stdout)).await?;

            tracing::info!("forumsearch server running, awaiting tool calls via stdio");

            // Wait for shutdown (client disconnects or signal)
            server.waiting().await?;

            tracing::info!("forumsearch server stopped");
        }
    }

    Ok(())
}
