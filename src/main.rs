use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use resto_search::{ApiServer, Config, HttpSearchBackend, SearchService};

#[derive(Parser)]
#[command(name = "resto-search")]
#[command(about = "Fuzzy ranking service for restaurant name search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "resto-search.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP search API
    Serve {
        /// Bind host override
        #[arg(long)]
        host: Option<String>,

        /// Bind port override
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a one-off raw text search against an index
    Search {
        /// Index name
        index: String,

        /// Raw query text
        query: String,

        /// Maximum candidates to retrieve
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("resto_search=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("resto_search=info")
            .init();
    }

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            serve(config, host, port).await?;
        }
        Commands::Search {
            index,
            query,
            limit,
        } => {
            run_search(config, index, query, limit).await?;
        }
    }

    Ok(())
}

fn build_service(config: &Config) -> Result<SearchService> {
    let backend = Arc::new(HttpSearchBackend::new(&config.backend)?);
    // Enrichment needs an external pastille store; the standalone binary
    // runs without one and returns hits unannotated.
    Ok(SearchService::new(config, backend, None))
}

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    info!("starting search API against {}", config.backend.url);
    let service = Arc::new(build_service(&config)?);
    let server = ApiServer::new(config.server.host.clone(), config.server.port, service);
    server.serve().await
}

async fn run_search(config: Config, index: String, query: String, limit: usize) -> Result<()> {
    let service = build_service(&config)?;

    let options = resto_search::SearchOptions {
        limit,
        ..Default::default()
    };
    let input = resto_search::QueryInput::Text(query);
    let response = service.search(&index, Some(&input), &options, None).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
