//! Curator - hierarchy and state management for a digital library.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator::{
    api::{self, ApiState},
    ServiceConfig,
};

/// Hierarchy and state management for a digital library.
#[derive(Parser)]
#[command(name = "curator", about = "Hierarchy and state management for a digital library")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API daemon.
    Daemon {
        /// Address to bind the API server.
        #[arg(long, default_value = "0.0.0.0:9292", env = "CURATOR_BIND")]
        bind: String,

        /// Base URL of the repository object store.
        #[arg(long, env = "CURATOR_STORE_URL", default_value = "http://localhost:8088")]
        store_url: String,

        /// Base URL of the search index.
        #[arg(long, env = "CURATOR_INDEX_URL", default_value = "http://localhost:8983/solr")]
        index_url: String,

        /// Index core holding object documents.
        #[arg(long, env = "CURATOR_INDEX_CORE", default_value = "objects")]
        index_core: String,
    },

    /// Show service status.
    Status {
        /// Curator API URL.
        #[arg(long, env = "CURATOR_API_URL", default_value = "http://localhost:9292")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            bind,
            store_url,
            index_url,
            index_core,
        } => {
            run_daemon(&bind, ServiceConfig::new(store_url, index_url, index_core)).await?;
        }

        Commands::Status { api_url } => {
            show_status(&api_url).await?;
        }
    }

    Ok(())
}

/// Run the API daemon.
async fn run_daemon(bind: &str, config: ServiceConfig) -> Result<()> {
    tracing::info!(
        store_url = %config.store_url,
        index_url = %config.index_url,
        index_core = %config.index_core,
        "Starting Curator daemon..."
    );

    let state = Arc::new(ApiState::new(&config));

    api::serve(state, bind).await?;

    Ok(())
}

/// Show service status via API.
async fn show_status(api_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/status", api_url);

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to get status: {}", response.status());
    }

    let status: serde_json::Value = response.json().await?;

    println!("Curator Status");
    println!("==============");
    println!("Status:     {}", status["status"]);
    println!("Index core: {}", status["index_core"]);

    Ok(())
}
