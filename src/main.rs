use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::error;

use event_importer::config::Config;
use event_importer::pipeline::ImportCoordinator;
use event_importer::storage::{EventStore, InMemoryEventStore};
use event_importer::types::ImportRequest;
use event_importer::{logging, server};

#[derive(Parser)]
#[command(name = "event_importer")]
#[command(about = "Event import and AI enrichment pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a single event by URL
    Import {
        /// Event page URL (Luma, Eventbrite, Humanitix, or Partiful)
        url: String,
        /// Overwrite an already-imported event in place
        #[arg(long)]
        force_update: bool,
        /// Return the basic record immediately and enrich in the background
        #[arg(long)]
        progressive: bool,
    },
    /// Run the HTTP import server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    let config = Config::from_env();
    let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
    let coordinator = Arc::new(ImportCoordinator::from_config(&config, store));

    match cli.command {
        Commands::Import {
            url,
            force_update,
            progressive,
        } => {
            println!("🔄 Importing event from {url}...");

            let request = ImportRequest { url, force_update };
            let result = if progressive {
                coordinator.import_progressive(request).await
            } else {
                coordinator.import_full(request).await
            };

            match result {
                Ok(outcome) => {
                    println!("✅ {}", outcome.message);
                    println!("{}", serde_json::to_string_pretty(&outcome.event)?);
                    if outcome.ai_processing {
                        println!("🤖 AI enrichment is running in the background");
                    }
                }
                Err(e) => {
                    error!("Import failed: {e}");
                    println!("❌ {}", e.user_message());
                }
            }
        }
        Commands::Serve { port } => {
            println!("🌐 Starting import server...");
            server::start_server(coordinator, port).await?;
        }
    }

    Ok(())
}
