//! Book Catalog - Main Server
//!
//! Serves the catalog API and its change-notification stream, or watches a
//! running server's stream from the terminal.

use anyhow::Result;
use book_catalog::notifications::{NotificationClient, NotificationFeed, ReconnectPolicy};
use book_catalog::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "book-catalog")]
#[command(about = "Book catalog with real-time change notifications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the catalog server
    Serve {
        /// Port to listen on (overrides config.yaml and env)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the YAML config file
        #[arg(short, long, env = "CONFIG_PATH")]
        config: Option<PathBuf>,
    },

    /// Print book notifications from a running server
    Watch {
        /// WebSocket endpoint to subscribe to
        #[arg(short, long, default_value = "ws://127.0.0.1:3000/ws/events")]
        url: String,

        /// Consecutive failed connection attempts before giving up
        #[arg(long, default_value = "5")]
        max_attempts: u32,

        /// Delay between connection attempts, in milliseconds
        #[arg(long, default_value = "1000")]
        retry_delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,book_catalog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let mut config = Config::from_yaml_and_env(config.as_deref())?;
            if let Some(port) = port {
                config.server_port = port;
            }
            book_catalog::start_server(config).await
        }
        Commands::Watch {
            url,
            max_attempts,
            retry_delay_ms,
        } => {
            let policy = ReconnectPolicy {
                max_attempts,
                delay: Duration::from_millis(retry_delay_ms),
            };
            run_watch(NotificationClient::new(url).with_policy(policy)).await
        }
    }
}

async fn run_watch(client: NotificationClient) -> Result<()> {
    let mut feed = NotificationFeed::new();
    tracing::info!("Watching {}", client.url());

    tokio::select! {
        result = client.run(&mut feed, |notification| println!("{}", notification)) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Stopped");
            Ok(())
        }
    }?;

    tracing::info!("{} notifications received", feed.len());
    Ok(())
}
