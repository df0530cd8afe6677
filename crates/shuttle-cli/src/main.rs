use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shuttle_core::{ChatMessage, ChatRequest, ChatService, ProviderEnv};
use shuttle_gateway::GatewayServer;

mod config;

use config::Settings;

#[derive(Parser)]
#[command(name = "shuttle")]
#[command(version)]
#[command(about = "Shuttle: provider-agnostic chat gateway")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// File holding the system prompt
        #[arg(long)]
        system_prompt_file: Option<PathBuf>,
    },

    /// Send a one-shot message and print the reply
    Ask {
        /// The message to send
        message: String,

        /// Provider for this request only
        #[arg(short, long)]
        provider: Option<String>,

        /// File holding the system prompt
        #[arg(long)]
        system_prompt_file: Option<PathBuf>,
    },

    /// List providers and whether they are configured
    Providers,

    /// Show resolved configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the process environment still applies
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Serve {
            bind,
            system_prompt_file,
        } => cmd_serve(bind, system_prompt_file).await,
        Commands::Ask {
            message,
            provider,
            system_prompt_file,
        } => cmd_ask(&message, provider, system_prompt_file).await,
        Commands::Providers => cmd_providers(),
        Commands::Config => cmd_config(),
    }
}

fn build_service(system_prompt_file: Option<PathBuf>) -> Result<ChatService> {
    let prompt = config::load_system_prompt(system_prompt_file.as_deref())?;
    Ok(ChatService::from_env(ProviderEnv::from_process()).with_system_prompt(prompt))
}

async fn cmd_serve(bind: SocketAddr, system_prompt_file: Option<PathBuf>) -> Result<()> {
    let service = Arc::new(build_service(system_prompt_file)?);
    info!(
        "Starting Shuttle gateway (provider: {})",
        service.resolver().current_provider()
    );

    let cancel = CancellationToken::new();
    let mut server = GatewayServer::new(bind, service).spawn(cancel.clone());

    println!("Shuttle is listening on http://{}. Press Ctrl+C to stop.", bind);

    tokio::select! {
        result = &mut server => {
            // Server exited on its own, e.g. the address was taken
            return result.context("Gateway task panicked")?;
        }
        signal = signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, shutting down...");
        }
    }

    cancel.cancel();
    server.await.context("Gateway task panicked")??;

    println!("Shuttle stopped.");
    Ok(())
}

async fn cmd_ask(
    message: &str,
    provider: Option<String>,
    system_prompt_file: Option<PathBuf>,
) -> Result<()> {
    let service = build_service(system_prompt_file)?;
    let reply = service
        .chat(ChatRequest {
            messages: vec![ChatMessage::user(message)],
            provider,
        })
        .await?;

    println!("{}", reply.reply);
    if let Some(structured) = reply.structured {
        println!("\nStructured:\n{}", serde_json::to_string_pretty(&structured)?);
    }
    Ok(())
}

fn cmd_providers() -> Result<()> {
    let service = ChatService::from_env(ProviderEnv::from_process());
    let active = service.resolver().current_provider();

    for status in service.providers() {
        let marker = if status.name == active { "*" } else { " " };
        let state = if status.configured {
            "configured"
        } else {
            "not configured"
        };
        println!(
            "{} {:<12} {:<16} {}",
            marker,
            status.name,
            state,
            status.model.unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let settings = Settings::resolve(&ProviderEnv::from_process());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
