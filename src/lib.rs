pub mod agent;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod render;
pub mod server;
pub mod session;
pub mod stream;

use agent::ChatAgent;
use cli::Args;
use config::ChatSettings;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let settings = ChatSettings::from(&args);

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Backend URL: {}", settings.backend_url);
    info!("Top K: {}", settings.top_k);
    info!("Request Timeout: {:?}", settings.request_timeout);
    info!("Content Prefix: {}", settings.content_prefix);
    info!("History Window: {} messages", settings.history_max_messages);
    info!(
        "Streaming: {} chars every {:?}, thinking hint after {:?}",
        settings.chars_per_tick,
        settings.tick_interval,
        settings.thinking_delay
    );
    info!("-------------------------");

    let agent = Arc::new(ChatAgent::new(settings)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent);
    server.run().await?;

    Ok(())
}
