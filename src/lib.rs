pub mod cli;
pub mod engine;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod server;

use cli::Args;
use engine::client::InferenceClient;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Runtime Base URL: {}", args.runtime_base_url);
    info!("Model: {}", args.model);
    info!("Engine Tier Override: {:?}", args.engine_tier);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let client = Arc::new(InferenceClient::initialize(&args).await);
    if !client.is_loaded() {
        info!("Model runtime unavailable, serving in degraded mode");
    }

    let server = Server::new(client, args);
    server.run().await?;

    Ok(())
}
