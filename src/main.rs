mod cli;
mod engine;
mod extract;
mod models;
mod normalize;
mod prompt;
mod server;

use clap::Parser;
use cli::Args;
use dotenv::dotenv;
use engine::client::InferenceClient;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Runtime Base URL: {}", args.runtime_base_url);
    info!("Model: {}", args.model);
    info!("Engine Tier Override: {:?}", args.engine_tier);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    info!("Initializing inference client...");
    let client = Arc::new(InferenceClient::initialize(&args).await);
    if client.is_loaded() {
        info!("Model runtime ready (tier: {})", client.config().tier);
    } else {
        info!("Model runtime unavailable, serving in degraded mode");
    }

    let server = Server::new(client, args);
    server.run().await?;

    Ok(())
}
