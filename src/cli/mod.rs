use crate::engine::EngineTier;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Address the HTTP API binds to
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8000")]
    pub server_addr: String,

    /// Enable TLS for the HTTP API
    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Path to the PEM certificate used when TLS is enabled
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Path to the PEM private key used when TLS is enabled
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    // --- Model Runtime Args ---
    /// Base URL of the OpenAI-compatible model-serving runtime
    #[arg(long, env = "RUNTIME_BASE_URL", default_value = "http://127.0.0.1:8001")]
    pub runtime_base_url: String,

    /// API key for the model-serving runtime, if it requires one
    #[arg(long, env = "RUNTIME_API_KEY")]
    pub runtime_api_key: Option<String>,

    /// Model name requested from the serving runtime
    #[arg(long, env = "MODEL_NAME", default_value = "Qwen2.5-7B-Instruct")]
    pub model: String,

    /// Force an engine tier (low, medium, high) instead of probing
    /// accelerator memory
    #[arg(long, env = "ENGINE_TIER")]
    pub engine_tier: Option<EngineTier>,
}
