use super::{ EngineConfig, SamplingParams };
use async_trait::async_trait;
use log::info;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;

/// Seam to the model-serving runtime. One blocking completion call per
/// request; the runtime owns any internal batching.
#[async_trait]
pub trait CompletionRuntime: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        params: &SamplingParams
    ) -> Result<String, Box<dyn StdError + Send + Sync>>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stop: &'a [String],
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

/// Client for a vLLM-style OpenAI-compatible completions server.
pub struct VllmRuntime {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl VllmRuntime {
    /// Verifies the serving runtime is reachable before handing the client
    /// out; an unreachable runtime puts the service in degraded mode.
    pub async fn connect(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        config: &EngineConfig
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let runtime = Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|k| k.to_string()),
            model: model.to_string(),
        };

        let url = format!("{}/v1/models", runtime.base_url);
        let mut req = runtime.http.get(&url);
        if let Some(key) = &runtime.api_key {
            req = req.bearer_auth(key);
        }
        req.send().await?.error_for_status()?;

        info!(
            "Model runtime reachable at {} (model={}, tier={}, quantization={:?}, dtype={}, max_model_len={}, mem_util={})",
            runtime.base_url,
            runtime.model,
            config.tier,
            config.quantization,
            config.dtype,
            config.max_model_len,
            config.gpu_memory_utilization
        );
        Ok(runtime)
    }
}

#[async_trait]
impl CompletionRuntime for VllmRuntime {
    async fn complete(
        &self,
        prompt: &str,
        params: &SamplingParams
    ) -> Result<String, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/v1/completions", self.base_url);
        let req = CompletionRequest {
            model: &self.model,
            prompt,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stop: &params.stop,
        };

        let mut request = self.http.post(&url).json(&req);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?.error_for_status()?;
        let data = resp.json::<CompletionResponse>().await?;
        let text = data
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or("completion response contained no choices")?;
        Ok(text)
    }
}
