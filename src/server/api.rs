use crate::cli::Args;
use crate::engine::client::{ GenerateOutcome, InferenceClient };
use crate::extract;
use crate::models::chat::ChatMessage;
use crate::models::intent::{ SlidePage, TeachingIntent };
use crate::normalize;
use crate::prompt;
use axum::{
    extract::{ DefaultBodyLimit, Multipart, State },
    response::IntoResponse,
    routing::{ get, post },
    Json,
    Router,
};
use log::{ error, info };
use serde::{ Deserialize, Serialize };
use std::error::Error;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };

pub const SERVICE_NAME: &str = "Lectern Teaching NLP Service";

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const UPLOAD_CONTENT_CHARS: usize = 10_000;
const UPLOAD_TRUNCATION_MARKER: &str = "\n...[Content too long, truncated]...";

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<InferenceClient>,
}

#[derive(Deserialize)]
pub struct IntentRequest {
    pub text: String,
    #[serde(default)]
    pub file_content: Option<String>,
}

#[derive(Serialize)]
struct IntentResponse {
    success: bool,
    intent: Option<TeachingIntent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct SlideRequest {
    pub intent: TeachingIntent,
    pub retrieved_content: String,
}

#[derive(Serialize)]
struct SlideResponse {
    success: bool,
    slides: Option<Vec<SlidePage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/extract_intent", post(extract_intent_handler))
        .route("/upload_file", post(upload_file_handler))
        .route("/chat", post(chat_handler))
        .route("/generate_slides", post(generate_slides_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    args: &Args,
    client: Arc<InferenceClient>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.server_addr.parse::<SocketAddr>()?;
    let app = build_router(AppState { client });

    if args.enable_tls && args.tls_cert_path.is_some() && args.tls_key_path.is_some() {
        let cert_path = args.tls_cert_path.as_ref().unwrap();
        let key_path = args.tls_key_path.as_ref().unwrap();

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS API server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        info!("Starting HTTP API server on: http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
    }

    Ok(())
}

async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "running",
        "service": SERVICE_NAME,
        "model": state.client.model_name(),
    }))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "model_loaded": state.client.is_loaded(),
    }))
}

async fn extract_intent_handler(
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>
) -> impl IntoResponse {
    let messages = prompt::build_intent_messages(&req.text, req.file_content.as_deref());
    let schema = prompt::intent_schema();

    match state.client.generate(&messages, Some(&schema)).await {
        GenerateOutcome::Generated(text) | GenerateOutcome::Degraded(text) => {
            // A sentinel intent still reports overall success; only the
            // record's diagnostic goal marks it as a fallback.
            Json(IntentResponse {
                success: true,
                intent: Some(normalize::parse_intent(&text)),
                model_used: Some(state.client.model_name().to_string()),
                error: None,
            })
        }
        GenerateOutcome::Failed(reason) => Json(IntentResponse {
            success: false,
            intent: None,
            model_used: None,
            error: Some(reason),
        }),
    }
}

async fn upload_file_handler(mut multipart: Multipart) -> impl IntoResponse {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return Json(upload_error("unknown", "No file uploaded")),
        Err(e) => return Json(upload_error("unknown", &format!("Failed to read multipart: {}", e))),
    };

    let filename = field.file_name().unwrap_or("unknown").to_string();
    let extension = extract::file_extension(&filename);

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(e) => {
            return Json(upload_error(&filename, &format!("Failed to read file: {}", e)));
        }
    };
    info!("Upload received: {} ({} bytes)", filename, data.len());

    let content = if extract::is_supported(&extension) {
        match extract_from_upload(&data, &extension).await {
            Ok(Ok(text)) => text,
            // Extraction failure is embedded as diagnostic text, the
            // documented best-effort contract of this endpoint.
            Ok(Err(e)) => e.to_string(),
            Err(e) => return Json(upload_error(&filename, &e)),
        }
    } else {
        format!("Unsupported file format: {}", extension)
    };

    let (content, content_length) = truncate_upload(content);

    Json(UploadResponse {
        success: true,
        filename,
        file_type: Some(extension),
        content: Some(content),
        content_length: Some(content_length),
        error: None,
    })
}

/// Writes the upload to a suffixed temp file and runs the blocking parsers
/// off the async runtime. The temp file is removed when the task finishes,
/// whatever the outcome.
async fn extract_from_upload(
    data: &[u8],
    extension: &str
) -> Result<Result<String, extract::ExtractError>, String> {
    let mut tmp = tempfile::Builder
        ::new()
        .suffix(extension)
        .tempfile()
        .map_err(|e| format!("Failed to create temp file: {}", e))?;
    tmp.write_all(data).map_err(|e| format!("Failed to write temp file: {}", e))?;

    let extension = extension.to_string();
    tokio::task
        ::spawn_blocking(move || {
            let result = extract::extract(tmp.path(), &extension);
            drop(tmp);
            result
        }).await
        .map_err(|e| format!("Extraction task failed: {}", e))
}

fn truncate_upload(content: String) -> (String, usize) {
    if content.chars().count() > UPLOAD_CONTENT_CHARS {
        let mut truncated = normalize::truncate_chars(&content, UPLOAD_CONTENT_CHARS);
        truncated.push_str(UPLOAD_TRUNCATION_MARKER);
        let length = truncated.chars().count();
        (truncated, length)
    } else {
        let length = content.chars().count();
        (content, length)
    }
}

fn upload_error(filename: &str, message: &str) -> UploadResponse {
    error!("Upload failed for {}: {}", filename, message);
    UploadResponse {
        success: false,
        filename: filename.to_string(),
        file_type: None,
        content: None,
        content_length: None,
        error: Some(message.to_string()),
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>
) -> impl IntoResponse {
    let messages = vec![
        ChatMessage::system(prompt::CHAT_SYSTEM_PROMPT),
        ChatMessage::user(req.message)
    ];

    match state.client.generate(&messages, None).await {
        GenerateOutcome::Generated(text) | GenerateOutcome::Degraded(text) => Json(ChatResponse {
            success: true,
            response: Some(text),
            model: Some(state.client.model_name().to_string()),
            error: None,
        }),
        GenerateOutcome::Failed(reason) => Json(ChatResponse {
            success: false,
            response: None,
            model: None,
            error: Some(reason),
        }),
    }
}

async fn generate_slides_handler(
    State(state): State<AppState>,
    Json(req): Json<SlideRequest>
) -> impl IntoResponse {
    let messages = prompt::build_slide_messages(&req.intent, &req.retrieved_content);

    match state.client.generate(&messages, None).await {
        GenerateOutcome::Generated(text) | GenerateOutcome::Degraded(text) => {
            match normalize::parse_slides(&text) {
                Some(slides) => Json(SlideResponse {
                    success: true,
                    slides: Some(slides),
                    raw_output: None,
                    model_used: Some(state.client.model_name().to_string()),
                    error: None,
                }),
                None => Json(SlideResponse {
                    success: true,
                    slides: None,
                    raw_output: Some(text),
                    model_used: Some(state.client.model_name().to_string()),
                    error: None,
                }),
            }
        }
        GenerateOutcome::Failed(reason) => Json(SlideResponse {
            success: false,
            slides: None,
            raw_output: None,
            model_used: None,
            error: Some(reason),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_truncation_appends_marker_and_reports_new_length() {
        let long = "b".repeat(UPLOAD_CONTENT_CHARS + 1);
        let (content, length) = truncate_upload(long);
        assert!(content.ends_with(UPLOAD_TRUNCATION_MARKER));
        assert_eq!(
            length,
            UPLOAD_CONTENT_CHARS + UPLOAD_TRUNCATION_MARKER.chars().count()
        );
        assert_eq!(content.chars().count(), length);
    }

    #[test]
    fn short_upload_is_untouched() {
        let (content, length) = truncate_upload("short".to_string());
        assert_eq!(content, "short");
        assert_eq!(length, 5);
    }
}
