use super::runtime::{ CompletionRuntime, VllmRuntime };
use super::{ EngineConfig, SamplingParams };
use crate::cli::Args;
use crate::models::chat::{ ChatMessage, Role };
use log::{ error, info };
use serde_json::Value;
use std::sync::Arc;

/// Canned intent returned in degraded mode when a schema is requested.
pub const CANNED_INTENT_JSON: &str = r#"{"goal":"Understand the definition and proof of the Pythagorean theorem","key_points":["Definition of a right triangle","Pythagorean formula"],"difficult_points":["The concept of irrational numbers"],"style":"illustrated","grade_level":"middle","time_requirement":45}"#;

/// Canned reply returned in degraded mode for free-form generation.
pub const CANNED_TEXT: &str = "This is a placeholder reply; the actual model is not loaded.";

/// Result of one generation call. Callers branch on the variant instead of
/// inspecting the text shape.
#[derive(Clone, Debug)]
pub enum GenerateOutcome {
    /// A real completion from the serving runtime.
    Generated(String),
    /// Canned output produced because the runtime never loaded.
    Degraded(String),
    /// The runtime was loaded but the call failed.
    Failed(String),
}

/// Handle to the single shared model runtime, constructed once at startup and
/// passed to request handlers. `runtime: None` is the observable degraded
/// state, not an error.
pub struct InferenceClient {
    runtime: Option<Arc<dyn CompletionRuntime>>,
    config: EngineConfig,
    sampling: SamplingParams,
    model: String,
}

impl InferenceClient {
    /// Selects an engine tier, then connects to the serving runtime. Any
    /// connection failure enters degraded mode instead of propagating.
    pub async fn initialize(args: &Args) -> Self {
        let config = EngineConfig::detect(args.engine_tier);

        match VllmRuntime::connect(
            &args.runtime_base_url,
            args.runtime_api_key.as_deref(),
            &args.model,
            &config
        ).await {
            Ok(runtime) => Self::with_runtime(Arc::new(runtime), config, args.model.clone()),
            Err(e) => {
                error!("Model runtime loading failed: {}. Entering degraded mode.", e);
                Self::degraded(config, args.model.clone())
            }
        }
    }

    pub fn with_runtime(
        runtime: Arc<dyn CompletionRuntime>,
        config: EngineConfig,
        model: String
    ) -> Self {
        Self { runtime: Some(runtime), config, sampling: SamplingParams::default(), model }
    }

    pub fn degraded(config: EngineConfig, model: String) -> Self {
        Self { runtime: None, config, sampling: SamplingParams::default(), model }
    }

    pub fn is_loaded(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Renders the conversation and invokes the runtime with the fixed
    /// sampling parameters. With a schema, a strict-adherence instruction is
    /// appended to the first system message before rendering.
    pub async fn generate(
        &self,
        messages: &[ChatMessage],
        json_schema: Option<&Value>
    ) -> GenerateOutcome {
        let runtime = match &self.runtime {
            Some(runtime) => runtime,
            None => {
                info!("Degraded mode: returning canned output");
                let text = if json_schema.is_some() {
                    CANNED_INTENT_JSON.to_string()
                } else {
                    CANNED_TEXT.to_string()
                };
                return GenerateOutcome::Degraded(text);
            }
        };

        let messages = match json_schema {
            Some(schema) => inject_schema(messages, schema),
            None => messages.to_vec(),
        };
        let prompt = render_chat_prompt(&messages);

        match runtime.complete(&prompt, &self.sampling).await {
            Ok(text) => GenerateOutcome::Generated(text.trim().to_string()),
            Err(e) => {
                error!("Generation failed: {}", e);
                GenerateOutcome::Failed(format!("Generation failed: {}", e))
            }
        }
    }
}

/// Appends the schema instruction to the first system message. Later system
/// messages are left untouched.
fn inject_schema(messages: &[ChatMessage], schema: &Value) -> Vec<ChatMessage> {
    let mut messages = messages.to_vec();
    if let Some(system) = messages.iter_mut().find(|m| m.role == Role::System) {
        system.content.push_str(
            "\n\nYou must strictly adhere to the following JSON format in your output:\n"
        );
        system.content.push_str(&schema.to_string());
    }
    messages
}

/// Renders the conversation in the model's chat-turn format, closing with an
/// open assistant turn.
fn render_chat_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        prompt.push_str("<|im_start|>");
        prompt.push_str(&message.role.to_string());
        prompt.push('\n');
        prompt.push_str(&message.content);
        prompt.push_str("<|im_end|>\n");
    }
    prompt.push_str("<|im_start|>assistant\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineTier;
    use crate::models::intent::TeachingIntent;
    use async_trait::async_trait;
    use std::error::Error as StdError;

    struct EchoRuntime;

    #[async_trait]
    impl CompletionRuntime for EchoRuntime {
        async fn complete(
            &self,
            prompt: &str,
            _params: &SamplingParams
        ) -> Result<String, Box<dyn StdError + Send + Sync>> {
            Ok(format!("  {}  ", prompt))
        }
    }

    struct BrokenRuntime;

    #[async_trait]
    impl CompletionRuntime for BrokenRuntime {
        async fn complete(
            &self,
            _prompt: &str,
            _params: &SamplingParams
        ) -> Result<String, Box<dyn StdError + Send + Sync>> {
            Err("connection reset".into())
        }
    }

    fn client_with(runtime: Arc<dyn CompletionRuntime>) -> InferenceClient {
        InferenceClient::with_runtime(
            runtime,
            EngineConfig::for_tier(EngineTier::Low),
            "Qwen2.5-7B-Instruct".to_string()
        )
    }

    #[test]
    fn chat_prompt_frames_each_turn_and_opens_assistant() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hello")];
        let prompt = render_chat_prompt(&messages);
        assert_eq!(
            prompt,
            "<|im_start|>system\nbe brief<|im_end|>\n\
             <|im_start|>user\nhello<|im_end|>\n\
             <|im_start|>assistant\n"
        );
    }

    #[test]
    fn schema_lands_in_first_system_message_only() {
        let messages = vec![
            ChatMessage::system("first"),
            ChatMessage::user("hi"),
            ChatMessage::system("second")
        ];
        let schema = serde_json::json!({"type": "object"});
        let injected = inject_schema(&messages, &schema);
        assert!(injected[0].content.contains("strictly adhere"));
        assert!(injected[0].content.contains("\"type\":\"object\""));
        assert_eq!(injected[2].content, "second");
    }

    #[test]
    fn schema_injection_without_system_message_is_a_noop() {
        let messages = vec![ChatMessage::user("hi")];
        let schema = serde_json::json!({});
        let injected = inject_schema(&messages, &schema);
        assert_eq!(injected[0].content, "hi");
    }

    #[tokio::test]
    async fn degraded_client_returns_canned_intent_with_schema() {
        let client = InferenceClient::degraded(
            EngineConfig::for_tier(EngineTier::Low),
            "Qwen2.5-7B-Instruct".to_string()
        );
        assert!(!client.is_loaded());
        let schema = serde_json::json!({});
        match client.generate(&[ChatMessage::user("x")], Some(&schema)).await {
            GenerateOutcome::Degraded(text) => assert_eq!(text, CANNED_INTENT_JSON),
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn degraded_client_returns_canned_text_without_schema() {
        let client = InferenceClient::degraded(
            EngineConfig::for_tier(EngineTier::Low),
            "Qwen2.5-7B-Instruct".to_string()
        );
        match client.generate(&[ChatMessage::user("x")], None).await {
            GenerateOutcome::Degraded(text) => assert_eq!(text, CANNED_TEXT),
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[test]
    fn canned_intent_is_a_valid_record() {
        let intent: TeachingIntent = serde_json::from_str(CANNED_INTENT_JSON).unwrap();
        assert_eq!(intent.time_requirement, Some(45));
        assert_eq!(intent.key_points.len(), 2);
    }

    #[tokio::test]
    async fn generated_text_is_trimmed() {
        let client = client_with(Arc::new(EchoRuntime));
        match client.generate(&[ChatMessage::user("ping")], None).await {
            GenerateOutcome::Generated(text) => {
                assert!(text.starts_with("<|im_start|>user"));
                assert!(text.ends_with("<|im_start|>assistant"));
            }
            other => panic!("expected generated outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn runtime_error_becomes_failed_outcome() {
        let client = client_with(Arc::new(BrokenRuntime));
        match client.generate(&[ChatMessage::user("ping")], None).await {
            GenerateOutcome::Failed(reason) => assert!(reason.contains("connection reset")),
            other => panic!("expected failed outcome, got {:?}", other),
        }
    }
}
