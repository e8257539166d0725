use crate::models::chat::ChatMessage;
use crate::models::intent::TeachingIntent;
use crate::normalize::truncate_chars;
use serde_json::{ json, Value };

/// System prompt for the intent-extraction conversation.
pub const INTENT_SYSTEM_PROMPT: &str =
    "You are a professional teaching analyst. Analyze the user's input \
     precisely, determine the teaching intent, and output the analysis as JSON.";

/// Persona for the ad-hoc chat endpoint.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a professional teaching assistant.";

const SLIDE_SYSTEM_PROMPT: &str = "You are an excellent courseware designer. Based on the \
teaching intent and the retrieved material, design the content of every slide.\n\
Output format:\n\
[\n  {\n    \"page_number\": 1,\n    \"title\": \"Title\",\n    \"content\": [\"point 1\", \"point 2\"],\n    \"suggested_image\": \"description of a suggested image\"\n  }\n]";

/// Maximum number of characters of uploaded-file text fed into the intent
/// prompt; anything beyond is dropped and an ellipsis marker appended.
pub const FILE_EXCERPT_CHARS: usize = 2000;

/// Maximum number of characters of retrieved material fed into the slide
/// prompt.
pub const MATERIAL_EXCERPT_CHARS: usize = 3000;

/// JSON schema the model must follow for intent extraction.
pub fn intent_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "goal": { "type": "string", "description": "The explicit teaching goal" },
            "key_points": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of core knowledge points"
            },
            "difficult_points": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Teaching difficulties"
            },
            "style": {
                "type": "string",
                "enum": ["illustrated", "rigorous-derivation", "interactive", "exercise-focused"],
                "description": "Courseware style"
            },
            "grade_level": {
                "type": "string",
                "enum": ["primary", "middle", "high", "university"],
                "description": "School stage"
            },
            "time_requirement": {
                "type": "integer",
                "description": "Expected lesson duration in minutes"
            }
        },
        "required": ["goal", "key_points", "style", "grade_level"]
    })
}

/// Builds the fixed two-message intent conversation. File content, when
/// present, contributes only its first 2,000 characters.
pub fn build_intent_messages(user_input: &str, file_content: Option<&str>) -> Vec<ChatMessage> {
    let mut content = user_input.to_string();
    if let Some(file_text) = file_content {
        content.push_str("\n\n[Summary of the uploaded file]:\n");
        content.push_str(&truncate_chars(file_text, FILE_EXCERPT_CHARS));
        content.push_str("...");
    }

    vec![ChatMessage::system(INTENT_SYSTEM_PROMPT), ChatMessage::user(content)]
}

/// Builds the slide-content conversation from a confirmed intent and the
/// retrieved reference material.
pub fn build_slide_messages(intent: &TeachingIntent, retrieved_content: &str) -> Vec<ChatMessage> {
    let intent_json =
        serde_json::to_string_pretty(intent).unwrap_or_else(|_| "{}".to_string());

    let user_content = format!(
        "Teaching intent:\n{}\n\nRetrieved reference material:\n{}\n\nDesign a complete \
         set of slides including a cover page, teaching goals, knowledge-point \
         explanations, worked examples and a summary.",
        intent_json,
        truncate_chars(retrieved_content, MATERIAL_EXCERPT_CHARS)
    );

    vec![ChatMessage::system(SLIDE_SYSTEM_PROMPT), ChatMessage::user(user_content)]
}
