use crate::models::intent::{ GradeLevel, SlidePage, TeachingIntent, TeachingStyle };
use log::warn;

/// Goal string of the sentinel record substituted when intent JSON cannot be
/// parsed. Consumers key on this marker to detect the fallback.
pub const PARSE_FAILURE_GOAL: &str = "Intent parsing failed, please retry";

const RAW_OUTPUT_LIMIT: usize = 500;
const SENTINEL_TIME_REQUIREMENT: u32 = 45;

/// First `max_chars` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

enum FenceState {
    Outside,
    Inside,
    Done,
}

/// Collects the body of the first markdown code fence matching `tag`
/// (any fence when `tag` is None). An unterminated fence yields whatever
/// was collected, matching how models usually truncate mid-answer.
fn extract_fenced(raw: &str, tag: Option<&str>) -> Option<String> {
    let mut state = FenceState::Outside;
    let mut body = String::new();

    for line in raw.lines() {
        match state {
            FenceState::Outside => {
                if let Some(rest) = line.trim_start().strip_prefix("```") {
                    let opens = match tag {
                        Some(t) => rest.trim().eq_ignore_ascii_case(t),
                        None => true,
                    };
                    if opens {
                        state = FenceState::Inside;
                    }
                }
            }
            FenceState::Inside => {
                if line.trim_start().starts_with("```") {
                    state = FenceState::Done;
                } else {
                    body.push_str(line);
                    body.push('\n');
                }
            }
            FenceState::Done => break,
        }
    }

    match state {
        FenceState::Outside => None,
        _ => Some(body.trim().to_string()),
    }
}

/// Strips an optional code fence around a JSON payload: a fence tagged
/// `json` wins, then any fence, otherwise the trimmed input.
pub fn strip_code_fence(raw: &str) -> String {
    extract_fenced(raw, Some("json"))
        .or_else(|| extract_fenced(raw, None))
        .unwrap_or_else(|| raw.trim().to_string())
}

fn sentinel_intent(raw: &str) -> TeachingIntent {
    TeachingIntent {
        goal: PARSE_FAILURE_GOAL.to_string(),
        key_points: Vec::new(),
        difficult_points: Vec::new(),
        style: TeachingStyle::Illustrated,
        grade_level: GradeLevel::Middle,
        time_requirement: Some(SENTINEL_TIME_REQUIREMENT),
        raw_output: Some(truncate_chars(raw, RAW_OUTPUT_LIMIT)),
    }
}

/// Extracts a `TeachingIntent` from raw model text. Parse failure substitutes
/// the sentinel record instead of propagating.
pub fn parse_intent(raw: &str) -> TeachingIntent {
    let payload = strip_code_fence(raw);
    match serde_json::from_str::<TeachingIntent>(&payload) {
        Ok(intent) => intent,
        Err(e) => {
            warn!("intent JSON parsing failed: {}", e);
            sentinel_intent(raw)
        }
    }
}

/// Extracts a slide-page array from raw model text; None when unparseable.
pub fn parse_slides(raw: &str) -> Option<Vec<SlidePage>> {
    let payload = strip_code_fence(raw);
    match serde_json::from_str::<Vec<SlidePage>>(&payload) {
        Ok(slides) => Some(slides),
        Err(e) => {
            warn!("slide JSON parsing failed: {}", e);
            None
        }
    }
}
