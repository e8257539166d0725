use serde::{ Serialize, Deserialize };

/// Presentation style requested for the generated material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeachingStyle {
    Illustrated,
    RigorousDerivation,
    Interactive,
    ExerciseFocused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeLevel {
    Primary,
    Middle,
    High,
    University,
}

/// Structured summary of a requested lesson. A valid record always carries
/// goal, key_points, style and grade_level; `raw_output` is only populated on
/// the parse-failure sentinel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeachingIntent {
    pub goal: String,
    pub key_points: Vec<String>,
    #[serde(default)]
    pub difficult_points: Vec<String>,
    pub style: TeachingStyle,
    pub grade_level: GradeLevel,
    #[serde(default)]
    pub time_requirement: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

/// One slide of generated courseware content.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlidePage {
    pub page_number: u32,
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub suggested_image: Option<String>,
}
