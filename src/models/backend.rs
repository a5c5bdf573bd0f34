use serde::{ Deserialize, Deserializer, Serialize };
use serde_json::Value as JsonValue;

use super::chat::Role;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AskRequest {
    pub question: String,
    pub top_k: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conversation_history: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RelevantImage {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub position: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VideoClip {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub start_seconds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub end_seconds: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub detail: Option<JsonValue>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub relevant_images: Vec<RelevantImage>,
    #[serde(default)]
    pub answer_video_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub answer_start_seconds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub answer_end_seconds: Option<f64>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub video_context: Vec<VideoClip>,
}

impl AskResponse {
    /// Human readable failure reason. FastAPI validation errors put a list in
    /// `detail`, so anything that is not a string is rendered as JSON.
    pub fn failure_detail(&self) -> Option<String> {
        match &self.detail {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) if s.is_empty() => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where D: Deserializer<'de>, T: Deserialize<'de>
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn number_from(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Accepts numbers and numeric strings; anything else becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where D: Deserializer<'de>
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from).filter(|v| v.is_finite()))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where D: Deserializer<'de>
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(
        value
            .as_ref()
            .and_then(number_from)
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    )
}
