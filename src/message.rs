// src/message.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub guest_context: Option<GuestContext>,
}

/// Profile details the front desk may know about the guest.
///
/// Every field is free text. Callers sometimes send numbers or lists (room
/// numbers, preference arrays), so any JSON value is accepted and kept as its
/// text form. Unknown keys are ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct GuestContext {
    #[serde(default, deserialize_with = "free_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "free_text")]
    pub room: Option<String>,
    #[serde(default, deserialize_with = "free_text")]
    pub preferences: Option<String>,
    #[serde(default, deserialize_with = "free_text")]
    pub previous_interactions: Option<String>,
}

impl GuestContext {
    /// `{}` or all-null fields carry nothing worth putting in a prompt.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.room.is_none()
            && self.preferences.is_none()
            && self.previous_interactions.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

fn free_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
