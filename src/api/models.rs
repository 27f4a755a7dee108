use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Accepted keys for a profile identifier, in lookup order.
pub const PROFILE_ID_KEYS: &[&str] = &["id", "profile_id", "slug", "key"];
/// Accepted keys for a profile display name, in lookup order.
pub const PROFILE_NAME_KEYS: &[&str] = &["name", "title", "label"];
/// Keys that may hold the profile array when the payload is an object.
pub const PROFILE_LIST_KEYS: &[&str] = &["profiles", "items"];
/// Keys that may hold the message text of a history entry.
pub const MESSAGE_TEXT_KEYS: &[&str] = &["message", "content", "text"];
/// Keys that may hold the message array of a send or history response.
pub const MESSAGE_LIST_KEYS: &[&str] = &["message", "messages"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
}

impl Profile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Resolve a raw server entry. Returns `None` when no id can be found.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let id = first_str(raw, PROFILE_ID_KEYS)?;
        let display_name = first_str(raw, PROFILE_NAME_KEYS).unwrap_or_else(|| id.clone());
        Some(Self::new(id, display_name))
    }

    /// Profiles offered when the profile service cannot be reached.
    pub fn fallback() -> Vec<Profile> {
        vec![
            Profile::new("general", "General"),
            Profile::new("rude_arrogant", "Rude & Arrogant"),
        ]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Anything that is not `user` is treated as the assistant side.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    /// Normalize one history entry. Non-object entries are rejected.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        if !raw.is_object() {
            return None;
        }
        let role = raw
            .get("role")
            .and_then(|v| v.as_str())
            .map(Role::from_raw)
            .unwrap_or(Role::Assistant);
        let text = MESSAGE_TEXT_KEYS
            .iter()
            .filter_map(|k| raw.get(*k))
            .find_map(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Some(Self { role, text })
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub conversation_id: String,
    /// Message batch returned alongside the id. Reconciliation reads
    /// history instead, so this is informational.
    pub seed: Vec<ChatMessage>,
}

/// First non-empty string or number under `keys`; numbers are stringified.
fn first_str(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .find(|s| !s.is_empty())
}

fn array_field<'a>(json: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(arr) = json.as_array() {
        return arr;
    }
    keys.iter()
        .filter_map(|k| json.get(*k))
        .find_map(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Normalize a profile list payload: a bare array or `{profiles|items: [...]}`.
pub fn profiles_from_payload(json: &Value) -> Vec<Profile> {
    array_field(json, PROFILE_LIST_KEYS)
        .iter()
        .filter_map(Profile::from_raw)
        .collect()
}

/// Normalize a message list payload: a bare array or `{message|messages: [...]}`.
pub fn messages_from_payload(json: &Value) -> Vec<ChatMessage> {
    array_field(json, MESSAGE_LIST_KEYS)
        .iter()
        .filter_map(ChatMessage::from_raw)
        .collect()
}

/// Conversation id of a send response, if the server included one.
pub fn conversation_id_from_payload(json: &Value) -> Option<String> {
    first_str(json, &["conversation_id", "conversationId"])
}
