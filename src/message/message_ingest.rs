//! Turns external response bodies into canonical `Message` and `Profile` values.
//!
//! All tolerance for envelope nesting and field-name variants lives here.
//! Anything past this module only sees the canonical types.

use crate::{
    error::{AppError, Result},
    message::message_models::Message,
    profile::Profile,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RawMessage {
    pub id: Uuid,
    #[serde(alias = "senderId")]
    pub sender_id: Uuid,
    #[serde(alias = "receiverId")]
    pub receiver_id: Uuid,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "readAt")]
    pub read_at: Option<DateTime<Utc>>,
    /// Legacy flag; folded into `read_at` and then dropped.
    #[serde(default, alias = "isRead")]
    pub is_read: Option<bool>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawMessage> for Message {
    type Error = AppError;

    fn try_from(raw: RawMessage) -> Result<Self> {
        if raw.sender_id == raw.receiver_id {
            return Err(AppError::InvalidInput(format!(
                "message {} has the same sender and receiver",
                raw.id
            )));
        }

        let read_at = raw.read_at.or_else(|| match raw.is_read {
            Some(true) => Some(raw.updated_at.unwrap_or(raw.created_at)),
            _ => None,
        });

        Ok(Message {
            id: raw.id,
            sender_id: raw.sender_id,
            receiver_id: raw.receiver_id,
            content: raw.content.unwrap_or_default(),
            created_at: raw.created_at,
            read_at,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawProfile {
    #[serde(alias = "user_id", alias = "userId")]
    pub id: Uuid,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "avatarUrl", alias = "avatar")]
    pub avatar_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<RawProfile> for Profile {
    fn from(raw: RawProfile) -> Self {
        Profile {
            id: raw.id,
            first_name: non_blank(raw.first_name),
            last_name: non_blank(raw.last_name),
            username: non_blank(raw.username),
            avatar_url: non_blank(raw.avatar_url),
        }
    }
}

/// Finds the record list inside a response body.
///
/// Accepted shapes: a bare array, `{"data": [..]}`, `{"data": {"data": [..]}}`,
/// and `{"<key>": [..]}` either at the top level or under `data`.
/// A `null` list is treated as empty.
pub fn extract_list(value: Value, key: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut map) => {
            if let Some(inner) = map.remove("data") {
                return match inner {
                    Value::Object(_) | Value::Array(_) | Value::Null => extract_list(inner, key),
                    other => Err(unexpected_shape(key, &other)),
                };
            }
            match map.remove(key) {
                Some(Value::Array(items)) => Ok(items),
                Some(Value::Null) => Ok(Vec::new()),
                Some(other) => Err(unexpected_shape(key, &other)),
                None => Err(AppError::DataSource(format!(
                    "response has no `data` or `{}` list",
                    key
                ))),
            }
        }
        other => Err(unexpected_shape(key, &other)),
    }
}

fn unexpected_shape(key: &str, value: &Value) -> AppError {
    AppError::DataSource(format!("unexpected shape for `{}`: {}", key, value))
}

/// Parses a messages response; malformed rows are skipped.
pub fn parse_messages(body: Value) -> Result<Vec<Message>> {
    let rows = extract_list(body, "messages")?;
    let mut messages = Vec::with_capacity(rows.len());

    for row in rows {
        let parsed = serde_json::from_value::<RawMessage>(row)
            .map_err(|e| AppError::InvalidInput(e.to_string()))
            .and_then(Message::try_from);
        match parsed {
            Ok(message) => messages.push(message),
            Err(e) => tracing::warn!("Dropping malformed message row: {}", e),
        }
    }

    Ok(messages)
}

/// Parses a single message object, such as the body returned after a send.
pub fn parse_message(body: Value) -> Result<Message> {
    let row = match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    };
    let raw: RawMessage =
        serde_json::from_value(row).map_err(|e| AppError::DataSource(e.to_string()))?;
    Message::try_from(raw)
}

/// Parses a profiles response into an id-keyed map; malformed rows are skipped.
pub fn parse_profiles(body: Value) -> Result<HashMap<Uuid, Profile>> {
    let rows = extract_list(body, "profiles")?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<RawProfile>(row) {
            Ok(raw) => Some(Profile::from(raw)),
            Err(e) => {
                tracing::warn!("Dropping malformed profile row: {}", e);
                None
            }
        })
        .map(|p| (p.id, p))
        .collect())
}
