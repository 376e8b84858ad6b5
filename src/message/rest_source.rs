use crate::{
    error::{AppError, Result},
    message::{
        message_ingest::{parse_message, parse_messages, parse_profiles},
        message_models::Message,
        message_source::{MessageSource, ProfileLookup, ReadMarker},
    },
    profile::Profile,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Message and profile backend reached over the secondary REST API.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let response = self.authorized(request).send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl MessageSource for RestBackend {
    async fn fetch_messages_involving(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let body = self
            .send_json(
                self.client
                    .get(self.url("/messages"))
                    .query(&[("user_id", user_id.to_string())]),
            )
            .await?;

        let messages: Vec<Message> = parse_messages(body)?
            .into_iter()
            .filter(|m| m.involves(user_id))
            .collect();
        tracing::debug!("Fetched {} messages for {} from REST backend", messages.len(), user_id);
        Ok(messages)
    }

    async fn create_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        let body = self
            .send_json(self.client.post(self.url("/messages")).json(&json!({
                "sender_id": sender_id,
                "receiver_id": receiver_id,
                "content": content,
            })))
            .await?;

        parse_message(body)
    }

    async fn find_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>> {
        let body = self
            .send_json(self.client.get(self.url("/messages/conversation")).query(&[
                ("user_id", user_id.to_string()),
                ("other_user_id", other_user_id.to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ]))
            .await?;

        let mut messages = parse_messages(body)?;
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    async fn count_conversation(&self, user_id: Uuid, other_user_id: Uuid) -> Result<i64> {
        let count = self
            .fetch_messages_involving(user_id)
            .await?
            .iter()
            .filter(|m| m.counterpart_of(user_id) == other_user_id)
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl ProfileLookup for RestBackend {
    async fn fetch_profiles(&self, ids: &HashSet<Uuid>) -> Result<HashMap<Uuid, Profile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let body = self
            .send_json(self.client.get(self.url("/profiles")).query(&[("ids", ids)]))
            .await?;

        parse_profiles(body)
    }
}

#[async_trait]
impl ReadMarker for RestBackend {
    async fn mark_read(&self, message_id: Uuid, reader_id: Uuid) -> Result<()> {
        let response = self
            .authorized(
                self.client
                    .patch(self.url(&format!("/messages/{}/read", message_id)))
                    .json(&json!({ "reader_id": reader_id })),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound("Message not found".to_string()));
        }
        response.error_for_status()?;
        Ok(())
    }

    async fn mark_conversation_as_read(&self, reader_id: Uuid, other_user_id: Uuid) -> Result<()> {
        self.authorized(self.client.patch(self.url("/messages/read")).json(&json!({
            "reader_id": reader_id,
            "other_user_id": other_user_id,
        })))
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let backend = RestBackend::new("https://api.example.com/v1/", None);
        assert_eq!(backend.url("/messages"), "https://api.example.com/v1/messages");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_data_source_error() {
        let backend = RestBackend::new("http://127.0.0.1:1", None);

        let result = backend.fetch_messages_involving(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::DataSource(_))));
    }
}
