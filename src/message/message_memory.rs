use crate::{
    error::{AppError, Result},
    message::{
        message_models::Message,
        message_source::{MessageSource, ProfileLookup, ReadMarker},
    },
    profile::Profile,
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local message and profile store for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<Vec<Message>>>,
    profiles: Arc<RwLock<HashMap<Uuid, Profile>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_message(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id, profile);
    }

    pub async fn get_message(&self, message_id: Uuid) -> Option<Message> {
        self.messages
            .read()
            .await
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    fn between(message: &Message, a: Uuid, b: Uuid) -> bool {
        (message.sender_id == a && message.receiver_id == b)
            || (message.sender_id == b && message.receiver_id == a)
    }
}

#[async_trait]
impl MessageSource for InMemoryMessageStore {
    async fn fetch_messages_involving(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    async fn create_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.to_string(),
            created_at: Utc::now(),
            read_at: None,
        };
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn find_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>> {
        let mut thread: Vec<Message> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| Self::between(m, user_id, other_user_id))
            .cloned()
            .collect();
        thread.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(thread
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_conversation(&self, user_id: Uuid, other_user_id: Uuid) -> Result<i64> {
        let count = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| Self::between(m, user_id, other_user_id))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl ProfileLookup for InMemoryMessageStore {
    async fn fetch_profiles(&self, ids: &HashSet<Uuid>) -> Result<HashMap<Uuid, Profile>> {
        let profiles = self.profiles.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

#[async_trait]
impl ReadMarker for InMemoryMessageStore {
    async fn mark_read(&self, message_id: Uuid, reader_id: Uuid) -> Result<()> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == message_id && m.receiver_id == reader_id)
            .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

        if message.read_at.is_none() {
            message.read_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_conversation_as_read(&self, reader_id: Uuid, other_user_id: Uuid) -> Result<()> {
        let now = Utc::now();
        for message in self.messages.write().await.iter_mut() {
            if message.receiver_id == reader_id
                && message.sender_id == other_user_id
                && message.read_at.is_none()
            {
                message.read_at = Some(now);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let store = InMemoryMessageStore::new();
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        let message = store.create_message(other, me, "hi").await.unwrap();

        store.mark_read(message.id, me).await.unwrap();
        let first = store.get_message(message.id).await.unwrap().read_at;
        store.mark_read(message.id, me).await.unwrap();
        let second = store.get_message(message.id).await.unwrap().read_at;

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_mark_read_rejects_non_receiver() {
        let store = InMemoryMessageStore::new();
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        let message = store.create_message(me, other, "hi").await.unwrap();

        let result = store.mark_read(message.id, me).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(store.get_message(message.id).await.unwrap().read_at.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_mark_read_leaves_message_read() {
        let store = InMemoryMessageStore::new();
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        let message = store.create_message(other, me, "hi").await.unwrap();

        let (a, b) = tokio::join!(store.mark_read(message.id, me), store.mark_read(message.id, me));

        assert!(a.is_ok() && b.is_ok());
        assert!(store.get_message(message.id).await.unwrap().read_at.is_some());
    }

    #[tokio::test]
    async fn test_find_conversation_pages_newest_first() {
        let store = InMemoryMessageStore::new();
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        for i in 0..5 {
            store
                .insert_message(Message {
                    id: Uuid::new_v4(),
                    sender_id: if i % 2 == 0 { me } else { other },
                    receiver_id: if i % 2 == 0 { other } else { me },
                    content: format!("m{}", i),
                    created_at: Utc::now() + chrono::Duration::seconds(i),
                    read_at: None,
                })
                .await;
        }

        let page = store.find_conversation(me, other, 2, 1).await.unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "m3");
        assert_eq!(page[1].content, "m2");
        assert_eq!(store.count_conversation(other, me).await.unwrap(), 5);
    }
}
