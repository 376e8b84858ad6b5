use crate::error::{AppError, Result};
use crate::message::conversation;
use crate::message::message_dto::{ConversationSummary, SendMessageRequest};
use crate::message::message_models::Message;
use crate::message::message_source::{MessageSource, ProfileLookup, ReadMarker};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageSource>,
    profiles: Arc<dyn ProfileLookup>,
    read_marker: Arc<dyn ReadMarker>,
}

impl MessageService {
    pub fn new(
        messages: Arc<dyn MessageSource>,
        profiles: Arc<dyn ProfileLookup>,
        read_marker: Arc<dyn ReadMarker>,
    ) -> Self {
        Self {
            messages,
            profiles,
            read_marker,
        }
    }

    /// Conversation list for `user_id`, newest first.
    ///
    /// A failing message source is returned as an error. A failing profile
    /// lookup only degrades names to "Unknown".
    pub async fn get_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        if user_id.is_nil() {
            return Ok(Vec::new());
        }

        let messages = self.messages.fetch_messages_involving(user_id).await?;
        let counterparts = conversation::counterpart_ids(user_id, &messages);

        let profiles = if counterparts.is_empty() {
            HashMap::new()
        } else {
            match self.profiles.fetch_profiles(&counterparts).await {
                Ok(profiles) => profiles,
                Err(e) => {
                    tracing::warn!(
                        "Profile lookup failed for {} counterparts, using fallback names: {}",
                        counterparts.len(),
                        e
                    );
                    HashMap::new()
                }
            }
        };

        let conversations = conversation::build_conversations(user_id, &messages, &profiles);
        tracing::debug!(
            "Built {} conversations from {} messages for {}",
            conversations.len(),
            messages.len(),
            user_id
        );
        Ok(conversations)
    }

    pub async fn count_unread(&self, user_id: Uuid) -> Result<usize> {
        if user_id.is_nil() {
            return Ok(0);
        }
        let messages = self.messages.fetch_messages_involving(user_id).await?;
        Ok(conversation::count_unread(user_id, &messages))
    }

    pub async fn mark_read(&self, user_id: Uuid, message_id: Uuid) -> Result<()> {
        self.read_marker.mark_read(message_id, user_id).await
    }

    pub async fn mark_conversation_as_read(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<()> {
        self.read_marker
            .mark_conversation_as_read(user_id, other_user_id)
            .await
    }

    pub async fn get_conversation_with_count(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Message>, i64)> {
        let messages = self
            .messages
            .find_conversation(user_id, other_user_id, limit, offset)
            .await?;
        let total = self
            .messages
            .count_conversation(user_id, other_user_id)
            .await?;
        Ok((messages, total))
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        payload: SendMessageRequest,
    ) -> Result<Message> {
        payload.validate()?;

        if payload.receiver_id == sender_id {
            return Err(AppError::InvalidInput(
                "Cannot send a message to yourself".to_string(),
            ));
        }
        if payload.receiver_id.is_nil() {
            return Err(AppError::InvalidInput("Receiver is required".to_string()));
        }

        let message = self
            .messages
            .create_message(sender_id, payload.receiver_id, &payload.content)
            .await?;

        tracing::info!("Message {} sent from {} to {}", message.id, sender_id, message.receiver_id);
        Ok(message)
    }
}

/// Hands out increasing tickets so a caller refreshing in the background
/// can tell whether a finished fetch is still the latest one.
///
/// The HTTP handlers answer one request each and don't need it; it is for
/// clients of `MessageService` that poll `get_conversations` and apply the
/// result to long-lived state. Take a ticket before the fetch and drop the
/// result if `is_current` is false afterwards.
#[derive(Debug, Default)]
pub struct FetchSequence {
    latest: AtomicU64,
}

impl FetchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::message_memory::InMemoryMessageStore;
    use crate::profile::Profile;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct FailingProfiles;

    #[async_trait]
    impl ProfileLookup for FailingProfiles {
        async fn fetch_profiles(&self, _ids: &HashSet<Uuid>) -> Result<HashMap<Uuid, Profile>> {
            Err(AppError::DataSource("identity service down".to_string()))
        }
    }

    struct FailingMessages;

    #[async_trait]
    impl MessageSource for FailingMessages {
        async fn fetch_messages_involving(&self, _user_id: Uuid) -> Result<Vec<Message>> {
            Err(AppError::DataSource("connection refused".to_string()))
        }

        async fn create_message(&self, _: Uuid, _: Uuid, _: &str) -> Result<Message> {
            Err(AppError::DataSource("connection refused".to_string()))
        }

        async fn find_conversation(
            &self,
            _: Uuid,
            _: Uuid,
            _: i64,
            _: i64,
        ) -> Result<Vec<Message>> {
            Err(AppError::DataSource("connection refused".to_string()))
        }

        async fn count_conversation(&self, _: Uuid, _: Uuid) -> Result<i64> {
            Err(AppError::DataSource("connection refused".to_string()))
        }
    }

    fn service(store: &InMemoryMessageStore) -> MessageService {
        let store = Arc::new(store.clone());
        MessageService::new(store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn test_conversations_resolve_profiles() {
        let store = InMemoryMessageStore::new();
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .insert_profile(Profile {
                id: other,
                first_name: Some("Chidi".to_string()),
                last_name: Some("Eze".to_string()),
                username: Some("chidi".to_string()),
                avatar_url: None,
            })
            .await;
        store.create_message(other, me, "Are you free Friday?").await.unwrap();

        let conversations = service(&store).get_conversations(me).await.unwrap();

        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].display_name, "Chidi Eze");
        assert_eq!(conversations[0].last_message_content, "Are you free Friday?");
        assert_eq!(conversations[0].unread_count, 1);
    }

    #[tokio::test]
    async fn test_profile_failure_degrades_to_unknown() {
        let store = Arc::new(InMemoryMessageStore::new());
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        store.create_message(other, me, "hello").await.unwrap();
        let service = MessageService::new(store.clone(), Arc::new(FailingProfiles), store);

        let conversations = service.get_conversations(me).await.unwrap();

        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].display_name, "Unknown");
        assert!(conversations[0].avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_message_source_failure_is_surfaced() {
        let store = Arc::new(InMemoryMessageStore::new());
        let service = MessageService::new(Arc::new(FailingMessages), store.clone(), store);

        let result = service.get_conversations(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::DataSource(_))));

        let result = service.count_unread(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::DataSource(_))));
    }

    #[tokio::test]
    async fn test_no_messages_is_empty_not_error() {
        let store = InMemoryMessageStore::new();
        let conversations = service(&store).get_conversations(Uuid::new_v4()).await.unwrap();
        assert!(conversations.is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_twice_counts_once() {
        let store = InMemoryMessageStore::new();
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        let first = store.create_message(other, me, "one").await.unwrap();
        store.create_message(other, me, "two").await.unwrap();
        let service = service(&store);

        service.mark_read(me, first.id).await.unwrap();
        service.mark_read(me, first.id).await.unwrap();

        assert_eq!(service.count_unread(me).await.unwrap(), 1);
        let conversations = service.get_conversations(me).await.unwrap();
        assert_eq!(conversations[0].unread_count, 1);
    }

    #[tokio::test]
    async fn test_mark_conversation_as_read_clears_only_that_counterpart() {
        let store = InMemoryMessageStore::new();
        let (me, a, b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.create_message(a, me, "from a").await.unwrap();
        store.create_message(b, me, "from b").await.unwrap();
        let service = service(&store);

        service.mark_conversation_as_read(me, a).await.unwrap();

        assert_eq!(service.count_unread(me).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_send_message_to_self_is_rejected() {
        let store = InMemoryMessageStore::new();
        let me = Uuid::new_v4();

        let result = service(&store)
            .send_message(
                me,
                SendMessageRequest {
                    receiver_id: me,
                    content: "note to self".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_fetch_sequence_detects_superseded_tickets() {
        let sequence = FetchSequence::new();
        let first = sequence.issue();
        let second = sequence.issue();

        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
    }
}
