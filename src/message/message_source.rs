use crate::{error::Result, message::message_models::Message, profile::Profile};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Where direct messages come from.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Every message the user sent or received, in any order.
    async fn fetch_messages_involving(&self, user_id: Uuid) -> Result<Vec<Message>>;

    async fn create_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message>;

    /// One page of the thread between two users, newest first.
    async fn find_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>>;

    async fn count_conversation(&self, user_id: Uuid, other_user_id: Uuid) -> Result<i64>;
}

/// Batch profile lookup. Ids without a profile are simply absent.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn fetch_profiles(&self, ids: &HashSet<Uuid>) -> Result<HashMap<Uuid, Profile>>;
}

/// Sets `read_at` on messages addressed to the reader.
///
/// Both operations are idempotent: an already-read message keeps its
/// original `read_at`.
#[async_trait]
pub trait ReadMarker: Send + Sync {
    /// Errors with `NotFound` if no message with this id was sent to `reader_id`.
    async fn mark_read(&self, message_id: Uuid, reader_id: Uuid) -> Result<()>;

    async fn mark_conversation_as_read(
        &self,
        reader_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<()>;
}
