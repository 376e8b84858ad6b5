use crate::{
    error::{AppError, Result},
    message::{
        message_models::Message,
        message_source::{MessageSource, ReadMarker},
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageSource for MessageRepository {
    async fn fetch_messages_involving(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, sender_id, receiver_id, content, created_at, read_at
             FROM messages
             WHERE sender_id = $1 OR receiver_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn create_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (sender_id, receiver_id, content)
             VALUES ($1, $2, $3)
             RETURNING id, sender_id, receiver_id, content, created_at, read_at",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_conversation(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, sender_id, receiver_id, content, created_at, read_at
             FROM messages
             WHERE (sender_id = $1 AND receiver_id = $2)
                OR (sender_id = $2 AND receiver_id = $1)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(other_user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn count_conversation(&self, user_id: Uuid, other_user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages
             WHERE (sender_id = $1 AND receiver_id = $2)
                OR (sender_id = $2 AND receiver_id = $1)",
        )
        .bind(user_id)
        .bind(other_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl ReadMarker for MessageRepository {
    async fn mark_read(&self, message_id: Uuid, reader_id: Uuid) -> Result<()> {
        // COALESCE keeps the first read timestamp on repeat calls
        let result = sqlx::query(
            "UPDATE messages
             SET read_at = COALESCE(read_at, NOW())
             WHERE id = $1 AND receiver_id = $2",
        )
        .bind(message_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Message not found".to_string()));
        }

        Ok(())
    }

    async fn mark_conversation_as_read(&self, reader_id: Uuid, other_user_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE messages
             SET read_at = NOW()
             WHERE receiver_id = $1 AND sender_id = $2 AND read_at IS NULL",
        )
        .bind(reader_id)
        .bind(other_user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
