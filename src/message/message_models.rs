use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A direct message between two users.
///
/// `read_at` is the only unread flag: `None` means the receiver has not
/// read it yet. It moves from `None` to a timestamp once and never back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    /// The other participant relative to `user_id`.
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn is_unread_for(&self, user_id: Uuid) -> bool {
        self.receiver_id == user_id && self.read_at.is_none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            is_read: message.read_at.is_some(),
            created_at: message.created_at,
            read_at: message.read_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender: Uuid, receiver: Uuid) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            content: "hello".to_string(),
            created_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn test_counterpart_of() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(message(me, other).counterpart_of(me), other);
        assert_eq!(message(other, me).counterpart_of(me), other);
    }

    #[test]
    fn test_sent_messages_are_never_unread_for_sender() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(!message(me, other).is_unread_for(me));
        assert!(message(other, me).is_unread_for(me));
    }

    #[test]
    fn test_response_derives_is_read_from_read_at() {
        let mut msg = message(Uuid::new_v4(), Uuid::new_v4());
        assert!(!MessageResponse::from(msg.clone()).is_read);

        msg.read_at = Some(Utc::now());
        assert!(MessageResponse::from(msg).is_read);
    }
}
