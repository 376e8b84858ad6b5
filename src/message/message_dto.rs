use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// One row of the conversation list. Recomputed on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversationSummary {
    pub counterpart_id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub last_message_content: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: usize,
    pub is_unread: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_rejects_empty_content() {
        let request = SendMessageRequest {
            receiver_id: Uuid::new_v4(),
            content: String::new(),
        };
        assert!(request.validate().is_err());
    }
}
