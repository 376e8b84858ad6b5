pub mod conversation;
pub mod message_dto;
pub mod message_handlers;
pub mod message_ingest;
pub mod message_memory;
pub mod message_models;
pub mod message_repository;
pub mod message_service;
pub mod message_source;
pub mod rest_source;

pub use conversation::{build_conversations, count_unread};
pub use message_dto::{ConversationSummary, SendMessageRequest};
pub use message_memory::InMemoryMessageStore;
pub use message_models::{Message, MessageResponse};
pub use message_repository::MessageRepository;
pub use message_service::{FetchSequence, MessageService};
pub use message_source::{MessageSource, ProfileLookup, ReadMarker};
pub use rest_source::RestBackend;
