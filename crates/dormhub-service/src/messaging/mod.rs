//! Direct messages between students and admins.

pub mod service;

pub use service::{ConversationSummary, MessagingService, SendMessageRequest};
