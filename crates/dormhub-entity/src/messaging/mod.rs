//! Direct messaging between students and admins.

pub mod conversation;
pub mod message;

pub use conversation::{Conversation, Participant, ParticipantRole};
pub use message::Message;
