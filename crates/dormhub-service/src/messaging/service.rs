//! Conversations and messages.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_database::repositories::{
    AdminRepository, ConversationRepository, MessageRepository, StudentRepository,
};
use dormhub_entity::messaging::{Conversation, Message, Participant, ParticipantRole};
use dormhub_realtime::{EmitTarget, OutboundEvent};

use crate::context::RequestContext;
use crate::effects::{EffectExecutor, Outcome};
use crate::notification::rules;

/// Longest accepted message body, in characters.
const MAX_MESSAGE_CHARS: usize = 4000;

/// A message to send.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    /// Receiving account.
    pub recipient_id: Uuid,
    /// Message body.
    pub content: String,
}

/// A conversation plus the caller's unread count.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    /// The conversation.
    #[serde(flatten)]
    pub conversation: Conversation,
    /// Messages the caller has not read.
    pub unread: i64,
}

/// Notification and live event for a stored message.
fn delivery_outcome(message: Message, sender_name: &str) -> Outcome<Message> {
    let notice = rules::new_message(&message, sender_name);
    let target = EmitTarget::User(message.recipient_id);
    let event = OutboundEvent::NewMessage(message.clone());
    Outcome::new(message).notify(notice).emit(target, event)
}

/// Sends and reads direct messages.
#[derive(Debug, Clone)]
pub struct MessagingService {
    conversation_repo: Arc<ConversationRepository>,
    message_repo: Arc<MessageRepository>,
    admin_repo: Arc<AdminRepository>,
    student_repo: Arc<StudentRepository>,
    effects: Arc<EffectExecutor>,
}

impl MessagingService {
    /// Creates a new messaging service.
    pub fn new(
        conversation_repo: Arc<ConversationRepository>,
        message_repo: Arc<MessageRepository>,
        admin_repo: Arc<AdminRepository>,
        student_repo: Arc<StudentRepository>,
        effects: Arc<EffectExecutor>,
    ) -> Self {
        Self {
            conversation_repo,
            message_repo,
            admin_repo,
            student_repo,
            effects,
        }
    }

    /// Resolve the other side: students write to admins and admins to
    /// students.
    async fn recipient(&self, sender: ParticipantRole, id: Uuid) -> AppResult<Participant> {
        let exists = match sender {
            ParticipantRole::User => self.admin_repo.find_by_id(id).await?.is_some(),
            ParticipantRole::Admin => self.student_repo.find_by_id(id).await?.is_some(),
        };
        if !exists {
            return Err(AppError::not_found("Recipient not found"));
        }
        let role = match sender {
            ParticipantRole::User => ParticipantRole::Admin,
            ParticipantRole::Admin => ParticipantRole::User,
        };
        Ok(Participant { id, role })
    }

    /// Sends a message, opening the conversation on first contact.
    pub async fn send_message(
        &self,
        ctx: &RequestContext,
        req: SendMessageRequest,
    ) -> AppResult<Message> {
        let sender = Participant {
            id: ctx.user_id,
            role: ParticipantRole::from_role(ctx.role)?,
        };
        let content = req.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::validation("Message must not be empty"));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::validation(format!(
                "Message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }
        let recipient = self.recipient(sender.role, req.recipient_id).await?;

        let now = Utc::now();
        let conversation = match self
            .conversation_repo
            .find_between(sender.id, recipient.id)
            .await?
        {
            Some(existing) => existing,
            None => {
                let fresh = Conversation::between(sender, recipient, now)?;
                self.conversation_repo.create(&fresh).await?
            }
        };

        let message = Message::compose(conversation.id, sender, recipient, content, now);
        let message = self.conversation_repo.append_message(&message).await?;
        info!(
            conversation_id = %conversation.id,
            message_id = %message.id,
            sender_id = %sender.id,
            recipient_id = %recipient.id,
            "Message sent"
        );
        Ok(self.effects.apply(delivery_outcome(message, &ctx.name)).await)
    }

    /// The caller's conversations, most recent first.
    pub async fn list_conversations(
        &self,
        ctx: &RequestContext,
    ) -> AppResult<Vec<ConversationSummary>> {
        ParticipantRole::from_role(ctx.role)?;
        let conversations = self.conversation_repo.find_for(ctx.user_id).await?;
        Ok(conversations
            .into_iter()
            .map(|conversation| ConversationSummary {
                unread: conversation.unread_for(ctx.user_id),
                conversation,
            })
            .collect())
    }

    /// Messages of a conversation, oldest first. Marks the caller's
    /// incoming messages read.
    pub async fn fetch_messages(
        &self,
        ctx: &RequestContext,
        conversation_id: Uuid,
    ) -> AppResult<Vec<Message>> {
        let conversation = self
            .conversation_repo
            .find_by_id(conversation_id)
            .await?
            .filter(|c| c.has_participant(ctx.user_id))
            .ok_or_else(|| AppError::not_found("Conversation not found"))?;

        let read = self
            .conversation_repo
            .mark_read(conversation.id, ctx.user_id)
            .await?;
        if read > 0 {
            tracing::debug!(conversation_id = %conversation.id, read, "Messages marked read");
        }
        self.message_repo.find_by_conversation(conversation.id).await
    }

    /// Unread messages addressed to the caller.
    pub async fn unread_count(&self, ctx: &RequestContext) -> AppResult<i64> {
        self.message_repo.count_unread(ctx.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::SideEffect;
    use dormhub_entity::notification::{NotificationType, RecipientModel};

    #[test]
    fn test_delivery_notifies_and_emits_to_recipient() {
        let student = Participant {
            id: Uuid::new_v4(),
            role: ParticipantRole::User,
        };
        let admin = Participant {
            id: Uuid::new_v4(),
            role: ParticipantRole::Admin,
        };
        let message = Message::compose(Uuid::new_v4(), student, admin, "Hot water is out".into(), Utc::now());

        let outcome = delivery_outcome(message, "Alice");
        assert_eq!(outcome.effects.len(), 2);
        match &outcome.effects[0] {
            SideEffect::Notify(n) => {
                assert_eq!(n.kind, NotificationType::NewMessage);
                assert_eq!(n.recipient.model(), RecipientModel::Admin);
                assert_eq!(n.title, "New message from Alice");
                assert!(n.is_deliverable());
            }
            other => panic!("unexpected effect {}", other.describe()),
        }
        assert!(matches!(
            &outcome.effects[1],
            SideEffect::Emit { target: EmitTarget::User(id), event: OutboundEvent::NewMessage(_) }
                if *id == admin.id
        ));
    }
}
