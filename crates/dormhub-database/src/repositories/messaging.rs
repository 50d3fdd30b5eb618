//! Conversation and message repositories.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_entity::messaging::{Conversation, Message};

/// Repository for conversations.
#[derive(Debug, Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    /// Create a new conversation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a conversation by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find conversation", e)
            })
    }

    /// Find the conversation between two accounts.
    pub async fn find_between(&self, a: Uuid, b: Uuid) -> AppResult<Option<Conversation>> {
        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE participants @> $1 AND participants @> $2 LIMIT 1",
        )
        .bind(serde_json::json!([{ "id": a }]))
        .bind(serde_json::json!([{ "id": b }]))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find conversation", e))
    }

    /// List an account's conversations, most recently active first.
    pub async fn find_for(&self, participant_id: Uuid) -> AppResult<Vec<Conversation>> {
        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE participants @> $1 ORDER BY updated_at DESC",
        )
        .bind(serde_json::json!([{ "id": participant_id }]))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list conversations", e))
    }

    /// Insert a conversation.
    pub async fn create(&self, conversation: &Conversation) -> AppResult<Conversation> {
        sqlx::query_as::<_, Conversation>(
            "INSERT INTO conversations (id, participants, last_message_id, unread_counts, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(conversation.id)
        .bind(Json(&conversation.participants))
        .bind(conversation.last_message_id)
        .bind(Json(&conversation.unread_counts))
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create conversation", e))
    }

    /// Store a message and bump the recipient's unread counter in the same
    /// transaction.
    pub async fn append_message(&self, message: &Message) -> AppResult<Message> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let stored = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, conversation_id, sender_id, sender_role, recipient_id, \
             recipient_role, content, is_read, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(message.sender_role)
        .bind(message.recipient_id)
        .bind(message.recipient_role)
        .bind(&message.content)
        .bind(message.is_read)
        .bind(message.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store message", e))?;

        sqlx::query(
            "UPDATE conversations SET last_message_id = $2, updated_at = $4, \
             unread_counts = jsonb_set(unread_counts, ARRAY[$3::text], \
                 to_jsonb(COALESCE((unread_counts->>($3::text))::bigint, 0) + 1)) \
             WHERE id = $1",
        )
        .bind(message.conversation_id)
        .bind(message.id)
        .bind(message.recipient_id)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update conversation", e)
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit message", e))?;
        Ok(stored)
    }

    /// Mark every message addressed to `reader` as read and zero their
    /// unread counter.
    pub async fn mark_read(&self, conversation_id: Uuid, reader: Uuid) -> AppResult<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE \
             WHERE conversation_id = $1 AND recipient_id = $2 AND is_read = FALSE",
        )
        .bind(conversation_id)
        .bind(reader)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark messages read", e))?;

        sqlx::query(
            "UPDATE conversations SET unread_counts = jsonb_set(unread_counts, ARRAY[$2::text], '0') \
             WHERE id = $1",
        )
        .bind(conversation_id)
        .bind(reader)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reset unread count", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit read", e))?;
        Ok(result.rows_affected())
    }
}

/// Repository for messages.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a conversation's messages in chronological order.
    pub async fn find_by_conversation(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at, id",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list messages", e))
    }

    /// Count unread messages addressed to an account.
    pub async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND is_read = FALSE")
            .bind(recipient_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count unread messages", e)
            })
    }
}
