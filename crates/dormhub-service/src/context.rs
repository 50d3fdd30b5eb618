//! Request context carrying the authenticated account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_entity::account::{Actor, Role};
use dormhub_entity::notification::RecipientModel;

/// Context for the current authenticated request.
///
/// Extracted by the API layer from the session token and passed into
/// service methods so every operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated account's ID.
    pub user_id: Uuid,
    /// The account's role at the time the token was issued.
    pub role: Role,
    /// Display name (convenience field from the token).
    pub name: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: Uuid, role: Role, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            name: name.into(),
            request_time: Utc::now(),
        }
    }

    /// The acting account as recorded in audit trails.
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }

    /// Notification recipient kind for this account.
    pub fn recipient_model(&self) -> RecipientModel {
        RecipientModel::from(self.role)
    }

    /// Returns whether the current account is an admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail unless the account has the given role.
    pub fn require_role(&self, role: Role) -> AppResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "This action requires the {role} role"
            )))
        }
    }

    /// Fail unless the account is `id`.
    pub fn require_self(&self, id: Uuid) -> AppResult<()> {
        if self.user_id == id {
            Ok(())
        } else {
            Err(AppError::authorization(
                "You can only act on your own account",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dormhub_core::error::ErrorKind;

    #[test]
    fn test_require_self() {
        let ctx = RequestContext::new(Uuid::new_v4(), Role::Student, "An");
        assert!(ctx.require_self(ctx.user_id).is_ok());
        let err = ctx.require_self(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    #[test]
    fn test_recipient_model() {
        let ctx = RequestContext::new(Uuid::new_v4(), Role::Student, "An");
        assert_eq!(ctx.recipient_model(), RecipientModel::User);
        assert!(ctx.require_role(Role::Admin).is_err());
    }
}
