//! Notification recipients.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::account::Role;

/// Account kind a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recipient_model", rename_all = "snake_case")]
pub enum RecipientModel {
    /// A student.
    User,
    /// An administrator.
    Admin,
    /// A staff member.
    Staff,
}

impl RecipientModel {
    /// Return the model name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
            Self::Staff => "Staff",
        }
    }
}

impl fmt::Display for RecipientModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Role> for RecipientModel {
    fn from(role: Role) -> Self {
        match role {
            Role::Student => Self::User,
            Role::Staff => Self::Staff,
            Role::Admin => Self::Admin,
        }
    }
}

impl From<RecipientModel> for Role {
    fn from(model: RecipientModel) -> Self {
        match model {
            RecipientModel::User => Role::Student,
            RecipientModel::Staff => Role::Staff,
            RecipientModel::Admin => Role::Admin,
        }
    }
}

/// Who a notification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recipient {
    /// One account.
    SpecificUser {
        /// Account id.
        id: Uuid,
        /// Account kind.
        model: RecipientModel,
    },
    /// Every account of a kind.
    RoleBroadcast {
        /// Account kind.
        model: RecipientModel,
    },
}

impl Recipient {
    /// Address a single student.
    pub fn student(id: Uuid) -> Self {
        Self::SpecificUser {
            id,
            model: RecipientModel::User,
        }
    }

    /// Address a single staff member.
    pub fn staff(id: Uuid) -> Self {
        Self::SpecificUser {
            id,
            model: RecipientModel::Staff,
        }
    }

    /// Address a single admin.
    pub fn admin(id: Uuid) -> Self {
        Self::SpecificUser {
            id,
            model: RecipientModel::Admin,
        }
    }

    /// Address every admin.
    pub fn all_admins() -> Self {
        Self::RoleBroadcast {
            model: RecipientModel::Admin,
        }
    }

    /// Address every student.
    pub fn all_students() -> Self {
        Self::RoleBroadcast {
            model: RecipientModel::User,
        }
    }

    /// The account kind addressed.
    pub fn model(&self) -> RecipientModel {
        match self {
            Self::SpecificUser { model, .. } | Self::RoleBroadcast { model } => *model,
        }
    }

    /// The account id, for single-account recipients.
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::SpecificUser { id, .. } => Some(*id),
            Self::RoleBroadcast { .. } => None,
        }
    }

    /// Rebuild from the stored `(model, id)` column pair.
    pub fn from_columns(model: RecipientModel, id: Option<Uuid>) -> Self {
        match id {
            Some(id) => Self::SpecificUser { id, model },
            None => Self::RoleBroadcast { model },
        }
    }

    /// Whether an account with this id and role can see notifications
    /// addressed to this recipient.
    pub fn includes(&self, account_id: Uuid, role: Role) -> bool {
        match self {
            Self::SpecificUser { id, model } => *id == account_id && *model == role.into(),
            Self::RoleBroadcast { model } => *model == role.into(),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpecificUser { id, model } => write!(f, "{model}:{id}"),
            Self::RoleBroadcast { model } => write!(f, "{model}:*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_round_trip() {
        let id = Uuid::new_v4();
        let r = Recipient::staff(id);
        assert_eq!(Recipient::from_columns(r.model(), r.id()), r);
        let b = Recipient::all_admins();
        assert_eq!(Recipient::from_columns(b.model(), b.id()), b);
    }

    #[test]
    fn test_includes() {
        let me = Uuid::new_v4();
        assert!(Recipient::student(me).includes(me, Role::Student));
        assert!(!Recipient::student(me).includes(me, Role::Admin));
        assert!(!Recipient::student(me).includes(Uuid::new_v4(), Role::Student));
        assert!(Recipient::all_admins().includes(me, Role::Admin));
        assert!(!Recipient::all_admins().includes(me, Role::Staff));
    }

    #[test]
    fn test_tagged_serialization() {
        let json = serde_json::to_value(Recipient::all_admins()).unwrap();
        assert_eq!(json["kind"], "role_broadcast");
        assert_eq!(json["model"], "Admin");
    }
}
