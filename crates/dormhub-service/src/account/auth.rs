//! Sign-in for the three account kinds.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use dormhub_auth::{IssuedToken, JwtEncoder, PasswordHasher};
use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_database::repositories::{AdminRepository, StaffRepository, StudentRepository};
use dormhub_entity::account::{Admin, Role, Staff, Student};

use super::normalize_email;

/// Any kind of account, as returned to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AccountView {
    /// A student.
    Student(Student),
    /// A staff member.
    Staff(Staff),
    /// An admin.
    Admin(Admin),
}

impl AccountView {
    /// Account id.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Student(s) => s.id,
            Self::Staff(s) => s.id,
            Self::Admin(a) => a.id,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Student(s) => &s.name,
            Self::Staff(s) => &s.name,
            Self::Admin(a) => &a.name,
        }
    }

    /// Account role.
    pub fn role(&self) -> Role {
        match self {
            Self::Student(_) => Role::Student,
            Self::Staff(_) => Role::Staff,
            Self::Admin(_) => Role::Admin,
        }
    }

    fn password_hash(&self) -> &str {
        match self {
            Self::Student(s) => &s.password_hash,
            Self::Staff(s) => &s.password_hash,
            Self::Admin(a) => &a.password_hash,
        }
    }
}

/// A successful sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    /// Session token and expiry.
    #[serde(flatten)]
    pub token: IssuedToken,
    /// The signed-in account.
    pub account: AccountView,
}

/// Verifies credentials and issues session tokens.
#[derive(Debug, Clone)]
pub struct AuthService {
    /// Admin accounts.
    admin_repo: Arc<AdminRepository>,
    /// Staff accounts.
    staff_repo: Arc<StaffRepository>,
    /// Student accounts.
    student_repo: Arc<StudentRepository>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Token encoder.
    encoder: Arc<JwtEncoder>,
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(
        admin_repo: Arc<AdminRepository>,
        staff_repo: Arc<StaffRepository>,
        student_repo: Arc<StudentRepository>,
        hasher: Arc<PasswordHasher>,
        encoder: Arc<JwtEncoder>,
    ) -> Self {
        Self {
            admin_repo,
            staff_repo,
            student_repo,
            hasher,
            encoder,
        }
    }

    /// Look up an account of `role` by email.
    pub async fn find_account(&self, role: Role, email: &str) -> AppResult<Option<AccountView>> {
        let email = normalize_email(email)?;
        Ok(match role {
            Role::Student => self
                .student_repo
                .find_by_email(&email)
                .await?
                .map(AccountView::Student),
            Role::Staff => self
                .staff_repo
                .find_by_email(&email)
                .await?
                .map(AccountView::Staff),
            Role::Admin => self
                .admin_repo
                .find_by_email(&email)
                .await?
                .map(AccountView::Admin),
        })
    }

    /// Sign in with email and password.
    ///
    /// Unknown accounts and wrong passwords produce the same error.
    pub async fn login(&self, role: Role, email: &str, password: &str) -> AppResult<LoginResult> {
        let invalid = || AppError::authentication("Invalid email or password");

        let account = match self.find_account(role, email).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!(role = %role, "Login attempt for unknown account");
                return Err(invalid());
            }
            Err(e) if e.kind == dormhub_core::error::ErrorKind::Validation => return Err(invalid()),
            Err(e) => return Err(e),
        };

        if !self.hasher.verify_password(password, account.password_hash())? {
            warn!(role = %role, account_id = %account.id(), "Login failed: wrong password");
            return Err(invalid());
        }

        let token = self.encoder.issue(account.id(), role, account.name())?;
        info!(role = %role, account_id = %account.id(), "Signed in");
        Ok(LoginResult { token, account })
    }
}
