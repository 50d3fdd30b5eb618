//! Account sign-in, self-service and admin management.

pub mod admin;
pub mod auth;
pub mod profile;

pub use admin::AccountAdminService;
pub use auth::{AccountView, AuthService, LoginResult};
pub use profile::ProfileService;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;

/// Trim and lowercase an email address, rejecting obviously invalid ones.
pub(crate) fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::validation("Invalid email format")),
    }
}

/// Reject blank names.
pub(crate) fn require_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email(" An@Dorm.EDU ").unwrap(), "an@dorm.edu");
        assert!(normalize_email("nobody").is_err());
        assert!(normalize_email("@dorm.edu").is_err());
        assert!(normalize_email("a@localhost").is_err());
    }
}
