//! Account self-service: profile, password and staff availability.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use dormhub_auth::{PasswordHasher, PasswordValidator};
use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_database::repositories::{AdminRepository, StaffRepository, StudentRepository};
use dormhub_entity::account::{Role, Staff, StaffStatus};

use super::auth::AccountView;
use super::{normalize_email, require_name};
use crate::context::RequestContext;

/// Data for updating one's own profile. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New gender (students only).
    pub gender: Option<String>,
}

/// Handles self-service operations for the signed-in account.
#[derive(Debug, Clone)]
pub struct ProfileService {
    /// Admin accounts.
    admin_repo: Arc<AdminRepository>,
    /// Staff accounts.
    staff_repo: Arc<StaffRepository>,
    /// Student accounts.
    student_repo: Arc<StudentRepository>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Password strength policy.
    validator: Arc<PasswordValidator>,
}

impl ProfileService {
    /// Creates a new profile service.
    pub fn new(
        admin_repo: Arc<AdminRepository>,
        staff_repo: Arc<StaffRepository>,
        student_repo: Arc<StudentRepository>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
    ) -> Self {
        Self {
            admin_repo,
            staff_repo,
            student_repo,
            hasher,
            validator,
        }
    }

    /// Gets the current account's profile.
    pub async fn get_profile(&self, ctx: &RequestContext) -> AppResult<AccountView> {
        let account = match ctx.role {
            Role::Student => self
                .student_repo
                .find_by_id(ctx.user_id)
                .await?
                .map(AccountView::Student),
            Role::Staff => self
                .staff_repo
                .find_by_id(ctx.user_id)
                .await?
                .map(AccountView::Staff),
            Role::Admin => self
                .admin_repo
                .find_by_id(ctx.user_id)
                .await?
                .map(AccountView::Admin),
        };
        account.ok_or_else(|| AppError::not_found("Account not found"))
    }

    /// Updates the current account's profile. Admin profiles are read-only.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        req: UpdateProfileRequest,
    ) -> AppResult<AccountView> {
        let now = Utc::now();
        let updated = match self.get_profile(ctx).await? {
            AccountView::Student(student) => {
                let name = match req.name {
                    Some(name) => require_name(&name)?,
                    None => student.name,
                };
                let email = match req.email {
                    Some(email) => normalize_email(&email)?,
                    None => student.email,
                };
                let phone = req.phone.or(student.phone);
                let gender = req.gender.or(student.gender);
                AccountView::Student(
                    self.student_repo
                        .update_profile(
                            student.id,
                            &name,
                            &email,
                            phone.as_deref(),
                            gender.as_deref(),
                            now,
                        )
                        .await?,
                )
            }
            AccountView::Staff(mut staff) => {
                if let Some(name) = req.name {
                    staff.name = require_name(&name)?;
                }
                if let Some(email) = req.email {
                    staff.email = normalize_email(&email)?;
                }
                if req.phone.is_some() {
                    staff.phone = req.phone;
                }
                staff.updated_at = now;
                AccountView::Staff(self.staff_repo.update(&staff).await?)
            }
            AccountView::Admin(_) => {
                return Err(AppError::authorization(
                    "Admin profiles cannot be edited here",
                ));
            }
        };

        info!(user_id = %ctx.user_id, role = %ctx.role, "Profile updated");
        Ok(updated)
    }

    /// Changes the current account's password.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let account = self.get_profile(ctx).await?;
        let hash = match &account {
            AccountView::Student(s) => &s.password_hash,
            AccountView::Staff(s) => &s.password_hash,
            AccountView::Admin(a) => &a.password_hash,
        };

        if !self.hasher.verify_password(current_password, hash)? {
            return Err(AppError::authentication("Current password is incorrect"));
        }
        self.validator
            .validate_not_same(current_password, new_password)?;
        self.validator.validate(new_password, &[account.name()])?;

        let new_hash = self.hasher.hash_password(new_password)?;
        match ctx.role {
            Role::Student => self.student_repo.update_password(ctx.user_id, &new_hash).await?,
            Role::Staff => self.staff_repo.update_password(ctx.user_id, &new_hash).await?,
            Role::Admin => self.admin_repo.update_password(ctx.user_id, &new_hash).await?,
        }

        info!(user_id = %ctx.user_id, role = %ctx.role, "Password changed");
        Ok(())
    }

    /// Sets a staff member's own availability.
    pub async fn set_availability(
        &self,
        ctx: &RequestContext,
        status: StaffStatus,
    ) -> AppResult<Staff> {
        ctx.require_role(Role::Staff)?;
        let mut staff = self
            .staff_repo
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Staff member not found"))?;
        staff.status = status;
        staff.updated_at = Utc::now();
        let staff = self.staff_repo.update(&staff).await?;
        info!(staff_id = %staff.id, status = staff.status.as_str(), "Availability changed");
        Ok(staff)
    }
}
