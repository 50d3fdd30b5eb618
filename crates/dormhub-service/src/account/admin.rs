//! Admin management of student and staff accounts.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use dormhub_auth::{PasswordHasher, PasswordValidator};
use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_database::repositories::{
    AdminRepository, StaffFilter, StaffRepository, StudentRepository,
};
use dormhub_entity::account::{Admin, Staff, StaffStatus, StaffType, Student};

use super::profile::UpdateProfileRequest;
use super::{normalize_email, require_name};
use crate::context::RequestContext;

/// Request to create a student account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStudentRequest {
    /// School-issued number.
    pub student_number: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Gender.
    pub gender: Option<String>,
}

/// Request to create a staff account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStaffRequest {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Trade.
    pub type_of_staff: StaffType,
}

/// Request to update a staff account. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStaffRequest {
    /// Display name.
    pub name: Option<String>,
    /// Login email.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Trade.
    pub type_of_staff: Option<StaffType>,
    /// Availability.
    pub status: Option<StaffStatus>,
}

/// Handles administrative account management.
#[derive(Debug, Clone)]
pub struct AccountAdminService {
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

impl AccountAdminService {
    /// Creates a new account admin service.
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

    /// Creates an admin account. Used by the command line.
    pub async fn create_admin(&self, name: &str, email: &str, password: &str) -> AppResult<Admin> {
        let name = require_name(name)?;
        let email = normalize_email(email)?;
        self.validator.validate(password, &[&name, &email])?;
        if self.admin_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email is already in use"));
        }

        let now = Utc::now();
        let admin = Admin {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash: self.hasher.hash_password(password)?,
            created_at: now,
            updated_at: now,
        };
        let admin = self.admin_repo.create(&admin).await?;
        info!(admin_id = %admin.id, "Admin account created");
        Ok(admin)
    }

    // ── Students ─────────────────────────────────────────────

    /// Lists students, optionally filtered by a name, email or number search.
    pub async fn list_students(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Student>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.student_repo.find_all(search, &page.normalized()).await
    }

    /// Gets one student.
    pub async fn get_student(&self, id: Uuid) -> AppResult<Student> {
        self.student_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Student not found"))
    }

    /// Creates a student account.
    pub async fn create_student(
        &self,
        ctx: &RequestContext,
        req: CreateStudentRequest,
    ) -> AppResult<Student> {
        let name = require_name(&req.name)?;
        let email = normalize_email(&req.email)?;
        let student_number = req.student_number.trim().to_string();
        if student_number.is_empty() {
            return Err(AppError::validation("Student number cannot be empty"));
        }
        self.validator
            .validate(&req.password, &[&name, &email, &student_number])?;
        if self.student_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email is already in use"));
        }

        let now = Utc::now();
        let student = Student {
            id: Uuid::new_v4(),
            student_number,
            name,
            email,
            password_hash: self.hasher.hash_password(&req.password)?,
            phone: req.phone,
            gender: req.gender,
            room_id: None,
            building_id: None,
            created_at: now,
            updated_at: now,
        };
        let student = self.student_repo.create(&student).await?;
        info!(admin_id = %ctx.user_id, student_id = %student.id, "Student account created");
        Ok(student)
    }

    /// Updates a student's profile fields.
    pub async fn update_student(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> AppResult<Student> {
        let student = self.get_student(id).await?;
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
        self.student_repo
            .update_profile(id, &name, &email, phone.as_deref(), gender.as_deref(), Utc::now())
            .await
    }

    /// Deletes a student, vacating their bed.
    pub async fn delete_student(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        if !self.student_repo.delete(id).await? {
            return Err(AppError::not_found("Student not found"));
        }
        info!(admin_id = %ctx.user_id, student_id = %id, "Student account deleted");
        Ok(())
    }

    // ── Staff ────────────────────────────────────────────────

    /// Lists staff.
    pub async fn list_staff(
        &self,
        filter: &StaffFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<Staff>> {
        self.staff_repo.find_all(filter, &page.normalized()).await
    }

    /// Gets one staff member.
    pub async fn get_staff(&self, id: Uuid) -> AppResult<Staff> {
        self.staff_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Staff member not found"))
    }

    /// Creates a staff account. New staff start out available.
    pub async fn create_staff(
        &self,
        ctx: &RequestContext,
        req: CreateStaffRequest,
    ) -> AppResult<Staff> {
        let name = require_name(&req.name)?;
        let email = normalize_email(&req.email)?;
        self.validator.validate(&req.password, &[&name, &email])?;
        if self.staff_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email is already in use"));
        }

        let now = Utc::now();
        let staff = Staff {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash: self.hasher.hash_password(&req.password)?,
            phone: req.phone,
            type_of_staff: req.type_of_staff,
            status: StaffStatus::Available,
            created_at: now,
            updated_at: now,
        };
        let staff = self.staff_repo.create(&staff).await?;
        info!(admin_id = %ctx.user_id, staff_id = %staff.id, "Staff account created");
        Ok(staff)
    }

    /// Updates a staff account.
    pub async fn update_staff(&self, id: Uuid, req: UpdateStaffRequest) -> AppResult<Staff> {
        let mut staff = self.get_staff(id).await?;
        if let Some(name) = req.name {
            staff.name = require_name(&name)?;
        }
        if let Some(email) = req.email {
            staff.email = normalize_email(&email)?;
        }
        if req.phone.is_some() {
            staff.phone = req.phone;
        }
        if let Some(kind) = req.type_of_staff {
            staff.type_of_staff = kind;
        }
        if let Some(status) = req.status {
            staff.status = status;
        }
        staff.updated_at = Utc::now();
        self.staff_repo.update(&staff).await
    }

    /// Deletes a staff account. Their open assignments become unassigned.
    pub async fn delete_staff(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        if !self.staff_repo.delete(id).await? {
            return Err(AppError::not_found("Staff member not found"));
        }
        info!(admin_id = %ctx.user_id, staff_id = %id, "Staff account deleted");
        Ok(())
    }
}
