//! Admin, staff and student account repositories.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_entity::account::{Admin, Staff, StaffStatus, StaffType, Student};

use super::db_error;

/// Repository for admin accounts.
#[derive(Debug, Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    /// Create a new admin repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an admin by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Admin>> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find admin", e))
    }

    /// Find an admin by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find admin by email", e)
            })
    }

    /// List every admin.
    pub async fn find_all(&self) -> AppResult<Vec<Admin>> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list admins", e))
    }

    /// Insert a new admin.
    pub async fn create(&self, admin: &Admin) -> AppResult<Admin> {
        sqlx::query_as::<_, Admin>(
            "INSERT INTO admins (id, name, email, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(admin.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create admin"))
    }

    /// Replace an admin's password hash.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE admins SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update admin password", e)
            })?;
        Ok(())
    }
}

/// Filter for staff listings.
#[derive(Debug, Clone, Default)]
pub struct StaffFilter {
    /// Restrict to one staff type.
    pub type_of_staff: Option<StaffType>,
    /// Restrict to one availability status.
    pub status: Option<StaffStatus>,
}

/// Repository for staff accounts.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: PgPool,
}

impl StaffRepository {
    /// Create a new staff repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a staff member by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Staff>> {
        sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find staff", e))
    }

    /// Find a staff member by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Staff>> {
        sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find staff by email", e)
            })
    }

    /// List staff with optional filters.
    pub async fn find_all(
        &self,
        filter: &StaffFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Staff>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM staff \
             WHERE ($1::staff_type IS NULL OR type_of_staff = $1) \
               AND ($2::staff_status IS NULL OR status = $2)",
        )
        .bind(filter.type_of_staff)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count staff", e))?;

        let staff = sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff \
             WHERE ($1::staff_type IS NULL OR type_of_staff = $1) \
               AND ($2::staff_status IS NULL OR status = $2) \
             ORDER BY name LIMIT $3 OFFSET $4",
        )
        .bind(filter.type_of_staff)
        .bind(filter.status)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list staff", e))?;

        Ok(PageResponse::new(
            staff,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Insert a new staff member.
    pub async fn create(&self, staff: &Staff) -> AppResult<Staff> {
        sqlx::query_as::<_, Staff>(
            "INSERT INTO staff (id, name, email, password_hash, phone, type_of_staff, status, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(staff.id)
        .bind(&staff.name)
        .bind(&staff.email)
        .bind(&staff.password_hash)
        .bind(&staff.phone)
        .bind(staff.type_of_staff)
        .bind(staff.status)
        .bind(staff.created_at)
        .bind(staff.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create staff"))
    }

    /// Persist profile and status changes.
    pub async fn update(&self, staff: &Staff) -> AppResult<Staff> {
        sqlx::query_as::<_, Staff>(
            "UPDATE staff SET name = $2, email = $3, phone = $4, type_of_staff = $5, \
             status = $6, updated_at = $7 WHERE id = $1 RETURNING *",
        )
        .bind(staff.id)
        .bind(&staff.name)
        .bind(&staff.email)
        .bind(&staff.phone)
        .bind(staff.type_of_staff)
        .bind(staff.status)
        .bind(staff.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to update staff"))
    }

    /// Replace a staff member's password hash.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE staff SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update staff password", e)
            })?;
        Ok(())
    }

    /// Delete a staff member. Forms assigned to them lose the assignment.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM staff WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete staff", e))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Repository for student accounts.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    /// Create a new student repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a student by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Student>> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find student", e))
    }

    /// Find a student by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find student by email", e)
            })
    }

    /// List students, optionally filtered by a name/number/email search.
    pub async fn find_all(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Student>> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM students \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR student_number ILIKE $1 OR email ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count students", e))?;

        let students = sqlx::query_as::<_, Student>(
            "SELECT * FROM students \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR student_number ILIKE $1 OR email ILIKE $1) \
             ORDER BY name LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list students", e))?;

        Ok(PageResponse::new(
            students,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// List the students living in a room.
    pub async fn find_by_room(&self, room_id: Uuid) -> AppResult<Vec<Student>> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE room_id = $1 ORDER BY name")
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list room occupants", e)
            })
    }

    /// Insert a new student.
    pub async fn create(&self, student: &Student) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            "INSERT INTO students (id, student_number, name, email, password_hash, phone, gender, \
             room_id, building_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(student.id)
        .bind(&student.student_number)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.password_hash)
        .bind(&student.phone)
        .bind(&student.gender)
        .bind(student.room_id)
        .bind(student.building_id)
        .bind(student.created_at)
        .bind(student.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create student"))
    }

    /// Persist profile changes. Room placement is written by the room
    /// repository only.
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        phone: Option<&str>,
        gender: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            "UPDATE students SET name = $2, email = $3, phone = $4, gender = $5, updated_at = $6 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(gender)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to update student"))
    }

    /// Replace a student's password hash.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE students SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update student password", e)
            })?;
        Ok(())
    }

    /// Delete a student and release their bed in the same transaction.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to begin", e))?;

        sqlx::query(
            "UPDATE rooms SET occupants = array_remove(occupants, $1), \
             status = CASE WHEN cardinality(array_remove(occupants, $1)) >= \
                 (CASE room_type WHEN 'single' THEN 1 ELSE 2 END) \
                 THEN 'occupied'::room_status ELSE 'available'::room_status END, \
             updated_at = NOW() \
             WHERE $1 = ANY(occupants)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release bed", e))?;

        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete student", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;
        Ok(result.rows_affected() > 0)
    }
}
