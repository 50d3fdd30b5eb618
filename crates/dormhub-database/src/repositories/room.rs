//! Room repository implementation, including the transactional
//! occupancy writes that keep rooms and students consistent.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use dormhub_core::error::AppError;
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_entity::building::{Room, RoomStatus};

use super::db_error;

/// Result of placing a student in a room.
#[derive(Debug, Clone)]
pub struct Placement {
    /// The room the student now occupies.
    pub room: Room,
    /// The room the student was moved out of, if any.
    pub vacated: Option<Room>,
}

/// Repository for rooms.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    /// Create a new room repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a room by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Room>> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find room"))
    }

    /// List the rooms of one building.
    pub async fn find_by_building(&self, building_id: Uuid) -> AppResult<Vec<Room>> {
        sqlx::query_as::<_, Room>(
            "SELECT * FROM rooms WHERE building_id = $1 ORDER BY floor, room_number",
        )
        .bind(building_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list building rooms"))
    }

    /// List rooms with optional building and status filters.
    pub async fn find_all(
        &self,
        building_id: Option<Uuid>,
        status: Option<RoomStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Room>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rooms \
             WHERE ($1::uuid IS NULL OR building_id = $1) \
               AND ($2::room_status IS NULL OR status = $2)",
        )
        .bind(building_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count rooms"))?;

        let rooms = sqlx::query_as::<_, Room>(
            "SELECT * FROM rooms \
             WHERE ($1::uuid IS NULL OR building_id = $1) \
               AND ($2::room_status IS NULL OR status = $2) \
             ORDER BY building_id, floor, room_number LIMIT $3 OFFSET $4",
        )
        .bind(building_id)
        .bind(status)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list rooms"))?;

        Ok(PageResponse::new(
            rooms,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Insert a room.
    pub async fn create(&self, room: &Room) -> AppResult<Room> {
        sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (id, building_id, room_number, floor, room_type, occupants, status, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(room.id)
        .bind(room.building_id)
        .bind(&room.room_number)
        .bind(room.floor)
        .bind(room.room_type)
        .bind(&room.occupants)
        .bind(room.status)
        .bind(room.created_at)
        .bind(room.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create room"))
    }

    /// Persist descriptive changes. Occupants are only written through
    /// [`assign_student`](Self::assign_student) and
    /// [`remove_student`](Self::remove_student).
    pub async fn update(&self, room: &Room) -> AppResult<Room> {
        sqlx::query_as::<_, Room>(
            "UPDATE rooms SET room_number = $2, floor = $3, room_type = $4, status = $5, \
             updated_at = $6 WHERE id = $1 RETURNING *",
        )
        .bind(room.id)
        .bind(&room.room_number)
        .bind(room.floor)
        .bind(room.room_type)
        .bind(room.status)
        .bind(room.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to update room"))
    }

    /// Delete an empty room.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1 AND cardinality(occupants) = 0")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete room"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Place a student in a room, moving them out of their current room
    /// if they have one. Room occupants and the student's placement are
    /// written in one transaction.
    pub async fn assign_student(
        &self,
        room_id: Uuid,
        student_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Placement> {
        let mut tx = self.begin().await?;

        let current = lock_student(&mut tx, student_id)
            .await?
            .ok_or_else(|| AppError::not_found("Student not found"))?;
        let old_id = current.filter(|old| *old != room_id);

        let mut rooms = Vec::with_capacity(2);
        for id in lock_order(room_id, old_id) {
            rooms.push(lock_room(&mut tx, id).await?);
        }
        let position = rooms
            .iter()
            .position(|r| r.id == room_id)
            .ok_or_else(|| AppError::not_found("Room not found"))?;
        let mut room = rooms.swap_remove(position);
        let old = rooms.pop();

        if room.is_occupant(student_id) {
            return Err(AppError::conflict("Student already lives in this room"));
        }
        room.add_occupant(student_id)?;
        room.updated_at = now;
        write_occupants(&mut tx, &room).await?;

        let vacated = match old {
            Some(mut old) => {
                if old.is_occupant(student_id) {
                    old.remove_occupant(student_id)?;
                }
                old.updated_at = now;
                write_occupants(&mut tx, &old).await?;
                Some(old)
            }
            None => None,
        };

        sqlx::query(
            "UPDATE students SET room_id = $2, building_id = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(student_id)
        .bind(room.id)
        .bind(room.building_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to place student"))?;

        commit(tx).await?;
        Ok(Placement { room, vacated })
    }

    /// Remove a student from a room and clear their placement.
    pub async fn remove_student(
        &self,
        room_id: Uuid,
        student_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Room> {
        let mut tx = self.begin().await?;

        lock_student(&mut tx, student_id).await?;
        let mut room = lock_room(&mut tx, room_id).await?;
        room.remove_occupant(student_id)?;
        room.updated_at = now;
        write_occupants(&mut tx, &room).await?;

        sqlx::query(
            "UPDATE students SET room_id = NULL, building_id = NULL, updated_at = $3 \
             WHERE id = $1 AND room_id = $2",
        )
        .bind(student_id)
        .bind(room_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to clear placement"))?;

        commit(tx).await?;
        Ok(room)
    }

    /// Count rooms per status.
    pub async fn count_by_status(&self) -> AppResult<Vec<(RoomStatus, i64)>> {
        sqlx::query_as::<_, (RoomStatus, i64)>(
            "SELECT status, COUNT(*) FROM rooms GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to count rooms"))
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))
    }
}

/// The rooms a move touches, in the ascending id order they are locked in.
fn lock_order(target: Uuid, current: Option<Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = std::iter::once(target).chain(current).collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Lock a student row. `None` when the student does not exist, otherwise
/// their current room.
async fn lock_student(
    tx: &mut Transaction<'static, Postgres>,
    id: Uuid,
) -> AppResult<Option<Option<Uuid>>> {
    sqlx::query_scalar("SELECT room_id FROM students WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to lock student"))
}

async fn lock_room(tx: &mut Transaction<'static, Postgres>, id: Uuid) -> AppResult<Room> {
    sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to lock room"))?
        .ok_or_else(|| AppError::not_found("Room not found"))
}

async fn write_occupants(tx: &mut Transaction<'static, Postgres>, room: &Room) -> AppResult<()> {
    sqlx::query("UPDATE rooms SET occupants = $2, status = $3, updated_at = $4 WHERE id = $1")
        .bind(room.id)
        .bind(&room.occupants)
        .bind(room.status)
        .bind(room.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to write occupants"))?;
    Ok(())
}

async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(db_error("Failed to commit transaction"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_order_is_independent_of_direction() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(lock_order(a, Some(b)), lock_order(b, Some(a)));
        let ordered = lock_order(a, Some(b));
        assert!(ordered[0] < ordered[1]);
    }

    #[test]
    fn test_lock_order_single_room() {
        let a = Uuid::new_v4();
        assert_eq!(lock_order(a, None), vec![a]);
        assert_eq!(lock_order(a, Some(a)), vec![a]);
    }
}
