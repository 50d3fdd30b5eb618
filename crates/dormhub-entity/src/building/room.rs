//! Room entity and occupancy accounting.
//!
//! A room's status is derived from its occupant count and type capacity:
//! `Occupied` iff `occupants.len() >= capacity`. The derivation runs after
//! every occupant or type change. On updates an explicitly supplied status
//! wins over the derivation; on creation the status is always derived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use dormhub_core::{AppError, AppResult};

/// Room layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "room_type", rename_all = "snake_case")]
pub enum RoomType {
    /// One bed.
    Single,
    /// Two beds.
    Double,
}

impl RoomType {
    /// Number of students the room holds.
    pub fn capacity(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }
}

impl FromStr for RoomType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            _ => Err(AppError::validation(format!(
                "Invalid room type: '{s}'. Expected Single or Double"
            ))),
        }
    }
}

/// Occupancy status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "room_status", rename_all = "snake_case")]
pub enum RoomStatus {
    /// Has at least one free bed.
    Available,
    /// Full.
    Occupied,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Occupied => write!(f, "Occupied"),
        }
    }
}

/// A room owned by exactly one building.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Room {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning building.
    pub building_id: Uuid,
    /// Room number, unique within the building.
    pub room_number: String,
    /// Floor number.
    pub floor: i32,
    /// Layout.
    pub room_type: RoomType,
    /// Student ids living in the room.
    pub occupants: Vec<Uuid>,
    /// Occupancy status.
    pub status: RoomStatus,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
    /// When the room was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Field changes for an administrative room update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomChanges {
    /// New room number.
    pub room_number: Option<String>,
    /// New floor.
    pub floor: Option<i32>,
    /// New layout; occupancy is re-derived.
    pub room_type: Option<RoomType>,
    /// Explicit status override; takes precedence over derivation.
    pub status: Option<RoomStatus>,
}

impl Room {
    /// Build a new, empty room. The status is always derived on creation.
    pub fn new(
        building_id: Uuid,
        room_number: String,
        floor: i32,
        room_type: RoomType,
        now: DateTime<Utc>,
    ) -> Self {
        let mut room = Self {
            id: Uuid::new_v4(),
            building_id,
            room_number,
            floor,
            room_type,
            occupants: Vec::new(),
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        };
        room.recompute_status();
        room
    }

    /// Capacity of the room's layout.
    pub fn capacity(&self) -> usize {
        self.room_type.capacity()
    }

    /// The status implied by the occupant count.
    pub fn derived_status(&self) -> RoomStatus {
        if self.occupants.len() >= self.capacity() {
            RoomStatus::Occupied
        } else {
            RoomStatus::Available
        }
    }

    /// Re-derive `status` from the occupant count.
    pub fn recompute_status(&mut self) {
        self.status = self.derived_status();
    }

    /// Whether another student fits.
    pub fn has_free_bed(&self) -> bool {
        self.occupants.len() < self.capacity()
    }

    /// Whether the student lives here.
    pub fn is_occupant(&self, student_id: Uuid) -> bool {
        self.occupants.contains(&student_id)
    }

    /// Add a student and re-derive the status.
    pub fn add_occupant(&mut self, student_id: Uuid) -> AppResult<()> {
        if self.is_occupant(student_id) {
            return Err(AppError::conflict(format!(
                "Student {student_id} already lives in room {}",
                self.room_number
            )));
        }
        if !self.has_free_bed() {
            return Err(AppError::conflict(format!(
                "Room {} is full ({} of {} beds taken)",
                self.room_number,
                self.occupants.len(),
                self.capacity()
            )));
        }
        self.occupants.push(student_id);
        self.recompute_status();
        Ok(())
    }

    /// Remove a student and re-derive the status.
    pub fn remove_occupant(&mut self, student_id: Uuid) -> AppResult<()> {
        let before = self.occupants.len();
        self.occupants.retain(|id| *id != student_id);
        if self.occupants.len() == before {
            return Err(AppError::not_found(format!(
                "Student {student_id} does not live in room {}",
                self.room_number
            )));
        }
        self.recompute_status();
        Ok(())
    }

    /// Apply an administrative update.
    ///
    /// A type change re-derives the status unless `changes.status` is set,
    /// in which case the explicit value is kept.
    pub fn apply_changes(&mut self, changes: RoomChanges) -> AppResult<()> {
        if let Some(room_number) = changes.room_number {
            if room_number.trim().is_empty() {
                return Err(AppError::validation("Room number must not be empty"));
            }
            self.room_number = room_number;
        }
        if let Some(floor) = changes.floor {
            self.floor = floor;
        }
        if let Some(room_type) = changes.room_type {
            if self.occupants.len() > room_type.capacity() {
                return Err(AppError::conflict(format!(
                    "Room {} has {} occupants; a {:?} room holds {}",
                    self.room_number,
                    self.occupants.len(),
                    room_type,
                    room_type.capacity()
                )));
            }
            self.room_type = room_type;
            self.recompute_status();
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(room_type: RoomType) -> Room {
        Room::new(Uuid::new_v4(), "101".into(), 1, room_type, Utc::now())
    }

    #[test]
    fn test_single_room_flips_on_add_and_remove() {
        let mut r = room(RoomType::Single);
        assert_eq!(r.status, RoomStatus::Available);

        let student = Uuid::new_v4();
        r.add_occupant(student).unwrap();
        assert_eq!(r.status, RoomStatus::Occupied);

        r.remove_occupant(student).unwrap();
        assert_eq!(r.status, RoomStatus::Available);
    }

    #[test]
    fn test_double_room_needs_two_occupants() {
        let mut r = room(RoomType::Double);
        r.add_occupant(Uuid::new_v4()).unwrap();
        assert_eq!(r.status, RoomStatus::Available);
        r.add_occupant(Uuid::new_v4()).unwrap();
        assert_eq!(r.status, RoomStatus::Occupied);
    }

    #[test]
    fn test_full_room_rejects_occupant() {
        let mut r = room(RoomType::Single);
        r.add_occupant(Uuid::new_v4()).unwrap();
        let err = r.add_occupant(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind, dormhub_core::error::ErrorKind::Conflict);
        assert_eq!(r.occupants.len(), 1);
    }

    #[test]
    fn test_duplicate_occupant_rejected() {
        let mut r = room(RoomType::Double);
        let student = Uuid::new_v4();
        r.add_occupant(student).unwrap();
        assert!(r.add_occupant(student).is_err());
    }

    #[test]
    fn test_removing_stranger_is_not_found() {
        let mut r = room(RoomType::Double);
        let err = r.remove_occupant(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.kind, dormhub_core::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_type_change_rederives_status() {
        let mut r = room(RoomType::Double);
        r.add_occupant(Uuid::new_v4()).unwrap();
        assert_eq!(r.status, RoomStatus::Available);

        r.apply_changes(RoomChanges {
            room_type: Some(RoomType::Single),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(r.status, RoomStatus::Occupied);
    }

    #[test]
    fn test_shrinking_below_occupancy_rejected() {
        let mut r = room(RoomType::Double);
        r.add_occupant(Uuid::new_v4()).unwrap();
        r.add_occupant(Uuid::new_v4()).unwrap();
        let result = r.apply_changes(RoomChanges {
            room_type: Some(RoomType::Single),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(r.room_type, RoomType::Double);
    }

    #[test]
    fn test_explicit_status_wins_on_update() {
        let mut r = room(RoomType::Double);
        r.apply_changes(RoomChanges {
            room_type: Some(RoomType::Single),
            status: Some(RoomStatus::Occupied),
            ..Default::default()
        })
        .unwrap();
        assert!(r.occupants.is_empty());
        assert_eq!(r.status, RoomStatus::Occupied);
    }

    #[test]
    fn test_status_always_matches_occupancy_after_mutations() {
        let mut r = room(RoomType::Double);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for step in [(a, true), (b, true), (a, false), (b, false)] {
            match step {
                (id, true) => r.add_occupant(id).unwrap(),
                (id, false) => r.remove_occupant(id).unwrap(),
            }
            let expected = if r.occupants.len() >= r.capacity() {
                RoomStatus::Occupied
            } else {
                RoomStatus::Available
            };
            assert_eq!(r.status, expected);
        }
    }
}
