//! Buildings and rooms.

pub mod model;
pub mod room;

pub use model::Building;
pub use room::{Room, RoomChanges, RoomStatus, RoomType};
