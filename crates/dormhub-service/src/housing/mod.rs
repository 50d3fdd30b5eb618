//! Buildings, rooms and bed placement.

pub mod building;
pub mod room;

pub use building::BuildingService;
pub use room::{RoomOccupancy, RoomService};
