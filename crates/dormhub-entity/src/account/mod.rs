//! Admin, staff and student accounts.

pub mod admin;
pub mod role;
pub mod staff;
pub mod student;

pub use admin::Admin;
pub use role::{Actor, Role};
pub use staff::{Staff, StaffStatus, StaffType};
pub use student::Student;
