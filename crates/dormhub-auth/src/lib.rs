//! # dormhub-auth
//!
//! Authentication primitives for DormHub.
//!
//! ## Modules
//!
//! - `jwt`: signed session tokens carrying the account id and role
//! - `password`: Argon2id password hashing and strength policy

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, IssuedToken};
pub use password::{PasswordHasher, PasswordValidator};
