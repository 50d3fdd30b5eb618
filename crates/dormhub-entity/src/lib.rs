//! # dormhub-entity
//!
//! Domain entity models for DormHub. Every struct in this crate represents
//! a database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`; ordered nested lists are stored as JSONB.
//!
//! Invariants that can be checked without I/O (room status derivation,
//! the billing ledger, form history, curfew classification) live next to
//! the entity they protect.

pub mod account;
pub mod attendance;
pub mod bill;
pub mod building;
pub mod form;
pub mod messaging;
pub mod news;
pub mod notification;
pub mod offense;
