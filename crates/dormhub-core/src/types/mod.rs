//! Core type definitions used across the DormHub workspace.

pub mod pagination;
pub mod response;
