//! Route handlers organized by domain.

pub mod accounts;
pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod bills;
pub mod forms;
pub mod health;
pub mod housing;
pub mod messaging;
pub mod news;
pub mod notification;
pub mod offenses;
pub mod uploads;
pub mod ws;
