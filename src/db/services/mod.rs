//! The `services` module is the persistence layer: every query the web layer
//! needs lives here, one sub-module per domain entity, so handlers and
//! middleware never build SQL themselves.
//!
//! Functions take a `DatabaseConnection` (or any `ConnectionTrait` where they
//! are also used inside transactions) and return `sea_orm::DbErr` on failure.

pub mod reminder_service;
pub mod tag_service;
pub mod task_service;
pub mod user_service;
