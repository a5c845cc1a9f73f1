//! SeaORM entities for the CRM tables, one module per table.

pub mod reminder;
pub mod resource_tag;
pub mod tag;
pub mod task;
pub mod user;
