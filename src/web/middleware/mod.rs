pub mod auth;
pub mod bulk_permission;
pub mod i18n;
