pub mod reminder_routes;
pub mod task_routes;
