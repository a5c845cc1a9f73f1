use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::db::entities::{reminder, tag};
use crate::web::{
    error::AppError,
    page::PageSettings,
    responses::{ResponseContext, ViewResponse, json_with_html, negotiate},
};

/// A reminder as the templates and JSON clients see it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReminderView {
    #[serde(flatten)]
    pub reminder: reminder::Model,
    pub tags: Vec<tag::Model>,
    pub permission_edit_delete_reminder: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Pagination {
            page,
            per_page,
            total,
            has_more: page.saturating_mul(per_page) < total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub page: PageSettings,
    pub reminders: Vec<ReminderView>,
    pub pagination: Pagination,
}

impl ViewResponse for IndexResponse {
    fn respond(&self, ctx: &ResponseContext<'_>) -> Result<Response, AppError> {
        negotiate(ctx, self, "reminders/wrapper.html", "reminders/table.html")
    }
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub page: PageSettings,
    /// Tag vocabulary offered by the form.
    pub tags: Vec<tag::Model>,
}

impl ViewResponse for CreateResponse {
    fn respond(&self, ctx: &ResponseContext<'_>) -> Result<Response, AppError> {
        negotiate(ctx, self, "reminders/form_page.html", "reminders/form.html")
    }
}

/// Always JSON: the new row for the table plus the updated row count.
#[derive(Debug, Serialize)]
pub struct StoreResponse {
    pub reminders: Vec<ReminderView>,
    pub count: u64,
}

impl ViewResponse for StoreResponse {
    fn respond(&self, ctx: &ResponseContext<'_>) -> Result<Response, AppError> {
        json_with_html(ctx, self, "reminders/rows.html")
    }
}

#[derive(Debug, Serialize)]
pub struct ShowResponse {
    pub reminder: ReminderView,
}

impl ViewResponse for ShowResponse {
    fn respond(&self, ctx: &ResponseContext<'_>) -> Result<Response, AppError> {
        negotiate(ctx, self, "reminders/show_page.html", "reminders/show.html")
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EditResponse {
    pub page: PageSettings,
    pub reminder: ReminderView,
    /// Current tags, ordered by title.
    pub tags: Vec<tag::Model>,
}

impl ViewResponse for EditResponse {
    fn respond(&self, ctx: &ResponseContext<'_>) -> Result<Response, AppError> {
        negotiate(ctx, self, "reminders/form_page.html", "reminders/form.html")
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub reminders: Vec<ReminderView>,
}

impl ViewResponse for UpdateResponse {
    fn respond(&self, ctx: &ResponseContext<'_>) -> Result<Response, AppError> {
        json_with_html(ctx, self, "reminders/rows.html")
    }
}

#[derive(Debug, Serialize)]
pub struct DestroyResponse {
    pub reminder_id: i32,
}

#[derive(Debug, Serialize)]
pub struct BulkDestroyResponse {
    pub reminder_ids: Vec<i32>,
}

impl IntoResponse for DestroyResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl IntoResponse for BulkDestroyResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
