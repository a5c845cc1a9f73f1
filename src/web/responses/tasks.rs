use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DestroyResponse {
    pub task_ids: Vec<i32>,
}

impl IntoResponse for DestroyResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
