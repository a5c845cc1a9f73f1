//! Response classes: each controller action hands one of these a payload and
//! it decides how to render it. Ajax requests get a JSON envelope with the
//! rendered `html` fragment; page requests get the full template.

use axum::{
    Json,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::web::{error::AppError, localizer::Localizer, request::ParsedRequest, views::Views};

pub mod reminders;
pub mod tasks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Page,
    Ajax,
}

impl ResponseMode {
    pub fn of(req: &ParsedRequest) -> Self {
        if req.is_ajax() { ResponseMode::Ajax } else { ResponseMode::Page }
    }
}

/// What a response needs to render itself.
pub struct ResponseContext<'a> {
    pub views: &'a Views,
    pub l10n: &'a Localizer,
    pub mode: ResponseMode,
}

pub trait ViewResponse {
    fn respond(&self, ctx: &ResponseContext<'_>) -> Result<Response, AppError>;
}

/// The payload as JSON with the rendered `fragment` under `html`.
pub(crate) fn json_with_html<T: Serialize>(
    ctx: &ResponseContext<'_>,
    payload: &T,
    fragment: &str,
) -> Result<Response, AppError> {
    let html = ctx.views.render(fragment, payload, ctx.l10n)?;
    let mut value = serde_json::to_value(payload)?;
    if let Value::Object(map) = &mut value {
        map.insert("html".to_string(), Value::String(html));
    }
    Ok(Json(value).into_response())
}

/// Full page or ajax envelope, depending on the request mode.
pub(crate) fn negotiate<T: Serialize>(
    ctx: &ResponseContext<'_>,
    payload: &T,
    page_template: &str,
    fragment: &str,
) -> Result<Response, AppError> {
    match ctx.mode {
        ResponseMode::Page => Ok(Html(ctx.views.render(page_template, payload, ctx.l10n)?).into_response()),
        ResponseMode::Ajax => json_with_html(ctx, payload, fragment),
    }
}
