use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::db::services::user_service;
use crate::web::{AppState, localizer::Localizer, models::AuthenticatedUser};

/// First language tag of an `Accept-Language` header, without its quality value.
fn preferred_language(value: &str) -> Option<String> {
    value
        .split(',')
        .next()
        .map(|s| s.split(';').next().unwrap_or(s).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolves the request locale (user setting, then `Accept-Language`, then the
/// configured default) and hands a `Localizer` for it to the rest of the stack.
pub async fn i18n_middleware(
    State(app_state): State<Arc<AppState>>,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    let mut locale = "auto".to_string();

    let user_id = req.extensions().get::<AuthenticatedUser>().map(|user| user.id);
    if let Some(user_id) = user_id {
        match user_service::get_user_by_id(&app_state.db_pool, user_id).await {
            Ok(Some(user_model)) => locale = user_model.language,
            Ok(None) => {}
            Err(e) => debug!(error = %e, user_id, "Could not load user language."),
        }
    }

    if locale == "auto" {
        locale = req
            .headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(preferred_language)
            .unwrap_or_else(|| app_state.config.default_locale.clone());
    }

    req.extensions_mut().insert(Localizer::new(locale));

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_accept_language_tag() {
        assert_eq!(preferred_language("zh-CN,zh;q=0.9,en;q=0.8").as_deref(), Some("zh-CN"));
        assert_eq!(preferred_language("en;q=0.5").as_deref(), Some("en"));
        assert_eq!(preferred_language(""), None);
    }
}
