//! Permission gate for destructive bulk actions.
//!
//! Single-item routes (`DELETE /tasks/{task}`) and checklist routes
//! (`DELETE /tasks` with `ids[5]=on&ids[7]=on`) share one path: a numeric
//! route id is turned into a one-entry id set first. Every selected id must
//! still exist and be permitted before the handler runs; one failure rejects
//! the whole request.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use crate::permissions::{Action, Resource};
use crate::web::{
    AppState, error::AppError, localizer::Localizer, models::AuthenticatedUser,
    request::ParsedRequest,
};

/// Marker a checklist uses for a selected row.
pub const SELECTED: &str = "on";

/// Per-route gate settings.
#[derive(Debug, Clone, Copy)]
pub struct BulkGate {
    pub resource: Resource,
    pub action: Action,
    /// Name of the single-id route parameter, e.g. "task".
    pub route_param: &'static str,
}

/// State handed to the gate middleware.
#[derive(Clone)]
pub struct GateState {
    pub app: Arc<AppState>,
    pub gate: BulkGate,
}

/// The validated selection a bulk handler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSelection {
    pub resource: Resource,
    pub ids: Vec<i32>,
}

/// Produces the id set for a request: a route id, when the route has one,
/// becomes `{id: "on"}` and the body is not consulted; otherwise the
/// submitted `ids` map is used as is. A route id that is not a valid id is
/// kept so the gate rejects it as a missing item.
pub fn normalize_id_set(
    route_id: Option<&str>,
    submitted: Option<&[(String, String)]>,
) -> Option<Vec<(String, String)>> {
    if let Some(id) = route_id {
        return Some(vec![(id.to_string(), SELECTED.to_string())]);
    }
    submitted.map(<[(String, String)]>::to_vec)
}

pub async fn bulk_permission_gate(
    State(gate_state): State<GateState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let GateState { app, gate } = gate_state;

    let (mut parts, body) = req.into_parts();
    let route_id = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &())
        .await
        .ok()
        .and_then(|Path(params)| params.get(gate.route_param).cloned());
    let (mut req, parsed) = ParsedRequest::capture(Request::from_parts(parts, body)).await?;

    let actor = req
        .extensions()
        .get::<AuthenticatedUser>()
        .map(AuthenticatedUser::actor)
        .ok_or(AppError::InvalidCredentials)?;
    let l10n = req.extensions().get::<Localizer>().cloned().unwrap_or_default();

    let Some(entries) = normalize_id_set(route_id.as_deref(), parsed.id_set("ids")) else {
        error!(
            process = %format!("[permissions][{}][destroy]", gate.resource.as_str()),
            debug_ref = %app.config.debug_ref,
            function = "bulk_permission_gate",
            file = file!(),
            line = line!(),
            path = %req.uri().path(),
            route_id = ?route_id,
            "no items were sent with this request"
        );
        return Err(AppError::MalformedRequest);
    };

    let mut ids = Vec::with_capacity(entries.len());
    for (key, marker) in entries {
        if marker != SELECTED {
            continue;
        }

        let gone = || AppError::NotFound(l10n.t("one_of_the_selected_items_nolonger_exists"));
        let id = key.parse::<i32>().map_err(|_| gone())?;
        if !app.permissions.exists(&app.db_pool, gate.resource, id).await? {
            return Err(gone());
        }

        if !app
            .permissions
            .check_id(&app.db_pool, gate.resource, gate.action, id, &actor)
            .await?
        {
            warn!(
                resource = gate.resource.as_str(),
                action = ?gate.action,
                id,
                user_id = actor.id,
                "Bulk action rejected: permission denied."
            );
            return Err(AppError::PermissionDenied(format!(
                "{} - #{id}",
                l10n.t("permission_denied_for_this_item")
            )));
        }

        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    req.extensions_mut().insert(BulkSelection {
        resource: gate.resource,
        ids,
    });
    req.extensions_mut().insert(parsed);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(id: &str) -> (String, String) {
        (id.to_string(), SELECTED.to_string())
    }

    #[test]
    fn numeric_route_id_becomes_single_entry_set() {
        assert_eq!(normalize_id_set(Some("9"), None), Some(vec![on("9")]));
    }

    #[test]
    fn route_id_takes_precedence_over_body() {
        let submitted = vec![on("5"), on("7")];
        assert_eq!(normalize_id_set(Some("9"), Some(&submitted)), Some(vec![on("9")]));
    }

    #[test]
    fn invalid_route_id_never_reads_the_body() {
        let submitted = vec![on("5")];
        assert_eq!(normalize_id_set(Some("abc"), Some(&submitted)), Some(vec![on("abc")]));
        assert_eq!(
            normalize_id_set(Some("99999999999"), Some(&submitted)),
            Some(vec![on("99999999999")])
        );
    }

    #[test]
    fn nothing_submitted_is_none() {
        assert_eq!(normalize_id_set(None, None), None);
    }

    #[test]
    fn singular_and_bulk_shapes_are_equivalent() {
        let bulk = vec![on("9")];
        assert_eq!(normalize_id_set(Some("9"), None), normalize_id_set(None, Some(&bulk)));
    }
}
