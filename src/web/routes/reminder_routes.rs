use axum::{
    Router,
    extract::{Extension, Path, State},
    handler::Handler,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::db::entities::reminder;
use crate::db::services::{
    reminder_service::{self, ReminderFilter},
    tag_service,
};
use crate::permissions::{Action, Actor, EntityRef, PermissionCheck, ReminderPermissions, Resource, Role};
use crate::web::{
    AppState,
    error::AppError,
    localizer::Localizer,
    middleware::bulk_permission::{BulkGate, BulkSelection, GateState, bulk_permission_gate},
    models::AuthenticatedUser,
    page::{Section, page_settings},
    request::ParsedRequest,
    responses::{
        ResponseContext, ResponseMode, ViewResponse,
        reminders::{
            BulkDestroyResponse, CreateResponse, DestroyResponse, EditResponse, IndexResponse,
            Pagination, ReminderView, ShowResponse, StoreResponse, UpdateResponse,
        },
    },
    validation::validate_reminder,
};

// --- Helpers ---

/// Sets the edit/delete flag of a reminder view for `actor`.
pub fn annotate(permissions: &ReminderPermissions, view: &mut ReminderView, actor: &Actor) {
    view.permission_edit_delete_reminder = permissions.allows(Action::EditDelete, &view.reminder, actor);
}

/// Listing filters taken from the request. Client users only ever see
/// reminders they created.
fn filter_from_request(req: &ParsedRequest, user: &AuthenticatedUser) -> ReminderFilter {
    ReminderFilter {
        resource_type: req.get("reminderresource_type").map(str::to_string),
        resource_id: req.get_i32("reminderresource_id"),
        search_query: req.get("search_query").map(str::to_string),
        creator_id: (user.role == Role::Client).then_some(user.id),
    }
}

fn parse_reminder_id(raw: &str, l10n: &Localizer) -> Result<i32, AppError> {
    raw.parse().map_err(|_| AppError::NotFound(l10n.t("reminder_not_found")))
}

/// Loads tags for the rows and wraps each one into an annotated view.
async fn reminder_views(
    app_state: &AppState,
    actor: &Actor,
    rows: Vec<reminder::Model>,
) -> Result<Vec<ReminderView>, AppError> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let mut tags =
        tag_service::get_tags_for_resources(&app_state.db_pool, reminder_service::RESOURCE_TYPE, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|reminder| {
            let mut view = ReminderView {
                tags: tags.remove(&reminder.id).unwrap_or_default(),
                reminder,
                permission_edit_delete_reminder: false,
            };
            annotate(&app_state.permissions.reminders, &mut view, actor);
            view
        })
        .collect())
}

async fn reminder_view(app_state: &AppState, actor: &Actor, row: reminder::Model) -> Result<ReminderView, AppError> {
    reminder_views(app_state, actor, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::InternalServerError("reminder view was not built".to_string()))
}

/// Loads a reminder and checks `action` on it: missing is a 409, forbidden a 403.
async fn authorize_reminder(
    app_state: &AppState,
    l10n: &Localizer,
    actor: &Actor,
    raw_id: &str,
    action: Action,
) -> Result<reminder::Model, AppError> {
    let reminder_id = parse_reminder_id(raw_id, l10n)?;
    let reminder = reminder_service::get_reminder_by_id(&app_state.db_pool, reminder_id)
        .await?
        .ok_or_else(|| AppError::NotFound(l10n.t("reminder_not_found")))?;

    let permitted = app_state
        .permissions
        .reminders
        .check(&app_state.db_pool, action, EntityRef::Loaded(&reminder), actor)
        .await?;
    if !permitted {
        return Err(AppError::PermissionDenied(l10n.t("permission_denied")));
    }
    Ok(reminder)
}

fn context<'a>(app_state: &'a AppState, l10n: &'a Localizer, req: &ParsedRequest) -> ResponseContext<'a> {
    ResponseContext {
        views: &app_state.views,
        l10n,
        mode: ResponseMode::of(req),
    }
}

// --- Route Handlers ---

async fn index(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(l10n): Extension<Localizer>,
    req: ParsedRequest,
) -> Result<Response, AppError> {
    let section = if req.get("reminderresource_type").is_some() {
        Section::MyReminders
    } else {
        Section::Reminders
    };
    let page_no = req.get("page").and_then(|p| p.parse::<u64>().ok()).unwrap_or(1);

    let filter = filter_from_request(&req, &user);
    let result =
        reminder_service::search_reminders(&app_state.db_pool, &filter, page_no, app_state.config.per_page).await?;
    let reminders = reminder_views(&app_state, &user.actor(), result.rows).await?;

    IndexResponse {
        page: page_settings(section, &req, &l10n),
        reminders,
        pagination: Pagination::new(result.page, result.per_page, result.total),
    }
    .respond(&context(&app_state, &l10n, &req))
}

async fn create(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(l10n): Extension<Localizer>,
    req: ParsedRequest,
) -> Result<Response, AppError> {
    if !app_state.permissions.reminders.may_create(&user.actor()) {
        return Err(AppError::PermissionDenied(l10n.t("permission_denied")));
    }
    let tags = tag_service::get_tags_by_type(&app_state.db_pool, reminder_service::RESOURCE_TYPE).await?;

    CreateResponse {
        page: page_settings(Section::Create, &req, &l10n),
        tags,
    }
    .respond(&context(&app_state, &l10n, &req))
}

async fn store(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(l10n): Extension<Localizer>,
    req: ParsedRequest,
) -> Result<Response, AppError> {
    let actor = user.actor();
    if !app_state.permissions.reminders.may_create(&actor) {
        return Err(AppError::PermissionDenied(l10n.t("permission_denied")));
    }

    let validated = validate_reminder(&req, &l10n)?;
    let created = reminder_service::create_reminder(&app_state.db_pool, user.id, validated.input, validated.tags)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = user.id, "Failed to create reminder.");
            AppError::PersistenceFailed
        })?;
    info!(reminder_id = created.id, user_id = user.id, "Reminder created.");

    let reminder = reminder_service::get_reminder_by_id(&app_state.db_pool, created.id)
        .await?
        .ok_or(AppError::PersistenceFailed)?;
    let view = reminder_view(&app_state, &actor, reminder).await?;
    let count = reminder_service::count_reminders(&app_state.db_pool, &filter_from_request(&req, &user)).await?;

    StoreResponse {
        reminders: vec![view],
        count,
    }
    .respond(&context(&app_state, &l10n, &req))
}

async fn show(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(l10n): Extension<Localizer>,
    Path(reminder_id): Path<String>,
    req: ParsedRequest,
) -> Result<Response, AppError> {
    let actor = user.actor();
    let reminder = authorize_reminder(&app_state, &l10n, &actor, &reminder_id, Action::View).await?;
    let view = reminder_view(&app_state, &actor, reminder).await?;

    ShowResponse { reminder: view }.respond(&context(&app_state, &l10n, &req))
}

async fn edit(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(l10n): Extension<Localizer>,
    Path(reminder_id): Path<String>,
    req: ParsedRequest,
) -> Result<Response, AppError> {
    let actor = user.actor();
    let reminder = authorize_reminder(&app_state, &l10n, &actor, &reminder_id, Action::EditDelete).await?;
    let tags =
        tag_service::get_tags_for_resource(&app_state.db_pool, reminder_service::RESOURCE_TYPE, reminder.id).await?;
    let view = reminder_view(&app_state, &actor, reminder).await?;

    EditResponse {
        page: page_settings(Section::Edit, &req, &l10n),
        reminder: view,
        tags,
    }
    .respond(&context(&app_state, &l10n, &req))
}

async fn update(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(l10n): Extension<Localizer>,
    Path(reminder_id): Path<String>,
    req: ParsedRequest,
) -> Result<Response, AppError> {
    let actor = user.actor();
    let reminder = authorize_reminder(&app_state, &l10n, &actor, &reminder_id, Action::EditDelete).await?;
    let validated = validate_reminder(&req, &l10n)?;

    let updated = reminder_service::update_reminder(
        &app_state.db_pool,
        reminder.id,
        user.id,
        validated.input,
        validated.tags,
    )
    .await
    .map_err(|e| {
        error!(error = %e, reminder_id = reminder.id, user_id = user.id, "Failed to update reminder.");
        AppError::PersistenceFailed
    })?
    .ok_or_else(|| AppError::NotFound(l10n.t("reminder_not_found")))?;
    info!(reminder_id = updated.id, user_id = user.id, "Reminder updated.");

    let reminder = reminder_service::get_reminder_by_id(&app_state.db_pool, updated.id)
        .await?
        .ok_or_else(|| AppError::NotFound(l10n.t("reminder_not_found")))?;
    let view = reminder_view(&app_state, &actor, reminder).await?;

    UpdateResponse { reminders: vec![view] }.respond(&context(&app_state, &l10n, &req))
}

async fn destroy(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(l10n): Extension<Localizer>,
    Extension(selection): Extension<BulkSelection>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let reminder_id = parse_reminder_id(&raw_id, &l10n)?;
    // The gate selects exactly the route id on this route.
    if selection.ids != [reminder_id] {
        return Err(AppError::NotFound(l10n.t("reminder_not_found")));
    }

    let deleted = reminder_service::delete_reminders(&app_state.db_pool, vec![reminder_id]).await?;
    if deleted == 0 {
        // Removed by someone else after the gate let the request through.
        return Err(AppError::NotFound(l10n.t("reminder_not_found")));
    }
    info!(reminder_id, user_id = user.id, "Reminder deleted.");

    Ok(DestroyResponse { reminder_id }.into_response())
}

async fn bulk_destroy(
    State(app_state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(selection): Extension<BulkSelection>,
) -> Result<Response, AppError> {
    let deleted = reminder_service::delete_reminders(&app_state.db_pool, selection.ids.clone()).await?;
    info!(deleted, ids = ?selection.ids, user_id = user.id, "Reminders deleted.");

    Ok(BulkDestroyResponse {
        reminder_ids: selection.ids,
    }
    .into_response())
}

// --- Router ---

pub fn create_reminders_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let gate = GateState {
        app: app_state,
        gate: BulkGate {
            resource: Resource::Reminder,
            action: Action::Delete,
            route_param: "reminder",
        },
    };

    Router::new()
        .route(
            "/reminders",
            get(index)
                .post(store)
                .delete(bulk_destroy.layer(from_fn_with_state(gate.clone(), bulk_permission_gate))),
        )
        .route("/reminders/create", get(create))
        .route(
            "/reminders/{reminder}",
            get(show)
                .put(update)
                .patch(update)
                .delete(destroy.layer(from_fn_with_state(gate, bulk_permission_gate))),
        )
        .route("/reminders/{reminder}/edit", get(edit))
}
