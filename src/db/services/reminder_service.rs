use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};

use crate::db::entities::reminder;
use crate::db::services::tag_service;

/// Resource type used for tag vocabulary and tag associations of reminders.
pub const RESOURCE_TYPE: &str = "reminders";

/// Filters applied to reminder listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderFilter {
    pub resource_type: Option<String>,
    pub resource_id: Option<i32>,
    pub search_query: Option<String>,
    /// Restricts the listing to one creator (client users only see their own).
    pub creator_id: Option<i32>,
}

/// One page of a reminder listing plus the total number of matching rows.
#[derive(Debug, Clone)]
pub struct ReminderPage {
    pub rows: Vec<reminder::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Fields written by create and update.
#[derive(Debug, Clone)]
pub struct ReminderInput {
    pub title: String,
    pub description: String,
    pub reminder_date: NaiveDate,
    pub resource_type: Option<String>,
    pub resource_id: Option<i32>,
}

fn flatten_txn_error(err: TransactionError<DbErr>) -> DbErr {
    match err {
        TransactionError::Connection(e) | TransactionError::Transaction(e) => e,
    }
}

fn filter_condition(filter: &ReminderFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(resource_type) = &filter.resource_type {
        cond = cond.add(reminder::Column::ResourceType.eq(resource_type.as_str()));
    }
    if let Some(resource_id) = filter.resource_id {
        cond = cond.add(reminder::Column::ResourceId.eq(resource_id));
    }
    if let Some(query) = filter.search_query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        cond = cond.add(
            Condition::any()
                .add(reminder::Column::Title.contains(query))
                .add(reminder::Column::Description.contains(query)),
        );
    }
    if let Some(creator_id) = filter.creator_id {
        cond = cond.add(reminder::Column::UserId.eq(creator_id));
    }
    cond
}

// --- Reminder Service Functions ---

/// Searches reminders, newest first. `page` is 1-based.
pub async fn search_reminders(
    db: &DatabaseConnection,
    filter: &ReminderFilter,
    page: u64,
    per_page: u64,
) -> Result<ReminderPage, DbErr> {
    let per_page = per_page.max(1);
    let page = page.max(1);

    let paginator = reminder::Entity::find()
        .filter(filter_condition(filter))
        .order_by_desc(reminder::Column::Id)
        .paginate(db, per_page);

    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(ReminderPage {
        rows,
        total,
        page,
        per_page,
    })
}

/// Counts the reminders matching a filter.
pub async fn count_reminders(db: &DatabaseConnection, filter: &ReminderFilter) -> Result<u64, DbErr> {
    reminder::Entity::find()
        .filter(filter_condition(filter))
        .count(db)
        .await
}

/// Retrieves a reminder by its ID.
pub async fn get_reminder_by_id(
    db: &DatabaseConnection,
    reminder_id: i32,
) -> Result<Option<reminder::Model>, DbErr> {
    reminder::Entity::find_by_id(reminder_id).one(db).await
}

/// Creates a reminder and attaches its tags in one transaction.
pub async fn create_reminder(
    db: &DatabaseConnection,
    user_id: i32,
    input: ReminderInput,
    tags: Vec<String>,
) -> Result<reminder::Model, DbErr> {
    db.transaction::<_, reminder::Model, DbErr>(|txn| {
        Box::pin(async move {
            let now = Utc::now();
            let created = reminder::ActiveModel {
                user_id: Set(user_id),
                title: Set(input.title),
                description: Set(input.description),
                reminder_date: Set(input.reminder_date),
                resource_type: Set(input.resource_type),
                resource_id: Set(input.resource_id),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;

            tag_service::add_tags(txn, RESOURCE_TYPE, created.id, user_id, &tags).await?;
            Ok(created)
        })
    })
    .await
    .map_err(flatten_txn_error)
}

/// Updates a reminder and replaces its tags (delete all, then re-add) in one
/// transaction. Returns `None` when the reminder does not exist.
pub async fn update_reminder(
    db: &DatabaseConnection,
    reminder_id: i32,
    editor_id: i32,
    input: ReminderInput,
    tags: Vec<String>,
) -> Result<Option<reminder::Model>, DbErr> {
    db.transaction::<_, Option<reminder::Model>, DbErr>(|txn| {
        Box::pin(async move {
            let Some(existing) = reminder::Entity::find_by_id(reminder_id).one(txn).await? else {
                return Ok(None);
            };

            let mut active_model = existing.into_active_model();
            active_model.title = Set(input.title);
            active_model.description = Set(input.description);
            active_model.reminder_date = Set(input.reminder_date);
            if input.resource_type.is_some() {
                active_model.resource_type = Set(input.resource_type);
            }
            if input.resource_id.is_some() {
                active_model.resource_id = Set(input.resource_id);
            }
            active_model.updated_at = Set(Utc::now());
            let updated = active_model.update(txn).await?;

            tag_service::delete_tags(txn, RESOURCE_TYPE, reminder_id).await?;
            tag_service::add_tags(txn, RESOURCE_TYPE, reminder_id, editor_id, &tags).await?;
            Ok(Some(updated))
        })
    })
    .await
    .map_err(flatten_txn_error)
}

/// Deletes reminders and their tag associations in one transaction.
/// Returns the number of reminders removed.
pub async fn delete_reminders(db: &DatabaseConnection, reminder_ids: Vec<i32>) -> Result<u64, DbErr> {
    if reminder_ids.is_empty() {
        return Ok(0);
    }
    db.transaction::<_, u64, DbErr>(|txn| {
        Box::pin(async move {
            tag_service::delete_tags_for_resources(txn, RESOURCE_TYPE, &reminder_ids).await?;
            let result = reminder::Entity::delete_many()
                .filter(reminder::Column::Id.is_in(reminder_ids))
                .exec(txn)
                .await?;
            Ok(result.rows_affected)
        })
    })
    .await
    .map_err(flatten_txn_error)
}
