use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};

use crate::db::entities::task;
use crate::db::services::tag_service;

/// Resource type used for tag associations of tasks.
pub const RESOURCE_TYPE: &str = "tasks";

// --- Task Service Functions ---

/// Creates a new task.
pub async fn create_task(
    db: &DatabaseConnection,
    creator_id: i32,
    title: &str,
    description: &str,
    due_date: Option<NaiveDate>,
) -> Result<task::Model, DbErr> {
    let now = Utc::now();
    task::ActiveModel {
        creator_id: Set(creator_id),
        title: Set(title.to_owned()),
        description: Set(description.to_owned()),
        due_date: Set(due_date),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Retrieves a task by its ID.
pub async fn get_task_by_id(db: &DatabaseConnection, task_id: i32) -> Result<Option<task::Model>, DbErr> {
    task::Entity::find_by_id(task_id).one(db).await
}

/// Deletes tasks and their tag associations in one transaction.
/// Returns the number of tasks removed.
pub async fn delete_tasks(db: &DatabaseConnection, task_ids: Vec<i32>) -> Result<u64, DbErr> {
    if task_ids.is_empty() {
        return Ok(0);
    }
    db.transaction::<_, u64, DbErr>(|txn| {
        Box::pin(async move {
            tag_service::delete_tags_for_resources(txn, RESOURCE_TYPE, &task_ids).await?;
            let result = task::Entity::delete_many()
                .filter(task::Column::Id.is_in(task_ids))
                .exec(txn)
                .await?;
            Ok(result.rows_affected)
        })
    })
    .await
    .map_err(|e| match e {
        TransactionError::Connection(e) | TransactionError::Transaction(e) => e,
    })
}
