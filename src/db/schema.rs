use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::db::entities::{reminder, resource_tag, tag, task, user};

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates every table the application needs, skipping the ones that exist.
/// Parents go first so foreign keys resolve.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, reminder::Entity).await?;
    create_table(db, &schema, task::Entity).await?;
    create_table(db, &schema, tag::Entity).await?;
    create_table(db, &schema, resource_tag::Entity).await?;

    info!("Database schema is up to date.");
    Ok(())
}
