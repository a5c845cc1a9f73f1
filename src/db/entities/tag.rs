use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tag in the vocabulary of one resource type ("reminders", "tasks", ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub resource_type: String,
    pub creator_id: i32,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_tag::Entity")]
    ResourceTags,
}

impl Related<super::resource_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
