use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};
use sea_orm::sea_query::JoinType;

use crate::db::entities::{resource_tag, tag};

// --- Tag Service Functions ---

/// Normalizes submitted tag titles: trimmed, blanks dropped, duplicates
/// removed. The order of the first occurrence is not preserved; titles come
/// back sorted, which is also how they are listed.
pub fn normalize_titles(titles: &[String]) -> Vec<String> {
    titles
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Retrieves the tag vocabulary of a resource type, ordered by title.
pub async fn get_tags_by_type<C: ConnectionTrait>(
    db: &C,
    resource_type: &str,
) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .filter(tag::Column::ResourceType.eq(resource_type))
        .order_by_asc(tag::Column::Title)
        .all(db)
        .await
}

/// Retrieves the tags attached to one resource instance, ordered by title.
pub async fn get_tags_for_resource<C: ConnectionTrait>(
    db: &C,
    resource_type: &str,
    resource_id: i32,
) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .join(JoinType::InnerJoin, tag::Relation::ResourceTags.def())
        .filter(resource_tag::Column::ResourceType.eq(resource_type))
        .filter(resource_tag::Column::ResourceId.eq(resource_id))
        .order_by_asc(tag::Column::Title)
        .all(db)
        .await
}

/// Retrieves the tags of many resource instances at once, grouped by resource id.
/// Ids without tags are absent from the map.
pub async fn get_tags_for_resources<C: ConnectionTrait>(
    db: &C,
    resource_type: &str,
    resource_ids: &[i32],
) -> Result<HashMap<i32, Vec<tag::Model>>, DbErr> {
    if resource_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = resource_tag::Entity::find()
        .filter(resource_tag::Column::ResourceType.eq(resource_type))
        .filter(resource_tag::Column::ResourceId.is_in(resource_ids.iter().copied()))
        .find_also_related(tag::Entity)
        .all(db)
        .await?;

    let mut grouped: HashMap<i32, Vec<tag::Model>> = HashMap::new();
    for (link, tag_model) in links {
        if let Some(tag_model) = tag_model {
            grouped.entry(link.resource_id).or_default().push(tag_model);
        }
    }
    for tags in grouped.values_mut() {
        tags.sort_by(|a, b| a.title.cmp(&b.title));
    }
    Ok(grouped)
}

/// Attaches tags (by title) to a resource instance, creating vocabulary
/// entries for titles not seen before for this resource type.
pub async fn add_tags<C: ConnectionTrait>(
    db: &C,
    resource_type: &str,
    resource_id: i32,
    creator_id: i32,
    titles: &[String],
) -> Result<u64, DbErr> {
    let titles = normalize_titles(titles);
    if titles.is_empty() {
        return Ok(0);
    }

    let mut links = Vec::with_capacity(titles.len());
    for title in titles {
        let existing = tag::Entity::find()
            .filter(tag::Column::ResourceType.eq(resource_type))
            .filter(tag::Column::Title.eq(title.as_str()))
            .one(db)
            .await?;

        let tag_id = match existing {
            Some(tag_model) => tag_model.id,
            None => {
                let created = tag::ActiveModel {
                    title: Set(title),
                    resource_type: Set(resource_type.to_owned()),
                    creator_id: Set(creator_id),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(db)
                .await?;
                created.id
            }
        };

        links.push(resource_tag::ActiveModel {
            tag_id: Set(tag_id),
            resource_type: Set(resource_type.to_owned()),
            resource_id: Set(resource_id),
        });
    }

    resource_tag::Entity::insert_many(links)
        .exec_without_returning(db)
        .await
}

/// Removes every tag association of one resource instance.
pub async fn delete_tags<C: ConnectionTrait>(
    db: &C,
    resource_type: &str,
    resource_id: i32,
) -> Result<u64, DbErr> {
    delete_tags_for_resources(db, resource_type, &[resource_id]).await
}

/// Removes every tag association of the given resource instances.
pub async fn delete_tags_for_resources<C: ConnectionTrait>(
    db: &C,
    resource_type: &str,
    resource_ids: &[i32],
) -> Result<u64, DbErr> {
    if resource_ids.is_empty() {
        return Ok(0);
    }
    let result = resource_tag::Entity::delete_many()
        .filter(resource_tag::Column::ResourceType.eq(resource_type))
        .filter(resource_tag::Column::ResourceId.is_in(resource_ids.iter().copied()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
