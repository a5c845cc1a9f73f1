//! Capability checks: "may this actor perform this action on this entity?"
//!
//! Each resource type implements [`PermissionCheck`] over its own model. The
//! [`PermissionRegistry`] maps a [`Resource`] to its checker so callers that
//! only hold a raw id (the bulk-action gate) can ask the same question.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};

pub mod reminder_permissions;
pub mod task_permissions;

pub use reminder_permissions::ReminderPermissions;
pub use task_permissions::TaskPermissions;

/// What the actor wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    EditDelete,
    Delete,
}

/// The CRUD-managed resource types that carry per-row permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Reminder,
    Task,
}

impl Resource {
    /// Name used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Reminder => "reminders",
            Resource::Task => "tasks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Team,
    Client,
}

impl Role {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "client" => Role::Client,
            _ => Role::Team,
        }
    }
}

/// The user on whose behalf a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Either an entity already in hand or a raw id still to be resolved.
#[derive(Debug)]
pub enum EntityRef<'a, M> {
    Loaded(&'a M),
    Id(i32),
}

#[async_trait]
pub trait PermissionCheck: Send + Sync {
    type Model: Send + Sync;

    /// Loads the entity a raw id refers to.
    async fn load(&self, db: &DatabaseConnection, id: i32) -> Result<Option<Self::Model>, DbErr>;

    /// The rule table for this resource.
    fn allows(&self, action: Action, model: &Self::Model, actor: &Actor) -> bool;

    /// Checks an action against a loaded entity or an id. An id that does not
    /// resolve is never permitted.
    async fn check(
        &self,
        db: &DatabaseConnection,
        action: Action,
        target: EntityRef<'_, Self::Model>,
        actor: &Actor,
    ) -> Result<bool, DbErr> {
        match target {
            EntityRef::Loaded(model) => Ok(self.allows(action, model, actor)),
            EntityRef::Id(id) => Ok(self
                .load(db, id)
                .await?
                .is_some_and(|model| self.allows(action, &model, actor))),
        }
    }
}

/// Lookup table from resource type to its permission checker.
#[derive(Debug, Clone, Default)]
pub struct PermissionRegistry {
    pub reminders: ReminderPermissions,
    pub tasks: TaskPermissions,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the entity behind `id` still exists.
    pub async fn exists(&self, db: &DatabaseConnection, resource: Resource, id: i32) -> Result<bool, DbErr> {
        match resource {
            Resource::Reminder => Ok(self.reminders.load(db, id).await?.is_some()),
            Resource::Task => Ok(self.tasks.load(db, id).await?.is_some()),
        }
    }

    /// Checks `action` on the entity behind `id`.
    pub async fn check_id(
        &self,
        db: &DatabaseConnection,
        resource: Resource,
        action: Action,
        id: i32,
        actor: &Actor,
    ) -> Result<bool, DbErr> {
        match resource {
            Resource::Reminder => self.reminders.check(db, action, EntityRef::Id(id), actor).await,
            Resource::Task => self.tasks.check(db, action, EntityRef::Id(id), actor).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_defaults_to_team() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse(" Client "), Role::Client);
        assert_eq!(Role::parse("team"), Role::Team);
        assert_eq!(Role::parse("contractor"), Role::Team);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"client\"").unwrap();
        assert_eq!(role, Role::Client);
    }
}
