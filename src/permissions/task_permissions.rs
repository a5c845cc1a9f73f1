use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};

use super::{Action, Actor, PermissionCheck};
use crate::db::entities::task;
use crate::db::services::task_service;

#[derive(Debug, Clone, Default)]
pub struct TaskPermissions;

#[async_trait]
impl PermissionCheck for TaskPermissions {
    type Model = task::Model;

    async fn load(&self, db: &DatabaseConnection, id: i32) -> Result<Option<task::Model>, DbErr> {
        task_service::get_task_by_id(db, id).await
    }

    fn allows(&self, action: Action, model: &task::Model, actor: &Actor) -> bool {
        match action {
            Action::View => true,
            Action::EditDelete | Action::Delete => actor.is_admin() || model.creator_id == actor.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Role;
    use chrono::{TimeZone, Utc};

    fn task_by(creator_id: i32) -> task::Model {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        task::Model {
            id: 4,
            creator_id,
            title: "Prepare invoice".to_string(),
            description: String::new(),
            due_date: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn only_admin_or_creator_may_delete() {
        let perms = TaskPermissions;
        let creator = Actor { id: 3, role: Role::Client };
        let other = Actor { id: 4, role: Role::Team };
        let admin = Actor { id: 1, role: Role::Admin };

        assert!(perms.allows(Action::Delete, &task_by(3), &creator));
        assert!(!perms.allows(Action::Delete, &task_by(3), &other));
        assert!(perms.allows(Action::Delete, &task_by(3), &admin));
        assert!(perms.allows(Action::View, &task_by(3), &other));
    }
}
