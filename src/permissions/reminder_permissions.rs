use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};

use super::{Action, Actor, PermissionCheck, Role};
use crate::db::entities::reminder;
use crate::db::services::reminder_service;

/// Reminders are visible to staff and to their creator; only admins and the
/// creator may edit or delete them.
#[derive(Debug, Clone, Default)]
pub struct ReminderPermissions;

impl ReminderPermissions {
    /// Any authenticated role may create reminders for itself.
    pub fn may_create(&self, actor: &Actor) -> bool {
        matches!(actor.role, Role::Admin | Role::Team | Role::Client)
    }
}

#[async_trait]
impl PermissionCheck for ReminderPermissions {
    type Model = reminder::Model;

    async fn load(&self, db: &DatabaseConnection, id: i32) -> Result<Option<reminder::Model>, DbErr> {
        reminder_service::get_reminder_by_id(db, id).await
    }

    fn allows(&self, action: Action, model: &reminder::Model, actor: &Actor) -> bool {
        let is_creator = model.user_id == actor.id;
        match action {
            Action::View => is_creator || matches!(actor.role, Role::Admin | Role::Team),
            Action::EditDelete | Action::Delete => is_creator || actor.is_admin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn reminder_by(user_id: i32) -> reminder::Model {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        reminder::Model {
            id: 1,
            user_id,
            title: "Call back".to_string(),
            description: "Follow up on the quote".to_string(),
            reminder_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            resource_type: None,
            resource_id: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn creator_may_edit_and_delete() {
        let perms = ReminderPermissions;
        let actor = Actor { id: 7, role: Role::Team };
        assert!(perms.allows(Action::EditDelete, &reminder_by(7), &actor));
        assert!(perms.allows(Action::Delete, &reminder_by(7), &actor));
    }

    #[test]
    fn team_member_can_view_but_not_edit_others() {
        let perms = ReminderPermissions;
        let actor = Actor { id: 8, role: Role::Team };
        assert!(perms.allows(Action::View, &reminder_by(7), &actor));
        assert!(!perms.allows(Action::EditDelete, &reminder_by(7), &actor));
    }

    #[test]
    fn admin_may_do_anything() {
        let perms = ReminderPermissions;
        let actor = Actor { id: 1, role: Role::Admin };
        assert!(perms.allows(Action::View, &reminder_by(7), &actor));
        assert!(perms.allows(Action::EditDelete, &reminder_by(7), &actor));
    }

    #[test]
    fn client_only_sees_own() {
        let perms = ReminderPermissions;
        let actor = Actor { id: 9, role: Role::Client };
        assert!(!perms.allows(Action::View, &reminder_by(7), &actor));
        assert!(perms.allows(Action::View, &reminder_by(9), &actor));
        assert!(perms.may_create(&actor));
    }
}
