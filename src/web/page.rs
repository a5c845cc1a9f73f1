use serde::Serialize;

use crate::web::{localizer::Localizer, request::ParsedRequest};

/// Which variant of the reminders page is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// All reminders.
    Reminders,
    /// Reminders scoped to one CRM record.
    MyReminders,
    Create,
    Edit,
}

/// Settings the templates use to lay out the reminders pages.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageSettings {
    pub crumbs: Vec<String>,
    pub crumbs_special_class: String,
    pub page: String,
    pub no_results_message: String,
    pub mainmenu_reminders: String,
    pub sidepanel_id: String,
    pub dynamic_search_url: String,
    pub add_button_classes: String,
    pub load_more_button_route: String,
    pub source: String,
    pub add_modal_title: String,
    pub add_modal_create_url: String,
    pub add_modal_action_url: String,
    pub add_modal_action_ajax_class: String,
    pub add_modal_action_ajax_loading_target: String,
    pub add_modal_action_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_page_actions_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// `reminderresource_id=..&reminderresource_type=..`, carried through every
/// link so a scoped list stays scoped.
fn resource_query(req: &ParsedRequest) -> String {
    format!(
        "reminderresource_id={}&reminderresource_type={}",
        urlencoding::encode(req.get("reminderresource_id").unwrap_or_default()),
        urlencoding::encode(req.get("reminderresource_type").unwrap_or_default()),
    )
}

pub fn page_settings(section: Section, req: &ParsedRequest, l10n: &Localizer) -> PageSettings {
    let scope = resource_query(req);
    let mut page = PageSettings {
        crumbs: vec![l10n.t("reminders")],
        crumbs_special_class: "list-pages-crumbs".to_string(),
        page: "reminders".to_string(),
        no_results_message: l10n.t("no_results_found"),
        mainmenu_reminders: "active".to_string(),
        sidepanel_id: "sidepanel-filter-reminders".to_string(),
        dynamic_search_url: format!("/reminders/search?action=search&{scope}"),
        add_button_classes: "add-edit-reminder-button".to_string(),
        load_more_button_route: "reminders".to_string(),
        source: "list".to_string(),
        add_modal_title: l10n.t("add_reminder"),
        add_modal_create_url: format!("/reminders/create?{scope}"),
        add_modal_action_url: format!("/reminders?{scope}"),
        add_modal_action_ajax_class: String::new(),
        add_modal_action_ajax_loading_target: "commonModalBody".to_string(),
        add_modal_action_method: "POST".to_string(),
        meta_title: None,
        heading: None,
        list_page_actions_size: None,
        section: None,
    };

    let external = req.get("source") == Some("ext");
    match section {
        Section::Reminders | Section::MyReminders => {
            let title_key = if section == Section::Reminders { "reminders" } else { "my_reminders" };
            page.meta_title = Some(l10n.t(title_key));
            page.heading = Some(l10n.t(title_key));
            if external {
                page.list_page_actions_size = Some("col-lg-12".to_string());
            }
        }
        Section::Create => page.section = Some("create".to_string()),
        Section::Edit => page.section = Some("edit".to_string()),
    }
    page
}
