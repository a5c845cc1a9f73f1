//! Input rules for the reminder form.
//!
//! Rules run field by field in declaration order; the first failing rule of a
//! field produces its message and the remaining rules of that field are
//! skipped. All messages end up in one `<li>` list.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::db::services::reminder_service::ReminderInput;
use crate::web::{
    error::AppError,
    localizer::Localizer,
    request::{InputValue, ParsedRequest},
};

// An unclosed opener counts as a tag running to the end of the value.
static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z!?/][^>]*(?:>|$)").expect("HTML tag pattern is valid"));

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether a value carries markup (anything a tag stripper would remove).
pub fn has_html(value: &str) -> bool {
    HTML_TAG.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Required,
    NoHtml,
    Date,
    /// Optional; when present it must be a list.
    OptionalList,
    /// Every list element must be free of markup.
    ListNoHtml,
}

const REMINDER_RULES: &[(&str, &[Rule])] = &[
    ("reminder_title", &[Rule::Required, Rule::NoHtml]),
    ("reminder_description", &[Rule::Required]),
    ("reminder_date", &[Rule::Required, Rule::Date]),
    ("tags", &[Rule::OptionalList, Rule::ListNoHtml]),
];

enum Outcome {
    Pass,
    /// Field is absent and optional: skip its remaining rules.
    Skip,
    Fail(String),
}

/// Elements of a list field. Indexed keys (`tags[0]=a`) arrive as a map
/// and count as a list of their values.
fn list_items(value: &InputValue) -> Option<Vec<&str>> {
    match value {
        InputValue::List(items) => Some(items.iter().map(String::as_str).collect()),
        InputValue::Map(entries) => Some(entries.iter().map(|(_, v)| v.as_str()).collect()),
        InputValue::Scalar(_) => None,
    }
}

fn attribute(l10n: &Localizer, field: &str) -> String {
    l10n.t(&format!("attribute_{field}"))
}

fn apply(rule: Rule, field: &str, req: &ParsedRequest, l10n: &Localizer) -> Outcome {
    let attr = || attribute(l10n, field);
    match rule {
        Rule::Required => match req.get(field) {
            Some(_) => Outcome::Pass,
            None => Outcome::Fail(l10n.t_with("validation_required", &[("attribute", &attr())])),
        },
        Rule::NoHtml => match req.get(field) {
            Some(value) if has_html(value) => {
                Outcome::Fail(l10n.t_with("validation_no_html", &[("attribute", &attr())]))
            }
            _ => Outcome::Pass,
        },
        Rule::Date => match req.get(field) {
            Some(value) if NaiveDate::parse_from_str(value, DATE_FORMAT).is_err() => {
                Outcome::Fail(l10n.t_with("validation_date", &[("attribute", &attr())]))
            }
            _ => Outcome::Pass,
        },
        Rule::OptionalList => match req.value(field) {
            None => Outcome::Skip,
            Some(InputValue::Scalar(s)) if s.trim().is_empty() => Outcome::Skip,
            Some(value) if list_items(value).is_some() => Outcome::Pass,
            Some(_) => Outcome::Fail(l10n.t_with("validation_array", &[("attribute", &attr())])),
        },
        Rule::ListNoHtml => match req.value(field).and_then(list_items) {
            Some(items) if items.iter().any(|item| has_html(item)) => Outcome::Fail(l10n.t("tags_no_html")),
            _ => Outcome::Pass,
        },
    }
}

/// Runs every reminder rule and returns the failure messages in rule order.
pub fn reminder_errors(req: &ParsedRequest, l10n: &Localizer) -> Vec<String> {
    let mut messages = Vec::new();
    for (field, rules) in REMINDER_RULES {
        for rule in *rules {
            match apply(*rule, field, req, l10n) {
                Outcome::Pass => continue,
                Outcome::Skip => break,
                Outcome::Fail(message) => {
                    messages.push(message);
                    break;
                }
            }
        }
    }
    messages
}

/// Renders messages as the flat `<li>` blob error responses carry.
pub fn message_list(messages: &[String]) -> String {
    messages.iter().map(|m| format!("<li>{m}</li>")).collect()
}

/// A reminder form that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedReminder {
    pub input: ReminderInput,
    pub tags: Vec<String>,
}

/// Validates the reminder form, or fails with every message aggregated.
pub fn validate_reminder(req: &ParsedRequest, l10n: &Localizer) -> Result<ValidatedReminder, AppError> {
    let messages = reminder_errors(req, l10n);
    if !messages.is_empty() {
        return Err(AppError::Validation(message_list(&messages)));
    }

    let (Some(title), Some(description), Some(date)) = (
        req.get("reminder_title"),
        req.get("reminder_description"),
        req.get("reminder_date"),
    ) else {
        return Err(AppError::InternalServerError(
            "validated reminder is missing a required field".to_string(),
        ));
    };
    let reminder_date = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| AppError::InternalServerError(format!("validated date failed to parse: {e}")))?;

    let tags = req
        .value("tags")
        .and_then(list_items)
        .map(|items| items.into_iter().map(str::to_string).collect())
        .unwrap_or_default();

    Ok(ValidatedReminder {
        input: ReminderInput {
            title: title.to_string(),
            description: description.to_string(),
            reminder_date,
            resource_type: req.get("reminderresource_type").map(str::to_string),
            resource_id: req.get_i32("reminderresource_id"),
        },
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};

    fn form(body: &str) -> ParsedRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        ParsedRequest::from_parts(&headers, None, body.as_bytes()).unwrap()
    }

    #[test]
    fn detects_markup() {
        assert!(has_html("<script>alert(1)</script>"));
        assert!(has_html("hello <b>world</b>"));
        assert!(has_html("</div>"));
        assert!(has_html("<img src=x onerror=alert(1)"));
        assert!(has_html("<script"));
        assert!(has_html("note <b"));
        assert!(!has_html("a < b and c > d"));
        assert!(!has_html("plain text"));
        assert!(!has_html("x <3 y"));
    }

    #[test]
    fn every_missing_field_is_reported_in_rule_order() {
        let l10n = Localizer::new("en");
        let messages = reminder_errors(&form(""), &l10n);
        assert_eq!(
            messages,
            vec![
                "The reminder title field is required.",
                "The reminder description field is required.",
                "The reminder date field is required.",
            ]
        );
    }

    #[test]
    fn one_message_per_field() {
        let l10n = Localizer::new("en");
        let messages = reminder_errors(
            &form("reminder_title=%3Cb%3Ehi%3C%2Fb%3E&reminder_description=d&reminder_date=tomorrow"),
            &l10n,
        );
        assert_eq!(
            messages,
            vec![
                "The reminder title field cannot contain HTML.",
                "The reminder date is not a valid date.",
            ]
        );
    }

    #[test]
    fn tag_with_markup_fails_once() {
        let l10n = Localizer::new("en");
        let req = form(
            "reminder_title=t&reminder_description=d&reminder_date=2024-05-01\
             &tags%5B%5D=%3Cscript%3E&tags%5B%5D=%3Ci%3Ex%3C%2Fi%3E",
        );
        assert_eq!(reminder_errors(&req, &l10n), vec!["Tags cannot contain HTML"]);
    }

    #[test]
    fn scalar_tags_are_not_a_list() {
        let l10n = Localizer::new("en");
        let req = form("reminder_title=t&reminder_description=d&reminder_date=2024-05-01&tags=x");
        assert_eq!(reminder_errors(&req, &l10n), vec!["The tags must be a list."]);
    }

    #[test]
    fn indexed_tags_are_a_list() {
        let l10n = Localizer::new("en");
        let req = form(
            "reminder_title=t&reminder_description=d&reminder_date=2024-05-01\
             &tags%5B0%5D=sales&tags%5B1%5D=billing",
        );
        let validated = validate_reminder(&req, &l10n).unwrap();
        assert_eq!(validated.tags, vec!["sales", "billing"]);

        let req = form(
            "reminder_title=t&reminder_description=d&reminder_date=2024-05-01&tags%5B0%5D=%3Cb",
        );
        assert_eq!(reminder_errors(&req, &l10n), vec!["Tags cannot contain HTML"]);
    }

    #[test]
    fn aggregated_blob_is_a_flat_list() {
        let l10n = Localizer::new("en");
        let err = validate_reminder(&form("reminder_title=t"), &l10n).unwrap_err();
        match err {
            AppError::Validation(blob) => assert_eq!(
                blob,
                "<li>The reminder description field is required.</li>\
                 <li>The reminder date field is required.</li>"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn valid_form_produces_input() {
        let l10n = Localizer::new("en");
        let req = form(
            "reminder_title=+Call+Bob+&reminder_description=About+the+quote&reminder_date=2024-05-01\
             &tags%5B%5D=sales&reminderresource_type=project&reminderresource_id=12",
        );
        let validated = validate_reminder(&req, &l10n).unwrap();
        assert_eq!(validated.input.title, "Call Bob");
        assert_eq!(validated.input.reminder_date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(validated.input.resource_type.as_deref(), Some("project"));
        assert_eq!(validated.input.resource_id, Some(12));
        assert_eq!(validated.tags, vec!["sales"]);
    }
}
