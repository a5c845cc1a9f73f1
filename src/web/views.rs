use std::collections::BTreeMap;

use serde::Serialize;
use tera::{Context, Tera};

use crate::web::{error::AppError, localizer::Localizer};

/// Labels every template may use, translated per request.
const LABEL_KEYS: &[&str] = &[
    "reminders",
    "add_reminder",
    "edit_reminder",
    "no_results_found",
    "title",
    "description",
    "date",
    "tags",
    "actions",
    "save",
];

/// The compiled server-side templates.
pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("layout.html", include_str!("../../templates/layout.html")),
            ("reminders/wrapper.html", include_str!("../../templates/reminders/wrapper.html")),
            ("reminders/table.html", include_str!("../../templates/reminders/table.html")),
            ("reminders/rows.html", include_str!("../../templates/reminders/rows.html")),
            ("reminders/form.html", include_str!("../../templates/reminders/form.html")),
            ("reminders/form_page.html", include_str!("../../templates/reminders/form_page.html")),
            ("reminders/show.html", include_str!("../../templates/reminders/show.html")),
            ("reminders/show_page.html", include_str!("../../templates/reminders/show_page.html")),
        ])?;
        Ok(Views { tera })
    }

    /// Renders `template` with `data` (which must serialize to an object)
    /// plus the translated `lang` labels and the `locale`.
    pub fn render<T: Serialize>(&self, template: &str, data: &T, l10n: &Localizer) -> Result<String, AppError> {
        let mut ctx = Context::from_serialize(data)?;
        let labels: BTreeMap<&str, String> = LABEL_KEYS.iter().map(|key| (*key, l10n.t(key))).collect();
        ctx.insert("lang", &labels);
        ctx.insert("locale", l10n.locale());
        Ok(self.tera.render(template, &ctx)?)
    }
}
