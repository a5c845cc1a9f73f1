use rust_i18n::t;

/// Translates message keys for one request's locale.
///
/// Resolved once per request by the i18n middleware and passed along as a
/// request extension, so nothing depends on a process-wide current locale.
#[derive(Debug, Clone)]
pub struct Localizer {
    locale: String,
}

impl Default for Localizer {
    fn default() -> Self {
        Localizer::new("en")
    }
}

impl Localizer {
    pub fn new(locale: impl Into<String>) -> Self {
        Localizer { locale: locale.into() }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn t(&self, key: &str) -> String {
        t!(key, locale = self.locale.as_str()).to_string()
    }

    /// Translates and substitutes `%{name}` placeholders.
    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut message = self.t(key);
        for (name, value) in args {
            message = message.replace(&format!("%{{{name}}}"), value);
        }
        message
    }
}
