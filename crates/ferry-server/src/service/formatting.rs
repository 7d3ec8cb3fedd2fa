use std::sync::Arc;

use ferry_core::size::SizeFormatter;

/// Builds [`SizeFormatter`]s for request locales.
#[derive(Debug, Clone)]
pub struct SizeFormatting {
    default_locale: Arc<str>,
}

impl SizeFormatting {
    /// Creates a factory falling back to `default_locale`.
    pub fn new(default_locale: impl AsRef<str>) -> Self {
        Self {
            default_locale: Arc::from(default_locale.as_ref()),
        }
    }

    /// Returns the locale used when a request names none.
    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Returns a formatter for `locale`, or for the default locale.
    pub fn formatter(&self, locale: Option<&str>) -> SizeFormatter {
        let locale = locale
            .map(str::trim)
            .filter(|locale| !locale.is_empty())
            .unwrap_or(&self.default_locale);
        SizeFormatter::new(locale)
    }
}
