//! Locale-aware formatting of byte counts.
//!
//! ```
//! use ferry_core::size::SizeFormatter;
//!
//! let formatter = SizeFormatter::new("pl_PL");
//! assert_eq!(formatter.format(Some(6587.0)), "6,43 kB");
//! assert_eq!(formatter.format(None), "-");
//! ```

use num_format::{Locale, ToFormattedString};

/// Unit labels, each with its leading space.
const UNITS: [&str; 6] = [" B", " kB", " MB", " GB", " TB", " PB"];

/// Default value returned for empty sizes.
pub const DEFAULT_EMPTY_VALUE: &str = "-";

/// Digits per group in every supported locale.
const GROUP_SIZE: usize = 3;

/// CLDR locales that only group numbers with at least two digits in the
/// leading group, so `1000` stays `1000` while `10000` becomes `10 000`.
const MIN_GROUPING_TWO: [&str; 3] = ["es", "pl", "pt-PT"];

/// Formats byte counts as `"<value> <unit>"` in a given locale.
#[derive(Debug, Clone)]
pub struct SizeFormatter {
    locale: Locale,
    empty_value: String,
}

impl SizeFormatter {
    /// Creates a formatter for the given locale name.
    ///
    /// Accepts POSIX (`pl_PL.UTF-8`) and BCP 47 (`pl-PL`) style names. Names
    /// without CLDR data fall back to their language, then to English.
    pub fn new(locale: &str) -> Self {
        Self {
            locale: resolve_locale(locale),
            empty_value: DEFAULT_EMPTY_VALUE.to_owned(),
        }
    }

    /// Sets the value returned for missing or zero sizes.
    pub fn with_empty_value(mut self, empty_value: impl Into<String>) -> Self {
        self.empty_value = empty_value.into();
        self
    }

    /// Returns the CLDR name of the resolved locale.
    pub fn locale_name(&self) -> &'static str {
        self.locale.name()
    }

    /// Formats `size` bytes.
    ///
    /// Whole byte counts under 1024 are printed without decimals, everything
    /// else is rounded to two decimals. Trailing fractional zeros are not
    /// printed. `None`, zero, negative and non-finite sizes yield the empty
    /// value.
    pub fn format(&self, size: Option<f64>) -> String {
        let Some(size) = size.filter(|size| size.is_finite() && *size > 0.0) else {
            return self.empty_value.clone();
        };

        let precision = if size.fract() == 0.0 && size < 1024.0 {
            0
        } else {
            2
        };

        // floor(log1024(size)), clamped to the unit table.
        let mut scaled = size;
        let mut index = 0;
        while scaled >= 1024.0 && index < UNITS.len() - 1 {
            scaled /= 1024.0;
            index += 1;
        }

        let rounded = round_to(scaled, precision);

        format!("{}{}", self.render(rounded, precision), UNITS[index])
    }

    /// Returns how many digits the leading group needs before grouping
    /// separators are inserted.
    fn min_grouping_digits(&self) -> usize {
        if MIN_GROUPING_TWO.contains(&self.locale.name()) {
            2
        } else {
            1
        }
    }

    /// Renders an already rounded value with the locale separators.
    fn render(&self, value: f64, precision: usize) -> String {
        let fixed = format!("{value:.precision$}");
        let (integer, fraction) = fixed.split_once('.').unwrap_or((&fixed, ""));

        let grouped = match integer.parse::<u64>() {
            Ok(number) if integer.len() >= GROUP_SIZE + self.min_grouping_digits() => {
                number.to_formatted_string(&self.locale)
            }
            _ => integer.to_owned(),
        };

        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            grouped
        } else {
            format!("{grouped}{}{fraction}", self.locale.decimal())
        }
    }
}

impl Default for SizeFormatter {
    fn default() -> Self {
        Self::new("en")
    }
}

/// Formats `size` bytes in `locale`, returning `empty_value` for empty sizes.
pub fn format_file_size(size: Option<f64>, locale: &str, empty_value: &str) -> String {
    SizeFormatter::new(locale)
        .with_empty_value(empty_value)
        .format(size)
}

/// Rounds half away from zero to `precision` decimals.
fn round_to(value: f64, precision: usize) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Resolves a POSIX or BCP 47 locale name to CLDR data.
fn resolve_locale(name: &str) -> Locale {
    let name = name
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .replace('_', "-");

    if let Ok(locale) = Locale::from_name(&name) {
        return locale;
    }

    name.split('-')
        .next()
        .and_then(|language| Locale::from_name(language).ok())
        .unwrap_or(Locale::en)
}
