//! `Content-Disposition` header values for downloads.
//!
//! Legacy browsers cannot parse quoted UTF-8 filenames, so clients whose user
//! agent contains one of the configured legacy tokens receive a form-encoded
//! filename instead.

use std::fmt;
use std::time::SystemTime;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// User agent token identifying legacy Internet Explorer releases.
pub const DEFAULT_LEGACY_TOKEN: &str = "MSIE";

/// Format of the `modification-date` parameter (RFC 1123, always GMT).
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Matches user agents that need the legacy filename encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyClients {
    tokens: Vec<String>,
}

impl LegacyClients {
    /// Creates a matcher for the given user agent substrings.
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|token: &String| !token.is_empty())
                .collect(),
        }
    }

    /// Returns the configured tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns whether `user_agent` contains any legacy token.
    pub fn matches(&self, user_agent: Option<&str>) -> bool {
        let Some(user_agent) = user_agent else {
            return false;
        };

        self.tokens
            .iter()
            .any(|token| user_agent.contains(token.as_str()))
    }

    /// Picks the filename encoding for a client.
    pub fn encoding_for(&self, user_agent: Option<&str>) -> FilenameEncoding {
        if self.matches(user_agent) {
            FilenameEncoding::FormEncoded
        } else {
            FilenameEncoding::Quoted
        }
    }
}

impl Default for LegacyClients {
    fn default() -> Self {
        Self::new([DEFAULT_LEGACY_TOKEN])
    }
}

/// How the filename parameter is written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FilenameEncoding {
    /// `filename="name"`, the literal name in quotes.
    #[default]
    Quoted,
    /// `filename=name` with the name form-encoded (`%XX`, space as `+`).
    FormEncoded,
}

/// An `attachment` disposition with filename and modification date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    filename: String,
    modified: Timestamp,
    encoding: FilenameEncoding,
}

impl ContentDisposition {
    /// Creates an attachment disposition.
    pub fn attachment(filename: impl Into<String>, modified: Timestamp) -> Self {
        Self {
            filename: filename.into(),
            modified,
            encoding: FilenameEncoding::default(),
        }
    }

    /// Sets the filename encoding.
    pub fn with_encoding(mut self, encoding: FilenameEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns the modification date as an RFC 1123 string.
    pub fn modification_date(&self) -> String {
        self.modified.strftime(HTTP_DATE_FORMAT).to_string()
    }

    fn filename_param(&self) -> String {
        match self.encoding {
            FilenameEncoding::FormEncoded => {
                url::form_urlencoded::byte_serialize(self.filename.as_bytes()).collect()
            }
            FilenameEncoding::Quoted => {
                let mut quoted = String::with_capacity(self.filename.len() + 2);
                quoted.push('"');
                for ch in self.filename.chars().filter(|ch| !ch.is_control()) {
                    if matches!(ch, '"' | '\\') {
                        quoted.push('\\');
                    }
                    quoted.push(ch);
                }
                quoted.push('"');
                quoted
            }
        }
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attachment; filename={}; modification-date=\"{}\";",
            self.filename_param(),
            self.modification_date()
        )
    }
}

/// Converts a file modification time, falling back to the current time when
/// the platform reports none or one out of range.
pub fn modified_or_now(modified: Option<SystemTime>) -> Timestamp {
    modified
        .and_then(|time| Timestamp::try_from(time).ok())
        .unwrap_or_else(Timestamp::now)
}
