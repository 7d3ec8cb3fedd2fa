//! Platform `mime.types` database lookup.

use std::collections::HashMap;
use std::path::Path;
use std::{fs, io};

use mime::Mime;

use super::{Detector, extension_of};
use crate::TRACING_TARGET_MIME;

/// Location of the `mime.types` database on most Unix systems.
pub const DEFAULT_MIME_TYPES_PATH: &str = "/etc/mime.types";

/// Extension lookup backed by a `mime.types` file.
///
/// Each non-comment line holds a media type followed by the extensions that
/// map to it. The first type listed for an extension wins.
#[derive(Debug, Clone, Default)]
pub struct SystemMimeTypes {
    by_extension: HashMap<String, Mime>,
}

impl SystemMimeTypes {
    /// Parses the contents of a `mime.types` file. Malformed entries are
    /// skipped.
    pub fn parse(contents: &str) -> Self {
        let mut by_extension = HashMap::new();

        for line in contents.lines() {
            let line = line.split('#').next().unwrap_or_default();
            let mut fields = line.split_whitespace();
            let Some(mime) = fields.next().and_then(|m| m.parse::<Mime>().ok()) else {
                continue;
            };

            for extension in fields {
                by_extension
                    .entry(extension.to_ascii_lowercase())
                    .or_insert_with(|| mime.clone());
            }
        }

        Self { by_extension }
    }

    /// Reads and parses the database at `path`.
    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Reads the database at `path`, returning `None` when it is missing or
    /// unreadable.
    pub fn load_if_present(path: &Path) -> Option<Self> {
        match Self::load(path) {
            Ok(database) => {
                tracing::debug!(
                    target: TRACING_TARGET_MIME,
                    path = %path.display(),
                    extensions = database.len(),
                    "loaded system mime database"
                );
                Some(database)
            }
            Err(err) => {
                tracing::debug!(
                    target: TRACING_TARGET_MIME,
                    path = %path.display(),
                    error = %err,
                    "system mime database unavailable"
                );
                None
            }
        }
    }

    /// Returns the number of known extensions.
    pub fn len(&self) -> usize {
        self.by_extension.len()
    }

    /// Returns whether the database is empty.
    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

impl Detector for SystemMimeTypes {
    fn name(&self) -> &'static str {
        "system"
    }

    fn detect(&self, path: &Path) -> Option<Mime> {
        let extension = extension_of(path)?;
        self.by_extension.get(&extension).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATABASE: &str = "\
# comment line
application/pdf                 pdf
text/plain                      txt text conf # trailing comment
text/x-duplicate                txt
not-a-mime
image/jpeg                      jpeg jpg JPE
";

    #[test]
    fn parse_skips_comments_and_malformed_lines() {
        let database = SystemMimeTypes::parse(DATABASE);
        assert_eq!(database.len(), 7);
    }

    #[test]
    fn first_entry_wins() {
        let database = SystemMimeTypes::parse(DATABASE);
        let mime = database.detect(Path::new("/tmp/readme.TXT")).unwrap();
        assert_eq!(mime, mime::TEXT_PLAIN);
    }

    #[test]
    fn unknown_extension_is_none() {
        let database = SystemMimeTypes::parse(DATABASE);
        assert!(database.detect(Path::new("/tmp/archive.tar")).is_none());
        assert!(database.detect(Path::new("/tmp/Makefile")).is_none());
    }

    #[test]
    fn missing_database_is_none() {
        assert!(SystemMimeTypes::load_if_present(Path::new("/nonexistent/mime.types")).is_none());
    }
}
