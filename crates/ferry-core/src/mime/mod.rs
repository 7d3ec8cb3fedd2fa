//! Media type detection with a layered fallback chain.
//!
//! [`MimeSniffer`] asks an ordered list of [`Detector`]s for the media type of
//! a file. The first detector that answers wins, except that later detectors
//! may replace an answer they know to be too generic (see
//! [`Detector::overrides`]). When nothing answers, the generic
//! `application/octet-stream` type is returned.
//!
//! The default chain is:
//!
//! 1. [`ContentSniffer`]: magic numbers at the head of the file.
//! 2. [`SystemMimeTypes`]: the platform `mime.types` database, if installed.
//! 3. [`ExtensionTable`]: corrections for container formats that content
//!    inspection reports as plain ZIP archives (office documents, 7z).

mod content;
mod extension;
mod system;

use std::fmt;
use std::path::Path;

pub use content::ContentSniffer;
pub use extension::ExtensionTable;
pub use mime::Mime;
pub use system::{DEFAULT_MIME_TYPES_PATH, SystemMimeTypes};

use crate::TRACING_TARGET_MIME;

/// A single media type detection strategy.
pub trait Detector: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the media type of the file at `path`, if this strategy can
    /// tell. Detection never fails; problems degrade to `None`.
    fn detect(&self, path: &Path) -> Option<Mime>;

    /// Returns whether this detector should run even though an earlier one
    /// already produced `current`.
    fn overrides(&self, _current: &Mime) -> bool {
        false
    }
}

/// Ordered chain of [`Detector`]s.
#[derive(Debug)]
pub struct MimeSniffer {
    detectors: Vec<Box<dyn Detector>>,
}

impl MimeSniffer {
    /// Creates a sniffer without any detector.
    ///
    /// Such a sniffer reports `application/octet-stream` for every existing
    /// file.
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Appends a detector to the end of the chain.
    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// Creates the default chain, reading the system `mime.types` database
    /// from `mime_types` when it exists.
    pub fn with_system_database(mime_types: Option<&Path>) -> Self {
        let mut sniffer = Self::new().with_detector(ContentSniffer);

        if let Some(system) = mime_types.and_then(SystemMimeTypes::load_if_present) {
            sniffer = sniffer.with_detector(system);
        }

        sniffer.with_detector(ExtensionTable)
    }

    /// Returns the names of the configured detectors in chain order.
    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Detects the media type of the file at `path`.
    ///
    /// Returns `None` only when the path does not exist.
    pub fn detect(&self, path: &Path) -> Option<Mime> {
        if !path.exists() {
            tracing::debug!(
                target: TRACING_TARGET_MIME,
                path = %path.display(),
                "skipping mime detection for missing path"
            );
            return None;
        }

        let mut found: Option<Mime> = None;
        for detector in &self.detectors {
            let should_run = match &found {
                None => true,
                Some(current) => detector.overrides(current),
            };

            if !should_run {
                continue;
            }

            if let Some(mime) = detector.detect(path) {
                tracing::trace!(
                    target: TRACING_TARGET_MIME,
                    path = %path.display(),
                    detector = detector.name(),
                    mime = %mime,
                    "detector answered"
                );
                found = Some(mime);
            }
        }

        let mime = found.unwrap_or(mime::APPLICATION_OCTET_STREAM);
        tracing::debug!(
            target: TRACING_TARGET_MIME,
            path = %path.display(),
            mime = %mime,
            "detected mime type"
        );

        Some(mime)
    }
}

impl Default for MimeSniffer {
    fn default() -> Self {
        Self::with_system_database(Some(Path::new(DEFAULT_MIME_TYPES_PATH)))
    }
}

/// Returns the lowercase extension of `path`.
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
