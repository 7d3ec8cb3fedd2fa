//! Transfer requests and strategy selection.

use std::path::{Path, PathBuf};

use mime::Mime;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::budget::CHUNK_THRESHOLD;

/// A single file download request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "requests do nothing unless transferred"]
pub struct TransferRequest {
    file_path: PathBuf,
    display_name: String,
    mime_type: Option<Mime>,
    declared_size: Option<u64>,
}

impl TransferRequest {
    /// Creates a request for `file_path`, shown to the client as
    /// `display_name`.
    pub fn new(file_path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            display_name: display_name.into(),
            mime_type: None,
            declared_size: None,
        }
    }

    /// Overrides the `Content-Type` of the download.
    pub fn with_mime_type(mut self, mime_type: Mime) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    /// Declares the file size instead of reading it from the filesystem.
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    /// Returns the path of the file on the server.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Returns the client-visible filename.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the mime type override.
    pub fn mime_type(&self) -> Option<&Mime> {
        self.mime_type.as_ref()
    }

    /// Returns the declared size.
    pub fn declared_size(&self) -> Option<u64> {
        self.declared_size
    }
}

/// How the body of a download is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferStrategy {
    /// The fronting web server sends the file.
    Offload,
    /// The whole file is read and written in one operation.
    SingleShot,
    /// The file is streamed in chunks of [`CHUNK_THRESHOLD`] bytes.
    Chunked,
}

impl TransferStrategy {
    /// Picks the in-process strategy for a body of `size` bytes.
    #[must_use]
    pub const fn in_process(size: u64) -> Self {
        Self::in_process_with_threshold(size, CHUNK_THRESHOLD)
    }

    /// Picks the in-process strategy for a body of `size` bytes with a
    /// custom chunk threshold.
    #[must_use]
    pub const fn in_process_with_threshold(size: u64, threshold: u64) -> Self {
        if size > threshold {
            Self::Chunked
        } else {
            Self::SingleShot
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_threshold_boundary() {
        assert_eq!(TransferStrategy::in_process(0), TransferStrategy::SingleShot);
        assert_eq!(
            TransferStrategy::in_process(CHUNK_THRESHOLD),
            TransferStrategy::SingleShot
        );
        assert_eq!(
            TransferStrategy::in_process(CHUNK_THRESHOLD + 1),
            TransferStrategy::Chunked
        );
    }

    #[test]
    fn request_builder() {
        let request = TransferRequest::new("/srv/files/abc", "report.pdf")
            .with_mime_type(mime::APPLICATION_PDF)
            .with_declared_size(42);

        assert_eq!(request.file_path(), Path::new("/srv/files/abc"));
        assert_eq!(request.display_name(), "report.pdf");
        assert_eq!(request.mime_type(), Some(&mime::APPLICATION_PDF));
        assert_eq!(request.declared_size(), Some(42));
    }

    #[test]
    fn strategy_names() {
        assert_eq!(TransferStrategy::SingleShot.as_ref(), "single_shot");
        assert_eq!(TransferStrategy::Offload.to_string(), "offload");
    }
}
