//! Magic-number content inspection.

use std::path::Path;

use mime::Mime;

use super::Detector;
use crate::TRACING_TARGET_MIME;

/// Detects media types from the first bytes of a file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentSniffer;

impl Detector for ContentSniffer {
    fn name(&self) -> &'static str {
        "content"
    }

    fn detect(&self, path: &Path) -> Option<Mime> {
        match infer::get_from_path(path) {
            Ok(kind) => kind.and_then(|kind| kind.mime_type().parse().ok()),
            Err(err) => {
                tracing::debug!(
                    target: TRACING_TARGET_MIME,
                    path = %path.display(),
                    error = %err,
                    "content inspection failed"
                );
                None
            }
        }
    }
}
