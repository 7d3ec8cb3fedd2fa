use std::path::PathBuf;
use std::sync::Arc;

use derive_more::Deref;
use ferry_core::mime::{Mime, MimeSniffer};

use crate::utility::TRACING_TARGET_SERVICE;

/// Shared [`MimeSniffer`] running detection on the blocking pool.
#[derive(Debug, Clone, Deref)]
pub struct MimeService {
    #[deref]
    sniffer: Arc<MimeSniffer>,
    sniff_downloads: bool,
}

impl MimeService {
    /// Wraps a sniffer.
    pub fn new(sniffer: MimeSniffer, sniff_downloads: bool) -> Self {
        Self {
            sniffer: Arc::new(sniffer),
            sniff_downloads,
        }
    }

    /// Returns whether downloads without a mime type are sniffed.
    pub fn sniff_downloads(&self) -> bool {
        self.sniff_downloads
    }

    /// Detects the mime type of `path`; `None` when the path does not exist.
    pub async fn detect(&self, path: PathBuf) -> Option<Mime> {
        let sniffer = Arc::clone(&self.sniffer);
        match tokio::task::spawn_blocking(move || sniffer.detect(&path)).await {
            Ok(detected) => detected,
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVICE,
                    error = %err,
                    "mime detection task failed"
                );
                None
            }
        }
    }

    /// Detects the mime type of a download, unless sniffing is disabled.
    pub async fn detect_for_download(&self, path: PathBuf) -> Option<Mime> {
        if self.sniff_downloads {
            self.detect(path).await
        } else {
            None
        }
    }
}
