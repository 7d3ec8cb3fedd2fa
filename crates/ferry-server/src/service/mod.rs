//! Application state and dependency injection.

mod config;
mod formatting;
mod mime;
mod storage;

use std::sync::Arc;

use ferry_core::mime::MimeSniffer;

pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::formatting::SizeFormatting;
pub use crate::service::mime::MimeService;
pub use crate::service::storage::StorageRoot;
use crate::transfer::DownloadTransfer;
use crate::transport::{OffloadTransporter, StreamingTransporter, TransportKind, Transporter};
use crate::utility::TRACING_TARGET_SERVICE;
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub storage_root: StorageRoot,
    pub mime_service: MimeService,
    pub size_formatting: SizeFormatting,
    pub download_transfer: DownloadTransfer,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Resolves the storage root, loads the system mime database and selects
    /// the transporter.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let root = tokio::fs::canonicalize(&config.storage_root)
            .await
            .map_err(|e| {
                Error::file_system(format!(
                    "cannot resolve storage root {}",
                    config.storage_root.display()
                ))
                .with_source(e)
            })?;

        let storage_root = StorageRoot::new(root);
        if !storage_root.is_available().await {
            return Err(Error::file_system(format!(
                "storage root {} is not a directory",
                storage_root.path().display()
            )));
        }

        let transporter: Arc<dyn Transporter> = match config.transport {
            TransportKind::Stream => Arc::new(StreamingTransporter::new(config.oversize_policy)),
            TransportKind::Offload => Arc::new(OffloadTransporter::new(config.offload_header()?)),
        };

        let download_transfer = DownloadTransfer::new(transporter)
            .with_legacy_clients(config.legacy_clients())
            .with_memory_limit(config.memory_limit);

        let sniffer = MimeSniffer::with_system_database(Some(config.mime_types_path.as_path()));

        tracing::info!(
            target: TRACING_TARGET_SERVICE,
            storage_root = %storage_root.path().display(),
            transport = %config.transport,
            memory_limit = %download_transfer.memory_limit(),
            detectors = ?sniffer.detector_names(),
            "service state initialized"
        );

        Ok(Self {
            storage_root,
            mime_service: MimeService::new(sniffer, config.sniff_downloads),
            size_formatting: SizeFormatting::new(&config.default_locale),
            download_transfer,
        })
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(storage_root: StorageRoot);
impl_di!(mime_service: MimeService);
impl_di!(size_formatting: SizeFormatting);
impl_di!(download_transfer: DownloadTransfer);

#[cfg(test)]
mod tests {
    use ferry_core::budget::MemoryLimit;
    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn builds_from_config() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let config = ServiceConfig::builder()
            .with_storage_root(dir.path())
            .with_transport(TransportKind::Offload)
            .with_memory_limit(MemoryLimit::Bytes(64 * 1024 * 1024))
            .build()?;

        let state = ServiceState::from_config(&config).await?;
        assert_eq!(state.storage_root.path(), dir.path().canonicalize()?);
        assert_eq!(state.download_transfer.transport_kind(), TransportKind::Offload);
        assert_eq!(
            state.download_transfer.memory_limit(),
            MemoryLimit::Bytes(64 * 1024 * 1024)
        );
        assert!(state.mime_service.sniff_downloads());
        Ok(())
    }

    #[tokio::test]
    async fn missing_storage_root_fails() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let config = ServiceConfig::builder()
            .with_storage_root(dir.path().join("missing"))
            .build()?;

        let err = ServiceState::from_config(&config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileSystem);
        Ok(())
    }

    #[tokio::test]
    async fn file_as_storage_root_fails() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x")?;

        let config = ServiceConfig::builder().with_storage_root(file).build()?;
        let err = ServiceState::from_config(&config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileSystem);
        Ok(())
    }
}
