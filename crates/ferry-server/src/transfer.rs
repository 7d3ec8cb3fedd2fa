//! Download orchestration.
//!
//! [`DownloadTransfer`] validates the requested file, builds the
//! `Content-Type` and `Content-Disposition` headers and hands the opened file
//! to the configured [`Transporter`]. Every failure happens before a response
//! exists, so a caller either gets a complete [`TransferOutcome`] or nothing
//! at all.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use ferry_core::budget::{MemoryAdjustment, MemoryLimit, ResourceBudget};
use ferry_core::disposition::{ContentDisposition, LegacyClients, modified_or_now};
use ferry_core::file::ResolvedFile;
use ferry_core::transfer::{TransferRequest, TransferStrategy};
use ferry_core::{Error, Result};

use crate::middleware::SkipCompression;
use crate::transport::{TransportKind, Transporter};
use crate::utility::TRACING_TARGET_TRANSFER;

/// Serves single files through a [`Transporter`].
#[derive(Debug, Clone)]
pub struct DownloadTransfer {
    transporter: Arc<dyn Transporter>,
    legacy_clients: LegacyClients,
    memory_limit: MemoryLimit,
}

impl DownloadTransfer {
    /// Creates a transfer using `transporter`, the default legacy client
    /// tokens and the default memory limit.
    pub fn new(transporter: Arc<dyn Transporter>) -> Self {
        Self {
            transporter,
            legacy_clients: LegacyClients::default(),
            memory_limit: MemoryLimit::default(),
        }
    }

    /// Sets the user agents that receive form-encoded filenames.
    pub fn with_legacy_clients(mut self, legacy_clients: LegacyClients) -> Self {
        self.legacy_clients = legacy_clients;
        self
    }

    /// Sets the memory limit each transfer budget starts from.
    pub fn with_memory_limit(mut self, memory_limit: MemoryLimit) -> Self {
        self.memory_limit = memory_limit;
        self
    }

    /// Returns the kind of the configured transporter.
    pub fn transport_kind(&self) -> TransportKind {
        self.transporter.kind()
    }

    /// Returns the memory limit each transfer budget starts from.
    pub fn memory_limit(&self) -> MemoryLimit {
        self.memory_limit
    }

    /// Validates `request` and produces the download response.
    ///
    /// `user_agent` selects the filename encoding of the
    /// `Content-Disposition` header.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::FileNotFound`] when the file does not exist.
    /// - [`ErrorKind::FileNotReadable`] when it is not a readable regular file.
    /// - [`ErrorKind::FileTooLarge`] when the oversize policy rejects it.
    /// - [`ErrorKind::Io`] when a small file cannot be read.
    ///
    /// [`ErrorKind::FileNotFound`]: ferry_core::ErrorKind::FileNotFound
    /// [`ErrorKind::FileNotReadable`]: ferry_core::ErrorKind::FileNotReadable
    /// [`ErrorKind::FileTooLarge`]: ferry_core::ErrorKind::FileTooLarge
    /// [`ErrorKind::Io`]: ferry_core::ErrorKind::Io
    pub async fn transfer(
        &self,
        request: TransferRequest,
        user_agent: Option<&str>,
    ) -> Result<TransferOutcome> {
        let file = ResolvedFile::open(request.file_path()).await?;

        let mut headers = HeaderMap::new();

        let content_type = request
            .mime_type()
            .cloned()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);
        let content_type = HeaderValue::from_str(content_type.as_ref())
            .map_err(|err| Error::io("invalid content type").with_source(err))?;
        headers.insert(header::CONTENT_TYPE, content_type);

        let disposition =
            ContentDisposition::attachment(request.display_name(), modified_or_now(file.modified()))
                .with_encoding(self.legacy_clients.encoding_for(user_agent));
        let disposition = HeaderValue::from_bytes(disposition.to_string().as_bytes())
            .map_err(|err| Error::io("invalid content disposition").with_source(err))?;
        headers.insert(header::CONTENT_DISPOSITION, disposition);

        let mut budget = ResourceBudget::new(self.memory_limit);
        let delivery = self
            .transporter
            .deliver(file, request.declared_size(), &mut headers, &mut budget)
            .await?;

        tracing::info!(
            target: TRACING_TARGET_TRANSFER,
            path = %request.file_path().display(),
            strategy = %delivery.strategy,
            size = delivery.size,
            compression = budget.compression(),
            "download prepared"
        );

        Ok(TransferOutcome {
            strategy: delivery.strategy,
            size: delivery.size,
            budget,
            adjustment: delivery.adjustment,
            headers,
            body: delivery.body,
        })
    }
}

/// A download whose headers and body have been produced.
#[must_use = "outcomes do nothing unless turned into a response"]
pub struct TransferOutcome {
    strategy: TransferStrategy,
    size: Option<u64>,
    budget: ResourceBudget,
    adjustment: Option<MemoryAdjustment>,
    headers: HeaderMap,
    body: Body,
}

impl TransferOutcome {
    /// Returns how the body is delivered.
    pub fn strategy(&self) -> TransferStrategy {
        self.strategy
    }

    /// Returns the resolved size, for in-process transfers.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Returns the budget after adaptation.
    pub fn budget(&self) -> &ResourceBudget {
        &self.budget
    }

    /// Returns the memory limit change made for this transfer.
    pub fn adjustment(&self) -> Option<MemoryAdjustment> {
        self.adjustment
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl fmt::Debug for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferOutcome")
            .field("strategy", &self.strategy)
            .field("size", &self.size)
            .field("budget", &self.budget)
            .field("adjustment", &self.adjustment)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for TransferOutcome {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, self.headers, self.body).into_response();
        if !self.budget.compression() {
            response.extensions_mut().insert(SkipCompression);
        }
        response
    }
}
