use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use ferry_core::budget::ResourceBudget;
use ferry_core::file::ResolvedFile;
use ferry_core::transfer::TransferStrategy;
use ferry_core::{Error, Result};

use super::{Delivery, TransportKind, Transporter};
use crate::utility::TRACING_TARGET_TRANSPORT;

/// Directive header understood by Apache `mod_xsendfile` and lighttpd.
pub const DEFAULT_OFFLOAD_HEADER: &str = "x-sendfile";

/// Names the file in a directive header and sends an empty body.
///
/// The file is never read; the fronting web server intercepts the header and
/// sends the file itself.
#[derive(Debug, Clone)]
pub struct OffloadTransporter {
    header: HeaderName,
}

impl OffloadTransporter {
    /// Creates a transporter emitting `header`.
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    /// Returns the directive header name.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl Default for OffloadTransporter {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_OFFLOAD_HEADER))
    }
}

#[async_trait]
impl Transporter for OffloadTransporter {
    fn kind(&self) -> TransportKind {
        TransportKind::Offload
    }

    async fn deliver(
        &self,
        file: ResolvedFile,
        _declared_size: Option<u64>,
        headers: &mut HeaderMap,
        _budget: &mut ResourceBudget,
    ) -> Result<Delivery> {
        let path = file.path();
        let value = HeaderValue::from_bytes(path.as_os_str().as_encoded_bytes()).map_err(|err| {
            Error::io(format!(
                "path {} cannot be sent in a header",
                path.display()
            ))
            .with_source(err)
        })?;

        tracing::debug!(
            target: TRACING_TARGET_TRANSPORT,
            header = %self.header,
            path = %path.display(),
            "offloading file to the web server"
        );

        headers.insert(self.header.clone(), value);

        Ok(Delivery {
            strategy: TransferStrategy::Offload,
            size: None,
            adjustment: None,
            body: Body::empty(),
        })
    }
}
