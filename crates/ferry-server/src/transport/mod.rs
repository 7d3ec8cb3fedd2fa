//! Body delivery strategies.
//!
//! A [`Transporter`] is selected once at startup and receives the file that
//! passed validation together with the response headers built so far. The
//! [`OffloadTransporter`] hands the file to the fronting web server, while the
//! [`StreamingTransporter`] reads it in process.

use std::fmt;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::HeaderMap;
use ferry_core::Result;
use ferry_core::budget::{MemoryAdjustment, ResourceBudget};
use ferry_core::file::ResolvedFile;
use ferry_core::transfer::TransferStrategy;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

mod offload;
mod streaming;

pub use offload::{DEFAULT_OFFLOAD_HEADER, OffloadTransporter};
pub use streaming::StreamingTransporter;

/// Which transporter the server uses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Read the file in process.
    #[default]
    Stream,
    /// Emit a directive header and let the fronting web server send the file.
    Offload,
}

/// The body and bookkeeping produced by a [`Transporter`].
#[must_use]
pub struct Delivery {
    /// Strategy used for the body.
    pub strategy: TransferStrategy,
    /// Size the body was sized to, when the file is read in process.
    pub size: Option<u64>,
    /// Memory limit change made for the transfer, when one was attempted.
    pub adjustment: Option<MemoryAdjustment>,
    /// Response body.
    pub body: Body,
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("strategy", &self.strategy)
            .field("size", &self.size)
            .field("adjustment", &self.adjustment)
            .finish_non_exhaustive()
    }
}

/// Delivers the body of a validated download.
#[async_trait]
pub trait Transporter: fmt::Debug + Send + Sync {
    /// Returns which kind of transporter this is.
    fn kind(&self) -> TransportKind;

    /// Adds transport-specific headers and builds the body for `file`.
    ///
    /// # Errors
    ///
    /// Fails before any byte is sent; the response has not been produced when
    /// an error is returned.
    async fn deliver(
        &self,
        file: ResolvedFile,
        declared_size: Option<u64>,
        headers: &mut HeaderMap,
        budget: &mut ResourceBudget,
    ) -> Result<Delivery>;
}
