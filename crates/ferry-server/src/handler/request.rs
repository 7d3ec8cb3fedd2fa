//! Request types for HTTP handlers.

use serde::{Deserialize, Serialize};

/// Query parameters of a download.
#[must_use]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadQuery {
    /// Filename shown to the client; defaults to the stored file name.
    pub name: Option<String>,
    /// Media type override; sniffed when absent.
    pub mime: Option<String>,
    /// Declared size in bytes; read from the filesystem when absent.
    pub size: Option<u64>,
}

/// Query parameters of a metadata request.
#[must_use]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataQuery {
    /// Locale used to format the size.
    pub locale: Option<String>,
}
