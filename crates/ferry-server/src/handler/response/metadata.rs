//! File metadata response types.

use serde::{Deserialize, Serialize};

/// Detected type and formatted size of a stored file.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Path of the file relative to the storage root.
    pub path: String,
    /// Detected media type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Size formatted for the requested locale.
    pub size_formatted: String,
}
