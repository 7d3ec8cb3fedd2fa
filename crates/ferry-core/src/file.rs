//! Validation and opening of files about to be served.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs::File;

use crate::{Error, Result, TRACING_TARGET_FILE};

/// A regular file that exists and has been opened for reading.
///
/// The handle opened during validation is the one handed to the transport,
/// so a file that passed validation cannot fail to open later.
#[derive(Debug)]
pub struct ResolvedFile {
    path: PathBuf,
    file: File,
    len: u64,
    modified: Option<SystemTime>,
}

impl ResolvedFile {
    /// Validates and opens the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::FileNotFound`] when nothing exists at `path`.
    /// - [`ErrorKind::FileNotReadable`] when `path` is not a regular file or
    ///   cannot be opened for reading.
    ///
    /// [`ErrorKind::FileNotFound`]: crate::ErrorKind::FileNotFound
    /// [`ErrorKind::FileNotReadable`]: crate::ErrorKind::FileNotReadable
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::file_not_found(&path).with_source(err));
            }
            Err(err) => return Err(Error::file_not_readable(&path).with_source(err)),
        };

        if !metadata.is_file() {
            tracing::debug!(
                target: TRACING_TARGET_FILE,
                path = %path.display(),
                "path is not a regular file"
            );
            return Err(Error::file_not_readable(&path));
        }

        let file = File::open(&path)
            .await
            .map_err(|err| Error::file_not_readable(&path).with_source(err))?;

        tracing::trace!(
            target: TRACING_TARGET_FILE,
            path = %path.display(),
            len = metadata.len(),
            "opened file"
        );

        Ok(Self {
            path,
            file,
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    /// Returns the path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the size reported by the filesystem.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the last modification time, if the platform reports one.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Consumes the resolved file, returning the open handle.
    pub fn into_file(self) -> File {
        self.file
    }
}
