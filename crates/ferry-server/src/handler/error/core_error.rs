//! Conversion of [`ferry_core::Error`] into HTTP errors.

use ferry_core::ErrorKind as CoreErrorKind;

use super::http_error::{Error, ErrorKind};

/// Tracing target for core error conversions.
const TRACING_TARGET: &str = "ferry_server::handler::core";

impl From<ferry_core::Error> for Error {
    fn from(error: ferry_core::Error) -> Self {
        match error.kind() {
            CoreErrorKind::FileNotFound | CoreErrorKind::FileNotReadable => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind(),
                    "file rejected"
                );
            }
            CoreErrorKind::FileTooLarge => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "file exceeds the memory ceiling"
                );
            }
            CoreErrorKind::InvalidMemoryLimit | CoreErrorKind::Io => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %error.kind(),
                    "transfer failed"
                );
            }
        }

        let context = error.message().to_owned();
        match error.kind() {
            CoreErrorKind::FileNotFound => ErrorKind::NotFound
                .with_message("File not found")
                .with_resource("file"),
            CoreErrorKind::FileNotReadable => ErrorKind::Forbidden
                .with_message("File cannot be read")
                .with_resource("file"),
            CoreErrorKind::FileTooLarge => ErrorKind::PayloadTooLarge
                .with_message("File is too large to be served")
                .with_resource("file"),
            CoreErrorKind::InvalidMemoryLimit | CoreErrorKind::Io => {
                ErrorKind::InternalServerError.with_context(context)
            }
        }
    }
}
