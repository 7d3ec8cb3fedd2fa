use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body of every error response.
///
/// The context is logged but never serialized, so internal paths and I/O
/// details stay on the server.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// The error name/type identifier
    pub name: Cow<'static, str>,
    /// User-friendly error message safe for client display
    pub message: Cow<'static, str>,
    /// The resource that the error relates to (optional, set by handler)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'static, str>>,
    /// Internal context for debugging (not exposed to client)
    #[serde(skip)]
    pub context: Option<Cow<'static, str>>,
    /// HTTP status code (not serialized in JSON)
    #[serde(skip)]
    pub status: StatusCode,
}

impl ErrorResponse {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const FORBIDDEN: Self = Self::new(
        "forbidden",
        "You don't have permission to access this resource",
        StatusCode::FORBIDDEN,
    );
    // 5xx Server Errors
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    pub const PAYLOAD_TOO_LARGE: Self = Self::new(
        "payload_too_large",
        "The requested resource is too large to be served",
        StatusCode::PAYLOAD_TOO_LARGE,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'static str, message: &'static str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            resource: None,
            context: None,
            status,
        }
    }

    /// Sets the resource, joining it to an existing one with `/`.
    pub fn with_resource(mut self, resource: impl Into<Cow<'static, str>>) -> Self {
        let new_resource = resource.into();
        self.resource = Some(match self.resource {
            Some(existing) => Cow::Owned(format!("{}/{}", existing, new_resource)),
            None => new_resource,
        });
        self
    }

    /// Appends a sentence to the message.
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        let new_message = message.into();
        self.message = Cow::Owned(format!("{}. {}", self.message, new_message));
        self
    }

    /// Attaches context, joining it to existing context with `; `.
    pub fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_context)),
            None => new_context,
        });
        self
    }
}

impl Default for ErrorResponse {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_merging_resource() {
        let response = ErrorResponse::NOT_FOUND
            .with_resource("storage")
            .with_resource("file");

        assert_eq!(response.resource.as_deref(), Some("storage/file"));
    }

    #[test]
    fn error_response_merging_message() {
        let response = ErrorResponse::BAD_REQUEST
            .with_message("Invalid path")
            .with_message("Parent directory segments are not allowed");

        assert_eq!(
            &response.message,
            "The request could not be processed due to invalid data. Invalid path. \
             Parent directory segments are not allowed"
        );
    }

    #[test]
    fn error_response_serialization() {
        let response = ErrorResponse::NOT_FOUND
            .with_resource("file")
            .with_context("/srv/files/secret");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["name"], "not_found");
        assert_eq!(json["resource"], "file");
        assert!(json.get("context").is_none());
        assert!(json.get("status").is_none());
    }
}
