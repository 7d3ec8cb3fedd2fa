use axum::http::{Extensions, HeaderMap, StatusCode, Version};
use tower_http::compression::predicate::{And, DefaultPredicate, Predicate};

/// Response extension marking a response that must be sent uncompressed.
///
/// In-process downloads carry an exact `Content-Length`, which a compressing
/// layer would invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipCompression;

type NotSkipped = fn(StatusCode, Version, &HeaderMap, &Extensions) -> bool;

/// Compression predicate: the default rules, minus marked responses.
pub type CompressionPredicate = And<DefaultPredicate, NotSkipped>;

fn not_skipped(_: StatusCode, _: Version, _: &HeaderMap, extensions: &Extensions) -> bool {
    extensions.get::<SkipCompression>().is_none()
}

/// Returns the predicate used by the compression layer.
pub fn compression_predicate() -> CompressionPredicate {
    DefaultPredicate::new().and(not_skipped as NotSkipped)
}
