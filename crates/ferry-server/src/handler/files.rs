//! File download handler.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use axum_extra::TypedHeader;
use axum_extra::headers::UserAgent;
use ferry_core::mime::Mime;
use ferry_core::transfer::TransferRequest;

use crate::extract::{Path, Query};
use crate::handler::request::DownloadQuery;
use crate::handler::{ErrorKind, Result};
use crate::service::{MimeService, ServiceState, StorageRoot};
use crate::transfer::{DownloadTransfer, TransferOutcome};
use crate::utility::TRACING_TARGET_HANDLER;

/// Downloads a file below the storage root.
#[tracing::instrument(skip_all, fields(path = %path))]
async fn download_file(
    State(storage_root): State<StorageRoot>,
    State(mime_service): State<MimeService>,
    State(download_transfer): State<DownloadTransfer>,
    Path(path): Path<String>,
    Query(query): Query<DownloadQuery>,
    user_agent: Option<TypedHeader<UserAgent>>,
) -> Result<TransferOutcome> {
    let file_path = storage_root.resolve(&path).ok_or_else(|| {
        ErrorKind::BadRequest
            .with_message("Invalid file path")
            .with_resource("file")
    })?;

    let display_name = match query.name.filter(|name| !name.is_empty()) {
        Some(name) => name,
        None => file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let mime_type = match query.mime.filter(|mime| !mime.is_empty()) {
        Some(mime) => Some(mime.parse::<Mime>().map_err(|_| {
            ErrorKind::BadRequest
                .with_message("Invalid mime type")
                .with_context(mime)
        })?),
        None => mime_service.detect_for_download(file_path.clone()).await,
    };

    let mut request = TransferRequest::new(file_path, display_name);
    if let Some(mime_type) = mime_type {
        request = request.with_mime_type(mime_type);
    }
    if let Some(size) = query.size {
        request = request.with_declared_size(size);
    }

    let user_agent = user_agent.as_ref().map(|TypedHeader(ua)| ua.as_str());
    let outcome = download_transfer.transfer(request, user_agent).await?;

    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        strategy = %outcome.strategy(),
        size = outcome.size(),
        "download started"
    );

    Ok(outcome)
}

/// Returns a [`Router`] with the download route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/files/{*path}", get(download_file))
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use ferry_core::budget::CHUNK_THRESHOLD;
    use tempfile::TempDir;

    use super::*;
    use crate::handler::test::create_test_server_with_config;
    use crate::service::ServiceConfig;
    use crate::transport::TransportKind;

    const LEGACY_UA: &str = "Mozilla/4.0 (compatible; MSIE 7.0; Windows NT 6.0)";
    const MODERN_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

    fn config(dir: &TempDir) -> ServiceConfig {
        ServiceConfig::builder()
            .with_storage_root(dir.path())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn downloads_file_with_headers() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("notes.txt"), b"hello ferry")?;
        let server = create_test_server_with_config(&config(&dir)).await?;

        let response = server.get("/files/notes.txt").await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), b"hello ferry");

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_LENGTH], "11");
        let disposition = headers[header::CONTENT_DISPOSITION].to_str()?;
        assert!(disposition.starts_with("attachment; filename=\"notes.txt\"; modification-date=\""));
        Ok(())
    }

    #[tokio::test]
    async fn content_length_matches_file_size() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let contents = vec![b'x'; CHUNK_THRESHOLD as usize];
        std::fs::write(dir.path().join("exact.bin"), &contents)?;
        std::fs::write(dir.path().join("over.bin"), [contents.as_slice(), b"y"].concat())?;
        let server = create_test_server_with_config(&config(&dir)).await?;

        let response = server.get("/files/exact.bin").await;
        response.assert_status_ok();
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1048576");
        assert_eq!(response.as_bytes().len(), contents.len());

        let response = server.get("/files/over.bin").await;
        response.assert_status_ok();
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1048577");
        assert_eq!(response.as_bytes().len(), contents.len() + 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_not_found() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let server = create_test_server_with_config(&config(&dir)).await?;

        let response = server.get("/files/missing.pdf").await;
        response.assert_status_not_found();
        assert_eq!(response.json::<serde_json::Value>()["name"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn traversal_is_rejected() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let root = dir.path().join("root");
        std::fs::create_dir(&root)?;
        std::fs::write(dir.path().join("secret.txt"), b"secret")?;

        let config = ServiceConfig::builder().with_storage_root(&root).build()?;
        let server = create_test_server_with_config(&config).await?;

        let response = server.get("/files/..%2Fsecret.txt").await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn sniffs_mime_type_when_absent() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
        std::fs::write(dir.path().join("upload"), png)?;
        let server = create_test_server_with_config(&config(&dir)).await?;

        let response = server.get("/files/upload").await;
        response.assert_status_ok();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        Ok(())
    }

    #[tokio::test]
    async fn query_overrides_name_and_type() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("f81d4fae"), b"col\n1\n")?;
        let server = create_test_server_with_config(&config(&dir)).await?;

        let response = server
            .get("/files/f81d4fae")
            .add_query_param("name", "export.csv")
            .add_query_param("mime", "text/csv")
            .await;
        response.assert_status_ok();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()?
            .starts_with("attachment; filename=\"export.csv\";"));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_mime_override_is_bad_request() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("a.txt"), b"a")?;
        let server = create_test_server_with_config(&config(&dir)).await?;

        let response = server
            .get("/files/a.txt")
            .add_query_param("mime", "not a mime")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn unsniffed_download_is_octet_stream() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("page.html"), b"<html></html>")?;
        let config = ServiceConfig::builder()
            .with_storage_root(dir.path())
            .with_sniff_downloads(false)
            .build()?;
        let server = create_test_server_with_config(&config).await?;

        let response = server.get("/files/page.html").await;
        response.assert_status_ok();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        Ok(())
    }

    #[tokio::test]
    async fn filename_encoding_follows_user_agent() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("report.pdf"), b"%PDF")?;
        let server = create_test_server_with_config(&config(&dir)).await?;

        let legacy = server
            .get("/files/report.pdf")
            .add_query_param("name", "annual report.pdf")
            .add_header("user-agent", LEGACY_UA)
            .await;
        let disposition = legacy.headers()[header::CONTENT_DISPOSITION].to_str()?;
        assert!(disposition.starts_with("attachment; filename=annual+report.pdf;"));

        let modern = server
            .get("/files/report.pdf")
            .add_query_param("name", "annual report.pdf")
            .add_header("user-agent", MODERN_UA)
            .await;
        let disposition = modern.headers()[header::CONTENT_DISPOSITION].to_str()?;
        assert!(disposition.starts_with("attachment; filename=\"annual report.pdf\";"));
        Ok(())
    }

    #[tokio::test]
    async fn offload_sends_directive_only() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("movie.mkv"), b"frames")?;
        let config = ServiceConfig::builder()
            .with_storage_root(dir.path())
            .with_transport(TransportKind::Offload)
            .build()?;
        let server = create_test_server_with_config(&config).await?;

        let response = server.get("/files/movie.mkv").await;
        response.assert_status_ok();

        let expected = dir.path().canonicalize()?.join("movie.mkv");
        assert_eq!(
            response.headers()["x-sendfile"].to_str()?,
            expected.to_string_lossy()
        );
        assert!(response.as_bytes().is_empty());
        Ok(())
    }
}
