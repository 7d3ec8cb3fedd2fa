//! File metadata handler.

use std::io;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::extract::{Path, Query};
use crate::handler::request::MetadataQuery;
use crate::handler::response::FileMetadata;
use crate::handler::{ErrorKind, Result};
use crate::service::{MimeService, ServiceState, SizeFormatting, StorageRoot};
use crate::utility::TRACING_TARGET_HANDLER;

/// Returns the detected type and formatted size of a stored file.
#[tracing::instrument(skip_all, fields(path = %path))]
async fn file_metadata(
    State(storage_root): State<StorageRoot>,
    State(mime_service): State<MimeService>,
    State(size_formatting): State<SizeFormatting>,
    Path(path): Path<String>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<FileMetadata>> {
    let file_path = storage_root.resolve(&path).ok_or_else(|| {
        ErrorKind::BadRequest
            .with_message("Invalid file path")
            .with_resource("file")
    })?;

    let metadata = match tokio::fs::metadata(&file_path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => {
            return Err(ErrorKind::Forbidden
                .with_message("Not a regular file")
                .with_resource("file"));
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ErrorKind::NotFound
                .with_message("File not found")
                .with_resource("file"));
        }
        Err(err) => {
            return Err(ErrorKind::Forbidden
                .with_message("File cannot be read")
                .with_resource("file")
                .with_context(err.to_string()));
        }
    };

    let mime_type = mime_service
        .detect(file_path)
        .await
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);

    let size = metadata.len();
    let formatter = size_formatting.formatter(query.locale.as_deref());

    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        mime_type = %mime_type,
        size,
        locale = formatter.locale_name(),
        "file metadata resolved"
    );

    Ok(Json(FileMetadata {
        path: path.trim_start_matches('/').to_owned(),
        mime_type: mime_type.to_string(),
        size,
        size_formatted: formatter.format(Some(size as f64)),
    }))
}

/// Returns a [`Router`] with the metadata route.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/metadata/{*path}", get(file_metadata))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use axum::http::StatusCode;
    use tempfile::TempDir;

    use super::*;
    use crate::handler::test::create_test_server_with_config;
    use crate::service::ServiceConfig;

    fn docx(path: &std::path::Path) -> anyhow::Result<()> {
        // Local file header of a zip archive; the content sniffer sees a zip.
        let mut file = std::fs::File::create(path)?;
        file.write_all(&[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00, 0x00, 0x00])?;
        file.write_all(&[0u8; 64])?;
        Ok(())
    }

    #[tokio::test]
    async fn reports_office_type_and_localized_size() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        docx(&dir.path().join("letter.docx"))?;
        std::fs::write(dir.path().join("table.csv"), vec![b','; 6587])?;

        let config = ServiceConfig::builder()
            .with_storage_root(dir.path())
            .with_default_locale("pl_PL")
            .build()?;
        let server = create_test_server_with_config(&config).await?;

        let response = server.get("/metadata/letter.docx").await;
        response.assert_status_ok();
        let metadata = response.json::<FileMetadata>();
        assert_eq!(metadata.path, "letter.docx");
        assert_eq!(metadata.mime_type, "application/msword");
        assert_eq!(metadata.size, 72);
        assert_eq!(metadata.size_formatted, "72 B");

        let response = server.get("/metadata/table.csv").await;
        let metadata = response.json::<FileMetadata>();
        assert_eq!(metadata.size_formatted, "6,43 kB");

        let response = server
            .get("/metadata/table.csv")
            .add_query_param("locale", "en_US")
            .await;
        let metadata = response.json::<FileMetadata>();
        assert_eq!(metadata.size_formatted, "6.43 kB");
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_not_found() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let config = ServiceConfig::builder()
            .with_storage_root(dir.path())
            .build()?;
        let server = create_test_server_with_config(&config).await?;

        let response = server.get("/metadata/nothing.bin").await;
        response.assert_status_not_found();
        Ok(())
    }

    #[tokio::test]
    async fn directory_is_forbidden() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir(dir.path().join("nested"))?;
        let config = ServiceConfig::builder()
            .with_storage_root(dir.path())
            .build()?;
        let server = create_test_server_with_config(&config).await?;

        let response = server.get("/metadata/nested").await;
        response.assert_status(StatusCode::FORBIDDEN);
        Ok(())
    }
}
