use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, header};
use bytes::Bytes;
use ferry_core::budget::{CHUNK_THRESHOLD, OversizePolicy, ResourceBudget, time_budget};
use ferry_core::file::ResolvedFile;
use ferry_core::transfer::TransferStrategy;
use ferry_core::{Error, Result};
use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, Take};
use tokio::time::{Instant, Sleep};
use tokio_util::io::ReaderStream;

use super::{Delivery, TransportKind, Transporter};
use crate::utility::TRACING_TARGET_TRANSPORT;

/// Reads the file in process, in one piece or in chunks.
///
/// Files up to the chunk size are read whole before the response is
/// produced. Larger files are streamed one chunk per body frame, so at most
/// one chunk is buffered at a time. Either way no more than the resolved size
/// is read, and the body is cut off once the time budget runs out.
#[derive(Debug, Clone)]
pub struct StreamingTransporter {
    chunk_size: usize,
    oversize_policy: OversizePolicy,
}

impl StreamingTransporter {
    /// Creates a transporter with the default chunk size.
    pub fn new(oversize_policy: OversizePolicy) -> Self {
        Self {
            chunk_size: CHUNK_THRESHOLD as usize,
            oversize_policy,
        }
    }

    /// Overrides the chunk size, which is also the single-shot threshold.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Returns the chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the policy applied to files over the memory ceiling.
    pub fn oversize_policy(&self) -> OversizePolicy {
        self.oversize_policy
    }

    async fn read_whole(file: ResolvedFile, size: u64, deadline: Instant) -> Result<Body> {
        let path = file.path().to_path_buf();
        let buffer = read_bounded(file.into_file(), &path, size, deadline).await?;
        Ok(Body::from(buffer))
    }

    fn stream_chunks(&self, file: ResolvedFile, size: u64, deadline: Instant) -> Body {
        let path = file.path().to_path_buf();
        let reader = file.into_file().take(size);

        let state = ChunkState {
            chunks: ReaderStream::with_capacity(reader, self.chunk_size),
            deadline: Box::pin(tokio::time::sleep_until(deadline)),
            path,
            sent: 0,
            finished: false,
        };

        Body::from_stream(futures::stream::unfold(state, next_chunk))
    }
}

impl Default for StreamingTransporter {
    fn default() -> Self {
        Self::new(OversizePolicy::default())
    }
}

#[async_trait]
impl Transporter for StreamingTransporter {
    fn kind(&self) -> TransportKind {
        TransportKind::Stream
    }

    async fn deliver(
        &self,
        file: ResolvedFile,
        declared_size: Option<u64>,
        headers: &mut HeaderMap,
        budget: &mut ResourceBudget,
    ) -> Result<Delivery> {
        let size = declared_size.unwrap_or_else(|| file.len());
        let adjustment = budget.prepare(size, self.oversize_policy)?;

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));

        let time_limit = budget.time_limit().unwrap_or_else(|| time_budget(size));
        let deadline = Instant::now() + time_limit;

        let strategy = TransferStrategy::in_process_with_threshold(size, self.chunk_size as u64);
        tracing::debug!(
            target: TRACING_TARGET_TRANSPORT,
            path = %file.path().display(),
            size,
            %strategy,
            time_limit_secs = time_limit.as_secs(),
            "streaming file"
        );

        let body = match strategy {
            TransferStrategy::Chunked => self.stream_chunks(file, size, deadline),
            _ => Self::read_whole(file, size, deadline).await?,
        };

        Ok(Delivery {
            strategy,
            size: Some(size),
            adjustment: Some(adjustment),
            body,
        })
    }
}

/// Reads at most `size` bytes from `reader`, failing once `deadline` passes.
async fn read_bounded<R>(reader: R, path: &Path, size: u64, deadline: Instant) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = reader.take(size);
    let mut buffer = Vec::with_capacity(usize::try_from(size).unwrap_or_default());

    tokio::time::timeout_at(deadline, reader.read_to_end(&mut buffer))
        .await
        .map_err(|elapsed| Error::io("transfer deadline exceeded").with_source(elapsed))?
        .map_err(|err| Error::io(format!("failed to read {}", path.display())).with_source(err))?;

    if buffer.len() as u64 != size {
        tracing::warn!(
            target: TRACING_TARGET_TRANSPORT,
            path = %path.display(),
            expected = size,
            read = buffer.len(),
            "file is shorter than the announced content length"
        );
    }

    Ok(buffer)
}

struct ChunkState {
    chunks: ReaderStream<Take<File>>,
    deadline: Pin<Box<Sleep>>,
    path: PathBuf,
    sent: u64,
    finished: bool,
}

async fn next_chunk(mut state: ChunkState) -> Option<(io::Result<Bytes>, ChunkState)> {
    if state.finished {
        return None;
    }

    let next = tokio::select! {
        biased;
        () = &mut state.deadline => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "transfer deadline exceeded",
        )),
        chunk = state.chunks.next() => chunk.transpose(),
    };

    match next {
        Ok(Some(chunk)) => {
            state.sent += chunk.len() as u64;
            Some((Ok(chunk), state))
        }
        Ok(None) => {
            tracing::debug!(
                target: TRACING_TARGET_TRANSPORT,
                path = %state.path.display(),
                sent = state.sent,
                "chunked transfer complete"
            );
            None
        }
        Err(err) => {
            // Headers are already on the wire; the client sees a truncated body.
            tracing::error!(
                target: TRACING_TARGET_TRANSPORT,
                path = %state.path.display(),
                sent = state.sent,
                error = %err,
                "chunked transfer aborted"
            );
            state.finished = true;
            Some((Err(err), state))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ferry_core::ErrorKind;
    use ferry_core::budget::{MEMORY_CEILING, MemoryAdjustment, MemoryLimit};
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    use super::*;

    async fn resolved(dir: &TempDir, name: &str, contents: &[u8]) -> ResolvedFile {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        ResolvedFile::open(path).await.unwrap()
    }

    #[tokio::test]
    async fn small_file_is_single_shot() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = resolved(&dir, "notes.txt", b"hello world").await;

        let mut headers = HeaderMap::new();
        let mut budget = ResourceBudget::default();
        let delivery = StreamingTransporter::default()
            .deliver(file, None, &mut headers, &mut budget)
            .await?;

        assert_eq!(delivery.strategy, TransferStrategy::SingleShot);
        assert_eq!(delivery.size, Some(11));
        assert_eq!(delivery.adjustment, Some(MemoryAdjustment::Unchanged));
        assert_eq!(headers[header::CONTENT_LENGTH], "11");
        assert!(!budget.compression());
        assert_eq!(budget.time_limit(), Some(time_budget(11)));

        let body = axum::body::to_bytes(delivery.body, usize::MAX).await?;
        assert_eq!(&body[..], b"hello world");
        Ok(())
    }

    #[tokio::test]
    async fn large_file_is_chunked() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let contents: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let file = resolved(&dir, "blob.bin", &contents).await;

        let mut headers = HeaderMap::new();
        let mut budget = ResourceBudget::default();
        let delivery = StreamingTransporter::default()
            .with_chunk_size(4096)
            .deliver(file, None, &mut headers, &mut budget)
            .await?;

        assert_eq!(delivery.strategy, TransferStrategy::Chunked);
        let body = axum::body::to_bytes(delivery.body, usize::MAX).await?;
        assert_eq!(&body[..], &contents[..]);
        Ok(())
    }

    #[tokio::test]
    async fn never_reads_past_declared_size() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = resolved(&dir, "log.txt", b"0123456789").await;

        let mut headers = HeaderMap::new();
        let mut budget = ResourceBudget::default();
        let delivery = StreamingTransporter::default()
            .deliver(file, Some(4), &mut headers, &mut budget)
            .await?;

        assert_eq!(headers[header::CONTENT_LENGTH], "4");
        let body = axum::body::to_bytes(delivery.body, usize::MAX).await?;
        assert_eq!(&body[..], b"0123");
        Ok(())
    }

    #[tokio::test]
    async fn chunked_read_stops_at_declared_size() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = resolved(&dir, "data.bin", &[7u8; 100]).await;

        let mut headers = HeaderMap::new();
        let mut budget = ResourceBudget::default();
        let delivery = StreamingTransporter::default()
            .with_chunk_size(8)
            .deliver(file, Some(30), &mut headers, &mut budget)
            .await?;

        assert_eq!(delivery.strategy, TransferStrategy::Chunked);
        let body = axum::body::to_bytes(delivery.body, usize::MAX).await?;
        assert_eq!(body.len(), 30);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn chunked_body_stops_at_deadline() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = resolved(&dir, "slow.bin", &[1u8; 64]).await;

        let mut headers = HeaderMap::new();
        let mut budget = ResourceBudget::default();
        let delivery = StreamingTransporter::default()
            .with_chunk_size(8)
            .deliver(file, None, &mut headers, &mut budget)
            .await?;
        assert_eq!(delivery.strategy, TransferStrategy::Chunked);

        tokio::time::advance(time_budget(64) + Duration::from_secs(1)).await;

        let err = axum::body::to_bytes(delivery.body, usize::MAX)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("deadline"), "{err}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_single_shot_read_stops_at_deadline() {
        // The writer stays open without sending the remaining bytes.
        let (reader, mut writer) = tokio::io::duplex(64);
        writer.write_all(b"partial").await.unwrap();

        let deadline = Instant::now() + time_budget(16);
        let err = read_bounded(reader, Path::new("stalled.bin"), 16, deadline)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.message(), "transfer deadline exceeded");
        assert!(Instant::now() >= deadline);
        drop(writer);
    }

    #[tokio::test]
    async fn single_shot_read_within_deadline() -> anyhow::Result<()> {
        let deadline = Instant::now() + time_budget(5);
        let buffer = read_bounded(&b"hello world"[..], Path::new("hello.txt"), 5, deadline).await?;
        assert_eq!(buffer, b"hello");
        Ok(())
    }

    #[tokio::test]
    async fn raises_memory_limit_for_large_declared_size() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = resolved(&dir, "empty.bin", b"").await;

        let mut headers = HeaderMap::new();
        let mut budget = ResourceBudget::new(MemoryLimit::Bytes(1024));
        let delivery = StreamingTransporter::default()
            .with_chunk_size(8)
            .deliver(file, Some(2048), &mut headers, &mut budget)
            .await?;

        assert_eq!(
            delivery.adjustment,
            Some(MemoryAdjustment::Raised {
                from: MemoryLimit::Bytes(1024),
                to: 3072,
            })
        );
        assert_eq!(budget.memory_limit(), MemoryLimit::Bytes(3072));
        Ok(())
    }

    #[tokio::test]
    async fn reject_policy_refuses_oversize_files() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = resolved(&dir, "huge.iso", b"").await;

        let mut headers = HeaderMap::new();
        let mut budget = ResourceBudget::new(MemoryLimit::Bytes(1024));
        let err = StreamingTransporter::new(OversizePolicy::Reject)
            .deliver(file, Some(MEMORY_CEILING), &mut headers, &mut budget)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FileTooLarge);
        assert!(headers.is_empty());
        assert!(budget.compression());
        Ok(())
    }
}
