//! Chunked file bodies for downloads.
//!
//! Stored files can be large (a 300-page pdf-to-jpg bundle runs to hundreds
//! of megabytes). [`file_stream`] hands them out as a `Stream` of 64 KiB
//! `Bytes` chunks so the server never buffers a whole file.

use crate::error::ConvertError;
use bytes::Bytes;
use futures::stream;
use std::path::Path;
use std::pin::Pin;
use tokio::io::AsyncReadExt;
use tokio_stream::Stream;
use tracing::debug;

/// Read size for each chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// A boxed stream of file chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Open `path` and stream its contents.
///
/// # Returns
/// The file length (for `Content-Length`) and the chunk stream.
pub async fn file_stream(path: &Path) -> Result<(u64, ByteStream), ConvertError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConvertError::NotFound(path.display().to_string()),
        _ => ConvertError::Internal(format!("Failed to open '{}': {e}", path.display())),
    })?;
    let len = file
        .metadata()
        .await
        .map_err(|e| ConvertError::Internal(format!("Failed to stat '{}': {e}", path.display())))?
        .len();
    debug!("Streaming {} ({} bytes)", path.display(), len);

    let s = stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buf.truncate(n);
        Ok(Some((Bytes::from(buf), file)))
    });

    Ok((len, Box::pin(s)))
}
