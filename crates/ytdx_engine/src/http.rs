use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::DownloadError;

pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;
const COLLECT_PREALLOC: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    /// Maximum idle time between two reads of the response body.
    pub read_timeout: Duration,
    /// Body chunks handed to the job are coalesced to this size.
    pub chunk_size: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// An opened response: declared length plus the body as a chunk stream.
pub struct HttpBody {
    pub content_length: Option<u64>,
    pub chunks: BoxStream<'static, Result<Bytes, DownloadError>>,
}

impl HttpBody {
    pub fn new(
        content_length: Option<u64>,
        chunks: BoxStream<'static, Result<Bytes, DownloadError>>,
    ) -> Self {
        Self {
            content_length,
            chunks,
        }
    }

    /// Collects the whole body, failing once it grows past `max_bytes`.
    /// The declared length is only a hint and is checked against the limit
    /// before anything is allocated.
    pub async fn collect(mut self, max_bytes: usize) -> Result<Vec<u8>, DownloadError> {
        let declared = self.content_length.unwrap_or(0);
        if declared > max_bytes as u64 {
            return Err(too_large(max_bytes));
        }
        let mut out = Vec::with_capacity((declared as usize).min(COLLECT_PREALLOC));
        while let Some(chunk) = self.chunks.next().await {
            let chunk = chunk?;
            if out.len() + chunk.len() > max_bytes {
                return Err(too_large(max_bytes));
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

fn too_large(max_bytes: usize) -> DownloadError {
    DownloadError::Network(format!("response larger than {max_bytes} bytes"))
}

/// Streaming GET used by the generic HTTP job path and thumbnail prefetch.
///
/// Non-2xx responses must be reported as [`DownloadError::Network`] rather
/// than streamed.
#[async_trait::async_trait]
pub trait HttpSource: Send + Sync {
    async fn open(&self, url: &str) -> Result<HttpBody, DownloadError>;
}

/// Opens `url` and collects at most `max_bytes` of body, giving up after
/// `timeout`.
pub async fn fetch_bytes(
    source: &dyn HttpSource,
    url: &str,
    timeout: Duration,
    max_bytes: usize,
) -> Result<Vec<u8>, DownloadError> {
    let fetch = async { source.open(url).await?.collect(max_bytes).await };
    tokio::time::timeout(timeout, fetch)
        .await
        .map_err(|_| DownloadError::Network(format!("timed out after {}s", timeout.as_secs())))?
}

#[derive(Debug, Clone)]
pub struct ReqwestSource {
    client: reqwest::Client,
    chunk_size: usize,
}

impl ReqwestSource {
    pub fn new(settings: HttpSettings) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .build()
            .map_err(|err| DownloadError::Network(err.to_string()))?;
        Ok(Self {
            client,
            chunk_size: settings.chunk_size.max(1),
        })
    }
}

#[async_trait::async_trait]
impl HttpSource for ReqwestSource {
    async fn open(&self, url: &str) -> Result<HttpBody, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Network(format!("HTTP status {status}")));
        }

        let content_length = response.content_length().filter(|len| *len > 0);
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error))
            .boxed();
        Ok(HttpBody::new(content_length, rechunk(chunks, self.chunk_size)))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::Network(format!("timeout: {err}"));
    }
    DownloadError::Network(err.to_string())
}

/// Coalesces arbitrary network reads into `chunk_size` blocks; the final
/// block may be shorter. An error is passed through and ends the stream.
pub(crate) fn rechunk(
    inner: BoxStream<'static, Result<Bytes, DownloadError>>,
    chunk_size: usize,
) -> BoxStream<'static, Result<Bytes, DownloadError>> {
    stream::unfold(
        (inner, BytesMut::new(), false),
        move |(mut inner, mut buf, mut done)| async move {
            loop {
                if buf.len() >= chunk_size {
                    let block = buf.split_to(chunk_size).freeze();
                    return Some((Ok(block), (inner, buf, done)));
                }
                if done {
                    if buf.is_empty() {
                        return None;
                    }
                    let block = buf.split().freeze();
                    return Some((Ok(block), (inner, buf, done)));
                }
                match inner.next().await {
                    Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                    Some(Err(err)) => {
                        buf.clear();
                        done = true;
                        return Some((Err(err), (inner, buf, done)));
                    }
                    None => done = true,
                }
            }
        },
    )
    .boxed()
}
