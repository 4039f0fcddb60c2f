use std::sync::Arc;
use std::time::Duration;

use ytdx_logging::ytdx_debug;

use crate::{fetch_bytes, Extractor, HttpSource, WorkerPool};

const METADATA_WORKERS: usize = 4;
const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(8);
const MAX_THUMBNAIL_BYTES: usize = 8 * 1024 * 1024;

/// Display-only metadata for a queued link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMetadata {
    pub title: Option<String>,
    pub thumbnail: Option<Vec<u8>>,
}

/// Resolves titles and thumbnails in the background, independently of the
/// download jobs. Failures are silent and leave the field empty.
pub struct MetadataFetcher {
    pool: WorkerPool,
    http: Arc<dyn HttpSource>,
    extractor: Arc<dyn Extractor>,
}

impl MetadataFetcher {
    pub fn new(http: Arc<dyn HttpSource>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            pool: WorkerPool::new("metadata", METADATA_WORKERS),
            http,
            extractor,
        }
    }

    /// Resolves metadata for `url` on a pool thread and hands it to
    /// `callback` on that same thread.
    pub fn fetch_async(
        &self,
        url: impl Into<String>,
        callback: impl FnOnce(LinkMetadata) + Send + 'static,
    ) {
        let url = url.into();
        let http = self.http.clone();
        let extractor = self.extractor.clone();
        self.pool.execute(move || {
            let metadata = resolve(&url, http.as_ref(), extractor.as_ref());
            callback(metadata);
        });
    }

    pub fn join(self) {
        self.pool.join();
    }
}

fn resolve(url: &str, http: &dyn HttpSource, extractor: &dyn Extractor) -> LinkMetadata {
    let info = match extractor.probe(url) {
        Ok(info) => info,
        Err(err) => {
            ytdx_debug!("Metadata probe failed for {}: {}", url, err);
            return LinkMetadata::default();
        }
    };

    let thumbnail = info
        .thumbnail
        .as_deref()
        .and_then(|thumb_url| fetch_thumbnail(thumb_url, http));

    LinkMetadata {
        title: info.title,
        thumbnail,
    }
}

fn fetch_thumbnail(url: &str, http: &dyn HttpSource) -> Option<Vec<u8>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .ok()?;
    match runtime.block_on(fetch_bytes(
        http,
        url,
        THUMBNAIL_TIMEOUT,
        MAX_THUMBNAIL_BYTES,
    )) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(err) => {
            ytdx_debug!("Thumbnail fetch failed for {}: {}", url, err);
            None
        }
    }
}
