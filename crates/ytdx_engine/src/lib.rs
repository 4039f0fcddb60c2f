//! ytdx engine: concurrent download jobs, their progress channels and the
//! collaborators they drive (HTTP and the media extractor).
mod cancel;
mod channel;
mod dispatcher;
mod extractor;
mod filename;
mod format;
mod http;
mod job;
mod metadata;
mod persist;
mod types;
mod ytdlp;

pub use cancel::CancelToken;
pub use channel::{clamp_percent, ProgressChannel};
pub use dispatcher::{default_worker_count, JobDispatcher, WorkerPool};
pub use extractor::{Extractor, ExtractorProgress, MediaInfo, ProgressCallback, ProgressStatus};
pub use filename::filename_from_url;
pub use format::{
    AudioCodec, AudioTranscode, ExtractorOptions, FormatSelector, AUDIO_QUALITY_KBPS,
    MERGE_CONTAINER,
};
pub use http::{fetch_bytes, HttpBody, HttpSettings, HttpSource, ReqwestSource, DEFAULT_CHUNK_SIZE};
pub use job::{DownloadJob, JobContext, FINALIZING_STATUS};
pub use metadata::{LinkMetadata, MetadataFetcher};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{DownloadError, JobEvent, JobEventKind, JobId, JobKind, JobOutcome, JobSpec};
pub use ytdlp::{ExtractorSettings, YtDlpExtractor};
