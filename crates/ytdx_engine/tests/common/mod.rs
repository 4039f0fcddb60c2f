#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, Once};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use ytdx_engine::{
    CancelToken, DownloadError, DownloadJob, Extractor, ExtractorOptions, ExtractorProgress,
    FormatSelector, HttpBody, HttpSource, JobContext, JobEvent, JobEventKind, JobId, JobKind,
    JobOutcome, JobSpec, MediaInfo, ProgressCallback, ProgressChannel,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ytdx_logging::initialize_for_tests);
}

/// Serves `len` bytes of zeros in `chunk_size` pieces for any URL.
pub struct FakeHttp {
    pub len: usize,
    pub chunk_size: usize,
    pub declare_length: bool,
    pub delay: Duration,
    pub cancel_after_chunks: Option<(usize, CancelToken)>,
    pub running: AtomicUsize,
    pub max_running: AtomicUsize,
    pub opened: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new(len: usize, chunk_size: usize) -> Self {
        Self {
            len,
            chunk_size,
            declare_length: true,
            delay: Duration::ZERO,
            cancel_after_chunks: None,
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpSource for FakeHttp {
    async fn open(&self, url: &str) -> Result<HttpBody, DownloadError> {
        self.opened.lock().unwrap().push(url.to_string());
        if url.contains("panic") {
            panic!("fake source exploded");
        }
        if url.contains("missing") {
            return Err(DownloadError::Network("HTTP status 404 Not Found".into()));
        }

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        let mut sizes = Vec::new();
        let mut remaining = self.len;
        while remaining > 0 {
            let size = remaining.min(self.chunk_size);
            sizes.push(size);
            remaining -= size;
        }
        let cancel = self.cancel_after_chunks.clone();
        let chunks = stream::iter(sizes.into_iter().enumerate())
            .map(move |(index, size)| {
                if let Some((after, token)) = &cancel {
                    if index == *after {
                        token.cancel();
                    }
                }
                Ok(Bytes::from(vec![0u8; size]))
            })
            .boxed();
        let content_length = self.declare_length.then_some(self.len as u64);
        Ok(HttpBody::new(content_length, chunks))
    }
}

/// Replays a scripted progress sequence, then returns `result`.
pub struct FakeExtractor {
    pub script: Vec<ExtractorProgress>,
    pub result: Result<MediaInfo, DownloadError>,
    /// Cancels the token right before delivering the event at this index.
    pub cancel_at: Option<(usize, CancelToken)>,
    /// When false the fake keeps calling back after `Break`.
    pub honour_break: bool,
    pub seen_options: Mutex<Vec<ExtractorOptions>>,
    pub callbacks_after_break: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(script: Vec<ExtractorProgress>, result: Result<MediaInfo, DownloadError>) -> Self {
        Self {
            script,
            result,
            cancel_at: None,
            honour_break: true,
            seen_options: Mutex::new(Vec::new()),
            callbacks_after_break: AtomicUsize::new(0),
        }
    }

    pub fn titled(title: &str) -> Self {
        Self::new(
            Vec::new(),
            Ok(MediaInfo {
                title: Some(title.to_string()),
                thumbnail: None,
            }),
        )
    }
}

impl Extractor for FakeExtractor {
    fn extract(
        &self,
        _url: &str,
        options: &ExtractorOptions,
        on_progress: &mut ProgressCallback<'_>,
    ) -> Result<MediaInfo, DownloadError> {
        self.seen_options.lock().unwrap().push(options.clone());
        let mut broke = false;
        for (index, event) in self.script.iter().enumerate() {
            if let Some((at, token)) = &self.cancel_at {
                if index == *at {
                    token.cancel();
                }
            }
            if broke {
                self.callbacks_after_break.fetch_add(1, Ordering::SeqCst);
            }
            if on_progress(event.clone()).is_break() {
                if self.honour_break {
                    return Err(DownloadError::Extraction("aborted by caller".into()));
                }
                broke = true;
            }
        }
        self.result.clone()
    }

    fn probe(&self, _url: &str) -> Result<MediaInfo, DownloadError> {
        self.result.clone()
    }
}

pub fn context(http: Arc<dyn HttpSource>, extractor: Arc<dyn Extractor>) -> JobContext {
    JobContext { http, extractor }
}

pub fn spec(url: &str, dir: &Path, kind: JobKind) -> JobSpec {
    JobSpec {
        url: url.to_string(),
        output_dir: dir.to_path_buf(),
        format: FormatSelector::Best,
        kind,
    }
}

pub fn job(
    job_id: JobId,
    spec: JobSpec,
    tx: &mpsc::Sender<JobEvent>,
    cancel: CancelToken,
    context: JobContext,
) -> DownloadJob {
    DownloadJob::new(spec, ProgressChannel::new(job_id, tx.clone()), cancel, context)
}

/// Receives events until `jobs` terminal outcomes have arrived.
pub fn collect_until_done(rx: &mpsc::Receiver<JobEvent>, jobs: usize) -> Vec<JobEvent> {
    let deadline = Instant::now() + Duration::from_secs(20);
    let mut events = Vec::new();
    let mut done = 0;
    while done < jobs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let event = rx
            .recv_timeout(remaining)
            .expect("timed out waiting for job events");
        if event.kind.is_terminal() {
            done += 1;
        }
        events.push(event);
    }
    events
}

pub fn events_for(events: &[JobEvent], job_id: JobId) -> Vec<JobEventKind> {
    events
        .iter()
        .filter(|event| event.job_id == job_id)
        .map(|event| event.kind.clone())
        .collect()
}

pub fn outcome_of(events: &[JobEventKind]) -> JobOutcome {
    match events.last() {
        Some(JobEventKind::Done(outcome)) => outcome.clone(),
        other => panic!("last event is not terminal: {other:?}"),
    }
}

pub fn progress_values(events: &[JobEventKind]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|kind| match kind {
            JobEventKind::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

pub fn status_values(events: &[JobEventKind]) -> Vec<String> {
    events
        .iter()
        .filter_map(|kind| match kind {
            JobEventKind::Status(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}
