//! The unit of work executed by the dispatcher.

use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Arc;

use futures_util::StreamExt;
use ytdx_logging::ytdx_job;

use crate::{
    filename_from_url, AtomicFileWriter, CancelToken, DownloadError, Extractor, ExtractorOptions,
    ExtractorProgress, HttpSource, JobId, JobKind, JobOutcome, JobSpec, ProgressChannel,
    ProgressStatus,
};

pub const FINALIZING_STATUS: &str = "Merging / finalizing...";

const MIB: f64 = 1024.0 * 1024.0;

/// Collaborators a job needs; shared by every job of a dispatcher.
#[derive(Clone)]
pub struct JobContext {
    pub http: Arc<dyn HttpSource>,
    pub extractor: Arc<dyn Extractor>,
}

/// One URL to download, together with the channel it reports on and the
/// flag it polls for cancellation.
///
/// Cancellation is advisory. The extractor path checks the flag on every
/// progress callback; the HTTP path checks it before connecting and between
/// body chunks, so a read already blocked on the network finishes (or times
/// out) before the job notices.
///
/// A failed extractor download may leave partial files in the output
/// directory; they are not cleaned up.
pub struct DownloadJob {
    spec: JobSpec,
    channel: ProgressChannel,
    cancel: CancelToken,
    context: JobContext,
}

impl DownloadJob {
    pub fn new(
        spec: JobSpec,
        channel: ProgressChannel,
        cancel: CancelToken,
        context: JobContext,
    ) -> Self {
        Self {
            spec,
            channel,
            cancel,
            context,
        }
    }

    pub fn id(&self) -> JobId {
        self.channel.job_id()
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Runs the job to completion on the current thread, reports the
    /// terminal outcome on the channel and returns it.
    pub fn execute(self) -> JobOutcome {
        let Self {
            spec,
            channel,
            cancel,
            context,
        } = self;
        let job_id = channel.job_id();
        ytdx_job!(info, job_id, "starting {:?} download of {}", spec.kind, spec.url);

        let result = if cancel.is_cancelled() {
            Err(DownloadError::Cancelled)
        } else {
            match spec.kind {
                JobKind::GenericHttp => run_http(&spec, &channel, &cancel, context.http.as_ref()),
                JobKind::ExtractorBased => {
                    run_extractor(&spec, &channel, &cancel, context.extractor.as_ref())
                }
            }
        };

        let outcome = match result {
            Ok(message) => {
                ytdx_job!(info, job_id, "finished: {}", message);
                channel.status("Done");
                JobOutcome::succeeded(message)
            }
            Err(err) => {
                ytdx_job!(warn, job_id, "failed: {}", err);
                JobOutcome::from(&err)
            }
        };
        channel.finish(outcome.clone());
        outcome
    }
}

fn run_http(
    spec: &JobSpec,
    channel: &ProgressChannel,
    cancel: &CancelToken,
    http: &dyn HttpSource,
) -> Result<String, DownloadError> {
    let writer = AtomicFileWriter::new(spec.output_dir.clone());
    let mut tmp = writer.temp_file()?;
    let filename = filename_from_url(&spec.url);
    channel.status("Starting HTTP download");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| DownloadError::Network(format!("failed to start I/O runtime: {err}")))?;

    runtime.block_on(async {
        let mut body = http.open(&spec.url).await?;
        let mut meter = ByteMeter::new(body.content_length);
        while let Some(chunk) = body.chunks.next().await {
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            tmp.write_all(&chunk)?;
            meter.advance(chunk.len());
            if let Some(percent) = meter.percent() {
                channel.progress(percent);
            }
            channel.status(meter.status_text());
        }
        Ok::<(), DownloadError>(())
    })?;

    let target = writer.commit(tmp, &filename)?;
    Ok(target.display().to_string())
}

fn run_extractor(
    spec: &JobSpec,
    channel: &ProgressChannel,
    cancel: &CancelToken,
    extractor: &dyn Extractor,
) -> Result<String, DownloadError> {
    crate::ensure_output_dir(&spec.output_dir)?;
    let options = ExtractorOptions::resolve(spec.format, &spec.output_dir);
    channel.status("Starting extractor");

    let mut cancelled = false;
    let result = extractor.extract(&spec.url, &options, &mut |progress: ExtractorProgress| {
        if cancelled || cancel.is_cancelled() {
            cancelled = true;
            return ControlFlow::Break(());
        }
        match progress.status {
            ProgressStatus::Downloading => {
                channel.progress(progress.percent());
                if let Some(text) = progress.status_text() {
                    channel.status(text);
                }
            }
            ProgressStatus::Finished => {
                channel.progress(100.0);
                channel.status(FINALIZING_STATUS);
            }
            ProgressStatus::Error | ProgressStatus::Other => {}
        }
        ControlFlow::Continue(())
    });

    if cancelled {
        return Err(DownloadError::Cancelled);
    }
    let info = result?;
    Ok(info.title.unwrap_or_default())
}

/// Byte counter for the HTTP path.
struct ByteMeter {
    downloaded: u64,
    total: Option<u64>,
}

impl ByteMeter {
    fn new(total: Option<u64>) -> Self {
        Self {
            downloaded: 0,
            total: total.filter(|t| *t > 0),
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.downloaded += bytes as u64;
    }

    /// `None` when the length is unknown: progress is indeterminate.
    fn percent(&self) -> Option<f64> {
        self.total
            .map(|total| self.downloaded as f64 * 100.0 / total as f64)
    }

    fn status_text(&self) -> String {
        let downloaded = self.downloaded as f64 / MIB;
        match self.total {
            Some(total) => format!("{downloaded:.1} MB / {:.1} MB", total as f64 / MIB),
            None => format!("{downloaded:.1} MB"),
        }
    }
}
