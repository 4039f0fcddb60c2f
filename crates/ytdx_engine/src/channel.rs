//! Per-job event relay between a running job and the presentation loop.

use std::sync::mpsc;

use crate::{JobEvent, JobEventKind, JobId, JobOutcome};

pub(crate) const ABANDONED_MESSAGE: &str = "Download stopped unexpectedly";

/// Sending half of a job's event stream.
///
/// Events from one channel arrive in the order they were sent. `finish`
/// consumes the channel, so a job can report at most one terminal outcome
/// and nothing after it. If the channel is dropped without `finish` (job
/// panicked, or was discarded from the queue) a failure outcome is sent from
/// `Drop`, which keeps "exactly one outcome per job" true.
///
/// Sends never fail from the job's point of view: once the observing side is
/// gone the events are dropped.
pub struct ProgressChannel {
    job_id: JobId,
    tx: mpsc::Sender<JobEvent>,
    finished: bool,
}

impl ProgressChannel {
    pub fn new(job_id: JobId, tx: mpsc::Sender<JobEvent>) -> Self {
        Self {
            job_id,
            tx,
            finished: false,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Reports a percentage; values are clamped to `[0, 100]` and NaN is sent as 0.
    pub fn progress(&self, percent: f64) {
        self.send(JobEventKind::Progress(clamp_percent(percent)));
    }

    pub fn status(&self, text: impl Into<String>) {
        self.send(JobEventKind::Status(text.into()));
    }

    pub fn finish(mut self, outcome: JobOutcome) {
        self.finished = true;
        self.send(JobEventKind::Done(outcome));
    }

    fn send(&self, kind: JobEventKind) {
        let _ = self.tx.send(JobEvent {
            job_id: self.job_id,
            kind,
        });
    }
}

impl Drop for ProgressChannel {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            self.send(JobEventKind::Done(JobOutcome::failed(ABANDONED_MESSAGE)));
        }
    }
}

pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}
