use std::path::PathBuf;

use thiserror::Error;

use crate::FormatSelector;

pub type JobId = u64;

/// How a job obtains its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Plain streaming GET of the URL into the output directory.
    GenericHttp,
    /// Hand the URL to the media extractor.
    ExtractorBased,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub url: String,
    pub output_dir: PathBuf,
    pub format: FormatSelector,
    pub kind: JobKind,
}

/// Terminal result of a job. Produced exactly once per job.
///
/// `message` is the output path or media title on success and a readable
/// cause on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,
}

impl JobOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<&DownloadError> for JobOutcome {
    fn from(err: &DownloadError) -> Self {
        JobOutcome::failed(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobEvent {
    pub job_id: JobId,
    pub kind: JobEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobEventKind {
    /// Percentage in `[0, 100]`.
    Progress(f64),
    Status(String),
    Done(JobOutcome),
}

impl JobEventKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEventKind::Done(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    #[error("network error: {0}")]
    Network(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("Cancelled by user")]
    Cancelled,
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        DownloadError::Storage(err.to_string())
    }
}

impl From<crate::PersistError> for DownloadError {
    fn from(err: crate::PersistError) -> Self {
        DownloadError::Storage(err.to_string())
    }
}
