use std::ops::ControlFlow;

use serde::Deserialize;

use crate::{channel::clamp_percent, DownloadError, ExtractorOptions};

const MIB: f64 = 1024.0 * 1024.0;

/// One progress report from the extraction engine, shaped like the
/// engine's own progress dictionary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractorProgress {
    #[serde(default)]
    pub status: ProgressStatus,
    #[serde(default)]
    pub downloaded_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
    /// Seconds remaining.
    #[serde(default)]
    pub eta: Option<f64>,
    /// Bytes per second.
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Error,
    #[default]
    #[serde(other)]
    Other,
}

impl ExtractorProgress {
    pub fn downloading(downloaded: u64, total: Option<u64>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            downloaded_bytes: Some(downloaded as f64),
            total_bytes: total.map(|t| t as f64),
            ..Self::default()
        }
    }

    pub fn finished() -> Self {
        Self {
            status: ProgressStatus::Finished,
            ..Self::default()
        }
    }

    /// `downloaded / total * 100` clamped to `[0, 100]`; 0 when no usable
    /// total (exact or estimated) is known.
    pub fn percent(&self) -> f64 {
        let total = self
            .total_bytes
            .filter(|t| *t > 0.0)
            .or(self.total_bytes_estimate.filter(|t| *t > 0.0));
        match (self.downloaded_bytes, total) {
            (Some(downloaded), Some(total)) => clamp_percent(downloaded / total * 100.0),
            _ => 0.0,
        }
    }

    /// Human readable status: ETA and speed when present, otherwise the
    /// absolute downloaded size.
    pub fn status_text(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(eta) = self.eta.filter(|e| e.is_finite() && *e >= 0.0) {
            parts.push(format!("ETA: {}", format_eta(eta as u64)));
        }
        if let Some(speed) = self.speed.filter(|s| s.is_finite() && *s > 0.0) {
            parts.push(format!("{:.1} MB/s", speed / MIB));
        }
        if parts.is_empty() {
            return self
                .downloaded_bytes
                .filter(|d| d.is_finite())
                .map(|d| format!("{:.1} MB", d / MIB));
        }
        Some(parts.join(" | "))
    }
}

fn format_eta(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Metadata returned by the extraction engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Callback handed to [`Extractor::extract`]. Returning `Break` asks the
/// engine to stop; it must not invoke the callback again afterwards.
pub type ProgressCallback<'a> = dyn FnMut(ExtractorProgress) -> ControlFlow<()> + 'a;

/// The external media-extraction engine.
///
/// Both calls block the calling thread for the duration of the work.
pub trait Extractor: Send + Sync {
    /// Resolves, downloads and post-processes `url` according to `options`.
    fn extract(
        &self,
        url: &str,
        options: &ExtractorOptions,
        on_progress: &mut ProgressCallback<'_>,
    ) -> Result<MediaInfo, DownloadError>;

    /// Resolves metadata without downloading.
    fn probe(&self, url: &str) -> Result<MediaInfo, DownloadError>;
}
