use crate::{FormatPreset, JobId, RowId, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    /// Plain streaming GET into the folder.
    Http,
    /// Media extraction with the selected preset.
    Extractor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchMetadata {
        row_id: RowId,
        url: String,
    },
    StartDownload {
        job_id: JobId,
        url: String,
        output_dir: String,
        format: FormatPreset,
        kind: DownloadKind,
    },
    CancelJob {
        job_id: JobId,
    },
    PersistSettings(Settings),
    PlayNotification,
    ShowWarning {
        title: String,
        message: String,
    },
}

impl Effect {
    pub(crate) fn warning(title: &str, message: &str) -> Self {
        Effect::ShowWarning {
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}
