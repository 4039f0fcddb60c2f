#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User edited the link input box.
    InputChanged(String),
    /// User pressed Add; every non-empty input line becomes a row.
    AddClicked,
    /// User removed the given rows.
    RemoveRows(Vec<crate::RowId>),
    /// User pressed Download All.
    DownloadAllClicked,
    /// User asked to stop the download attached to a row.
    CancelClicked(crate::RowId),
    /// User picked a download folder.
    FolderChosen(String),
    /// User picked a format preset.
    FormatSelected(crate::FormatPreset),
    /// User toggled dark mode.
    DarkModeToggled(bool),
    /// Background metadata lookup finished for a row.
    MetadataResolved {
        row_id: crate::RowId,
        title: Option<String>,
        thumbnail: Option<Vec<u8>>,
    },
    /// Percentage reported by a running job.
    JobProgress { job_id: crate::JobId, percent: f64 },
    /// Status text reported by a running job.
    JobStatus { job_id: crate::JobId, text: String },
    /// Terminal outcome of a job.
    JobDone {
        job_id: crate::JobId,
        success: bool,
        message: String,
    },
    /// Settings loaded at startup.
    RestoreSettings(crate::Settings),
    /// UI/render tick to coalesce rendering.
    Tick,
    NoOp,
}
