use std::collections::BTreeMap;

use crate::view_model::{AppViewModel, RowView};
use crate::Settings;

pub type RowId = u64;
pub type JobId = u64;

pub(crate) const WAITING_STATUS: &str = "Waiting";
pub(crate) const QUEUED_STATUS: &str = "Queued";
pub(crate) const CANCELLING_STATUS: &str = "Cancelling...";
pub(crate) const COMPLETED_STATUS: &str = "Completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPhase {
    /// Added, never submitted.
    Waiting,
    /// Submitted, no event received yet.
    Queued,
    /// At least one event received from its job.
    Active,
    Completed,
    Failed,
}

impl RowPhase {
    pub fn is_busy(self) -> bool {
        matches!(self, RowPhase::Queued | RowPhase::Active)
    }
}

/// One link in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    pub row_id: RowId,
    pub url: String,
    pub title: Option<String>,
    pub thumbnail: Option<Vec<u8>>,
    pub status: String,
    /// Whole percent shown by the progress bar.
    pub percent: u8,
    pub phase: RowPhase,
    pub job_id: Option<JobId>,
}

impl LinkRow {
    fn new(row_id: RowId, url: String) -> Self {
        Self {
            row_id,
            url,
            title: None,
            thumbnail: None,
            status: WAITING_STATUS.to_string(),
            percent: 0,
            phase: RowPhase::Waiting,
            job_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    rows: BTreeMap<RowId, LinkRow>,
    /// Jobs still expected to report, keyed to the row that started them.
    jobs: BTreeMap<JobId, RowId>,
    next_row_id: RowId,
    next_job_id: JobId,
    settings: Settings,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn row(&self, row_id: RowId) -> Option<&LinkRow> {
        self.rows.get(&row_id)
    }

    pub fn rows(&self) -> impl Iterator<Item = &LinkRow> {
        self.rows.values()
    }

    /// Jobs submitted and not yet reported as done.
    pub fn pending_jobs(&self) -> Vec<JobId> {
        self.jobs.keys().copied().collect()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            rows: self.rows.values().map(RowView::from).collect(),
            input: self.input.clone(),
            last_folder: self.settings.last_folder.clone(),
            format_preset: self.settings.format_preset,
            dark_mode: self.settings.dark_mode,
            busy_rows: self.rows.values().filter(|row| row.phase.is_busy()).count(),
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Forces the next `consume_dirty` to report a render.
    pub fn request_render(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, text: String) {
        self.input = text;
    }

    pub(crate) fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub(crate) fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub(crate) fn add_row(&mut self, url: String) -> RowId {
        self.next_row_id += 1;
        let row_id = self.next_row_id;
        self.rows.insert(row_id, LinkRow::new(row_id, url));
        row_id
    }

    pub(crate) fn remove_row(&mut self, row_id: RowId) -> bool {
        match self.rows.remove(&row_id) {
            Some(row) => {
                if let Some(job_id) = row.job_id {
                    self.jobs.remove(&job_id);
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn row_mut(&mut self, row_id: RowId) -> Option<&mut LinkRow> {
        self.rows.get_mut(&row_id)
    }

    /// Puts every idle row in the queued phase under a fresh job id.
    pub(crate) fn queue_idle_rows(&mut self) -> Vec<(JobId, String)> {
        let mut started = Vec::new();
        for row in self.rows.values_mut() {
            if row.phase.is_busy() {
                continue;
            }
            self.next_job_id += 1;
            let job_id = self.next_job_id;
            row.phase = RowPhase::Queued;
            row.status = QUEUED_STATUS.to_string();
            row.percent = 0;
            row.job_id = Some(job_id);
            self.jobs.insert(job_id, row.row_id);
            started.push((job_id, row.url.clone()));
        }
        started
    }

    /// Row still waiting on `job_id`; `None` for removed rows and stale jobs.
    pub(crate) fn row_for_job(&mut self, job_id: JobId) -> Option<&mut LinkRow> {
        let row_id = *self.jobs.get(&job_id)?;
        self.rows
            .get_mut(&row_id)
            .filter(|row| row.job_id == Some(job_id))
    }

    pub(crate) fn forget_job(&mut self, job_id: JobId) {
        self.jobs.remove(&job_id);
    }
}
