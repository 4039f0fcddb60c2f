use crate::state::{CANCELLING_STATUS, COMPLETED_STATUS};
use crate::{classify_url, AppState, Effect, Msg, RowPhase};

const EMPTY_INPUT_TITLE: &str = "Empty";
const EMPTY_INPUT_MESSAGE: &str = "Please enter a valid link";
const NO_LINKS_TITLE: &str = "No Links";
const NO_LINKS_MESSAGE: &str = "Add links before downloading.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::AddClicked => {
            let urls = parse_urls(&state.take_input());
            if urls.is_empty() {
                return (
                    state,
                    vec![Effect::warning(EMPTY_INPUT_TITLE, EMPTY_INPUT_MESSAGE)],
                );
            }
            state.mark_dirty();
            urls.into_iter()
                .map(|url| {
                    let row_id = state.add_row(url.clone());
                    Effect::FetchMetadata { row_id, url }
                })
                .collect()
        }
        Msg::RemoveRows(row_ids) => {
            let mut removed = false;
            for row_id in row_ids {
                removed |= state.remove_row(row_id);
            }
            if removed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DownloadAllClicked => {
            if state.rows().next().is_none() {
                return (
                    state,
                    vec![Effect::warning(NO_LINKS_TITLE, NO_LINKS_MESSAGE)],
                );
            }
            let output_dir = state.settings().last_folder.clone();
            let format = state.settings().format_preset;
            let started = state.queue_idle_rows();
            if !started.is_empty() {
                state.mark_dirty();
            }
            started
                .into_iter()
                .map(|(job_id, url)| Effect::StartDownload {
                    job_id,
                    kind: classify_url(&url),
                    url,
                    output_dir: output_dir.clone(),
                    format,
                })
                .collect()
        }
        Msg::CancelClicked(row_id) => match state.row_mut(row_id) {
            Some(row) if row.phase.is_busy() => match row.job_id {
                Some(job_id) => {
                    row.status = CANCELLING_STATUS.to_string();
                    state.mark_dirty();
                    vec![Effect::CancelJob { job_id }]
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        },
        Msg::FolderChosen(folder) => {
            let folder = folder.trim().to_string();
            if folder.is_empty() || folder == state.settings().last_folder {
                Vec::new()
            } else {
                state.settings_mut().last_folder = folder;
                persist(&mut state)
            }
        }
        Msg::FormatSelected(preset) => {
            if preset == state.settings().format_preset {
                Vec::new()
            } else {
                state.settings_mut().format_preset = preset;
                persist(&mut state)
            }
        }
        Msg::DarkModeToggled(enabled) => {
            if enabled == state.settings().dark_mode {
                Vec::new()
            } else {
                state.settings_mut().dark_mode = enabled;
                persist(&mut state)
            }
        }
        Msg::MetadataResolved {
            row_id,
            title,
            thumbnail,
        } => {
            if let Some(row) = state.row_mut(row_id) {
                let mut changed = false;
                if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
                    row.title = Some(title);
                    changed = true;
                }
                if let Some(thumbnail) = thumbnail {
                    row.thumbnail = Some(thumbnail);
                    changed = true;
                }
                if changed {
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::JobProgress { job_id, percent } => {
            if let Some(row) = state.row_for_job(job_id) {
                row.phase = RowPhase::Active;
                row.percent = whole_percent(percent);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobStatus { job_id, text } => {
            if let Some(row) = state.row_for_job(job_id) {
                row.phase = RowPhase::Active;
                row.status = text;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::JobDone {
            job_id,
            success,
            message,
        } => {
            let effects = match state.row_for_job(job_id) {
                Some(row) => {
                    row.job_id = None;
                    if success {
                        row.phase = RowPhase::Completed;
                        row.status = COMPLETED_STATUS.to_string();
                        row.percent = 100;
                    } else {
                        row.phase = RowPhase::Failed;
                        row.status = format!("Failed: {message}");
                    }
                    state.mark_dirty();
                    if success {
                        vec![Effect::PlayNotification]
                    } else {
                        Vec::new()
                    }
                }
                None => Vec::new(),
            };
            state.forget_job(job_id);
            effects
        }
        Msg::RestoreSettings(settings) => {
            *state.settings_mut() = settings;
            state.mark_dirty();
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn persist(state: &mut AppState) -> Vec<Effect> {
    state.mark_dirty();
    vec![Effect::PersistSettings(state.settings().clone())]
}

fn whole_percent(percent: f64) -> u8 {
    if percent.is_nan() {
        0
    } else {
        percent.clamp(0.0, 100.0) as u8
    }
}

fn parse_urls(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
