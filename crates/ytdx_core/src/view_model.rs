use crate::{FormatPreset, LinkRow, RowId, RowPhase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub rows: Vec<RowView>,
    pub input: String,
    pub last_folder: String,
    pub format_preset: FormatPreset,
    pub dark_mode: bool,
    pub busy_rows: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub row_id: RowId,
    /// Title when known, the URL otherwise.
    pub label: String,
    pub url: String,
    pub status: String,
    pub percent: u8,
    pub phase: RowPhase,
    pub has_thumbnail: bool,
}

impl From<&LinkRow> for RowView {
    fn from(row: &LinkRow) -> Self {
        Self {
            row_id: row.row_id,
            label: row.title.clone().unwrap_or_else(|| row.url.clone()),
            url: row.url.clone(),
            status: row.status.clone(),
            percent: row.percent,
            phase: row.phase,
            has_thumbnail: row.thumbnail.is_some(),
        }
    }
}
