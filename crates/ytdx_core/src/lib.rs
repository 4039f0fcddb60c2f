//! ytdx core: pure state machine and view-model helpers for the link list.
mod classify;
mod effect;
mod msg;
mod settings;
mod state;
mod update;
mod view_model;

pub use classify::classify_url;
pub use effect::{DownloadKind, Effect};
pub use msg::Msg;
pub use settings::{FormatPreset, Settings};
pub use state::{AppState, JobId, LinkRow, RowId, RowPhase};
pub use update::update;
pub use view_model::{AppViewModel, RowView};
