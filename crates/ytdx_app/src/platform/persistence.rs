use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ytdx_core::{FormatPreset, Settings};
use ytdx_engine::AtomicFileWriter;
use ytdx_logging::{ytdx_info, ytdx_warn};

pub(crate) const CONFIG_FILENAME: &str = ".ytdx_cfg.json";

/// Engine knobs kept next to the user settings. Unset fields use the
/// engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EngineConfig {
    pub ytdlp_path: Option<PathBuf>,
    pub ffmpeg_location: Option<PathBuf>,
    pub max_parallel_downloads: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppConfig {
    pub settings: Settings,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::with_folder(default_folder()),
            engine: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
struct PersistedConfig {
    last_folder: Option<String>,
    dark_mode: bool,
    format_preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ytdlp_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ffmpeg_location: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_parallel_downloads: Option<usize>,
}

impl From<PersistedConfig> for AppConfig {
    fn from(persisted: PersistedConfig) -> Self {
        let format_preset = persisted
            .format_preset
            .as_deref()
            .and_then(FormatPreset::from_label)
            .unwrap_or_default();
        Self {
            settings: Settings {
                last_folder: persisted
                    .last_folder
                    .filter(|folder| !folder.trim().is_empty())
                    .unwrap_or_else(default_folder),
                dark_mode: persisted.dark_mode,
                format_preset,
            },
            engine: EngineConfig {
                ytdlp_path: persisted.ytdlp_path,
                ffmpeg_location: persisted.ffmpeg_location,
                max_parallel_downloads: persisted.max_parallel_downloads.filter(|n| *n > 0),
            },
        }
    }
}

impl From<&AppConfig> for PersistedConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            last_folder: Some(config.settings.last_folder.clone()),
            dark_mode: config.settings.dark_mode,
            format_preset: Some(config.settings.format_preset.label().to_string()),
            ytdlp_path: config.engine.ytdlp_path.clone(),
            ffmpeg_location: config.engine.ffmpeg_location.clone(),
            max_parallel_downloads: config.engine.max_parallel_downloads,
        }
    }
}

/// The user's home directory, or the working directory when it is unknown.
pub(crate) fn default_folder() -> String {
    dirs_next::home_dir()
        .map(|home| home.display().to_string())
        .unwrap_or_else(|| ".".to_string())
}

pub(crate) fn load_config(dir: &Path) -> AppConfig {
    let path = dir.join(CONFIG_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return AppConfig::default();
        }
        Err(err) => {
            ytdx_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match serde_json::from_str::<PersistedConfig>(&content) {
        Ok(persisted) => {
            ytdx_info!("Loaded config from {:?}", path);
            AppConfig::from(persisted)
        }
        Err(err) => {
            ytdx_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}

pub(crate) fn save_config(dir: &Path, config: &AppConfig) {
    let content = match serde_json::to_string_pretty(&PersistedConfig::from(config)) {
        Ok(text) => text,
        Err(err) => {
            ytdx_warn!("Failed to serialize config: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(dir.to_path_buf());
    if let Err(err) = writer.write(CONFIG_FILENAME, &content) {
        ytdx_warn!("Failed to write config to {:?}: {}", dir, err);
    }
}
