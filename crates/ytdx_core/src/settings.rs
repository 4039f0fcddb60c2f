/// Format choice offered to the user. The labels are also the persisted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatPreset {
    #[default]
    Best,
    P720,
    P360,
    AudioMp3,
    AudioM4a,
}

impl FormatPreset {
    pub const ALL: [FormatPreset; 5] = [
        FormatPreset::Best,
        FormatPreset::P720,
        FormatPreset::P360,
        FormatPreset::AudioMp3,
        FormatPreset::AudioM4a,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormatPreset::Best => "Best (video+audio)",
            FormatPreset::P720 => "720p",
            FormatPreset::P360 => "360p",
            FormatPreset::AudioMp3 => "Audio (mp3)",
            FormatPreset::AudioM4a => "Audio (m4a)",
        }
    }

    /// Exact label match; unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.label() == label.trim())
    }
}

/// User preferences that survive a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub last_folder: String,
    pub dark_mode: bool,
    pub format_preset: FormatPreset,
}

impl Settings {
    pub fn with_folder(folder: impl Into<String>) -> Self {
        Self {
            last_folder: folder.into(),
            dark_mode: false,
            format_preset: FormatPreset::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_folder(".")
    }
}
