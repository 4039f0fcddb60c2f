use std::path::{Path, PathBuf};

/// Target bitrate for audio-only presets.
pub const AUDIO_QUALITY_KBPS: u32 = 192;

/// Container used when separate video and audio streams are merged.
pub const MERGE_CONTAINER: &str = "mp4";

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatSelector {
    #[default]
    Best,
    Video720,
    Video360,
    AudioMp3,
    AudioM4a,
}

impl FormatSelector {
    pub const ALL: [FormatSelector; 5] = [
        FormatSelector::Best,
        FormatSelector::Video720,
        FormatSelector::Video360,
        FormatSelector::AudioMp3,
        FormatSelector::AudioM4a,
    ];

    /// Stream selection expression understood by the extractor.
    pub fn stream_selector(self) -> &'static str {
        match self {
            FormatSelector::Best => "best",
            FormatSelector::Video720 => "bestvideo[height<=720]+bestaudio/best[height<=720]",
            FormatSelector::Video360 => "bestvideo[height<=360]+bestaudio/best[height<=360]",
            FormatSelector::AudioMp3 | FormatSelector::AudioM4a => "bestaudio",
        }
    }

    pub fn audio_transcode(self) -> Option<AudioTranscode> {
        let codec = match self {
            FormatSelector::AudioMp3 => AudioCodec::Mp3,
            FormatSelector::AudioM4a => AudioCodec::M4a,
            _ => return None,
        };
        Some(AudioTranscode {
            codec,
            quality_kbps: AUDIO_QUALITY_KBPS,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    Mp3,
    M4a,
}

impl AudioCodec {
    pub fn as_str(self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::M4a => "m4a",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTranscode {
    pub codec: AudioCodec,
    pub quality_kbps: u32,
}

/// Fully resolved extractor options for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorOptions {
    pub format: &'static str,
    pub merge_output_format: &'static str,
    pub audio: Option<AudioTranscode>,
    pub output_template: PathBuf,
}

impl ExtractorOptions {
    pub fn resolve(selector: FormatSelector, output_dir: &Path) -> Self {
        Self {
            format: selector.stream_selector(),
            merge_output_format: MERGE_CONTAINER,
            audio: selector.audio_transcode(),
            output_template: output_dir.join(OUTPUT_TEMPLATE),
        }
    }
}
