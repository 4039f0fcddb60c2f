use url::Url;

use crate::DownloadKind;

/// Extensions fetched with a plain GET instead of the media extractor.
const DIRECT_FILE_EXTENSIONS: &[&str] = &[
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz", "iso", "img", "dmg", "exe", "msi",
    "deb", "rpm", "apk", "pdf", "epub", "txt", "csv", "json", "bin",
];

/// Picks the download strategy for a link from the file extension of its
/// path. Media files and page URLs go through the extractor so the format
/// preset applies.
pub fn classify_url(raw: &str) -> DownloadKind {
    let Ok(url) = Url::parse(raw.trim()) else {
        return DownloadKind::Extractor;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return DownloadKind::Extractor;
    }
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .unwrap_or_default();
    let extension = last
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if DIRECT_FILE_EXTENSIONS.contains(&extension.as_str()) {
        DownloadKind::Http
    } else {
        DownloadKind::Extractor
    }
}
