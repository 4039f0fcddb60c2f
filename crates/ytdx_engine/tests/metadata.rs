mod common;

use std::sync::{mpsc, Arc};
use std::time::Duration;

use common::*;
use ytdx_engine::{DownloadError, LinkMetadata, MediaInfo, MetadataFetcher};

fn fetch(fetcher: &MetadataFetcher, url: &str) -> LinkMetadata {
    let (tx, rx) = mpsc::channel();
    fetcher.fetch_async(url, move |metadata| {
        let _ = tx.send(metadata);
    });
    rx.recv_timeout(Duration::from_secs(10)).expect("metadata callback")
}

#[test]
fn resolves_title_and_thumbnail() {
    init_logging();
    let extractor = FakeExtractor::new(
        Vec::new(),
        Ok(MediaInfo {
            title: Some("Lecture 1".into()),
            thumbnail: Some("https://img.example/t.jpg".into()),
        }),
    );
    let http = Arc::new(FakeHttp::new(2048, 512));
    let fetcher = MetadataFetcher::new(http.clone(), Arc::new(extractor));

    let metadata = fetch(&fetcher, "https://video.example/lecture-1");
    fetcher.join();

    assert_eq!(metadata.title.as_deref(), Some("Lecture 1"));
    assert_eq!(metadata.thumbnail.map(|bytes| bytes.len()), Some(2048));
    assert_eq!(http.opened(), vec!["https://img.example/t.jpg".to_string()]);
}

#[test]
fn probe_failure_yields_empty_metadata() {
    init_logging();
    let extractor = FakeExtractor::new(
        Vec::new(),
        Err(DownloadError::Extraction("Unsupported URL".into())),
    );
    let fetcher = MetadataFetcher::new(Arc::new(FakeHttp::new(1, 1)), Arc::new(extractor));

    assert_eq!(fetch(&fetcher, "https://nothing.example"), LinkMetadata::default());
}

#[test]
fn thumbnail_failure_keeps_title() {
    init_logging();
    let extractor = FakeExtractor::new(
        Vec::new(),
        Ok(MediaInfo {
            title: Some("Only a title".into()),
            thumbnail: Some("https://img.example/missing.jpg".into()),
        }),
    );
    let fetcher = MetadataFetcher::new(Arc::new(FakeHttp::new(1, 1)), Arc::new(extractor));

    let metadata = fetch(&fetcher, "https://video.example/x");
    assert_eq!(metadata.title.as_deref(), Some("Only a title"));
    assert_eq!(metadata.thumbnail, None);
}
