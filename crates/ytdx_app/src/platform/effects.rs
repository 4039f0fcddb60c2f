use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use anyhow::Context;
use ytdx_core::{DownloadKind, Effect, FormatPreset, JobId, Msg};
use ytdx_engine::{
    default_worker_count, CancelToken, DownloadJob, Extractor, ExtractorSettings, FormatSelector,
    HttpSettings, HttpSource, JobContext, JobDispatcher, JobEvent, JobEventKind, JobKind, JobSpec,
    MetadataFetcher, ProgressChannel, ReqwestSource, YtDlpExtractor,
};
use ytdx_logging::{ytdx_info, ytdx_job, ytdx_warn};

use super::app::AppEvent;
use super::persistence::{self, AppConfig, EngineConfig};
use super::ui;

/// Executes core effects against the engine and owns the job bookkeeping
/// the UI thread needs: the event receiver and one cancel token per job.
pub struct EffectRunner {
    dispatcher: JobDispatcher,
    metadata: MetadataFetcher,
    context: JobContext,
    job_tx: mpsc::Sender<JobEvent>,
    job_rx: mpsc::Receiver<JobEvent>,
    cancels: HashMap<JobId, CancelToken>,
    app_tx: mpsc::Sender<AppEvent>,
    config_dir: PathBuf,
    engine: EngineConfig,
}

impl EffectRunner {
    pub fn new(
        engine: EngineConfig,
        config_dir: PathBuf,
        app_tx: mpsc::Sender<AppEvent>,
    ) -> anyhow::Result<Self> {
        let http: Arc<dyn HttpSource> = Arc::new(
            ReqwestSource::new(HttpSettings::default()).context("failed to build HTTP client")?,
        );
        let mut extractor_settings = ExtractorSettings::default();
        if let Some(path) = &engine.ytdlp_path {
            extractor_settings.ytdlp_path = path.clone();
        }
        extractor_settings.ffmpeg_location = engine.ffmpeg_location.clone();
        let extractor: Arc<dyn Extractor> = Arc::new(YtDlpExtractor::new(extractor_settings));

        let workers = engine
            .max_parallel_downloads
            .unwrap_or_else(default_worker_count);
        Ok(Self::with_collaborators(
            JobContext { http, extractor },
            workers,
            engine,
            config_dir,
            app_tx,
        ))
    }

    fn with_collaborators(
        context: JobContext,
        workers: usize,
        engine: EngineConfig,
        config_dir: PathBuf,
        app_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let (job_tx, job_rx) = mpsc::channel();
        Self {
            dispatcher: JobDispatcher::new(workers),
            metadata: MetadataFetcher::new(context.http.clone(), context.extractor.clone()),
            context,
            job_tx,
            job_rx,
            cancels: HashMap::new(),
            app_tx,
            config_dir,
            engine,
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>, dark_mode: bool) {
        for effect in effects {
            match effect {
                Effect::FetchMetadata { row_id, url } => {
                    let app_tx = self.app_tx.clone();
                    self.metadata.fetch_async(url, move |metadata| {
                        let _ = app_tx.send(AppEvent::Ui(Msg::MetadataResolved {
                            row_id,
                            title: metadata.title,
                            thumbnail: metadata.thumbnail,
                        }));
                    });
                }
                Effect::StartDownload {
                    job_id,
                    url,
                    output_dir,
                    format,
                    kind,
                } => {
                    let spec = JobSpec {
                        url,
                        output_dir: PathBuf::from(output_dir),
                        format: map_format(format),
                        kind: map_kind(kind),
                    };
                    let cancel = CancelToken::new();
                    self.cancels.insert(job_id, cancel.clone());
                    let channel = ProgressChannel::new(job_id, self.job_tx.clone());
                    self.dispatcher
                        .submit(DownloadJob::new(spec, channel, cancel, self.context.clone()));
                }
                Effect::CancelJob { job_id } => {
                    if let Some(cancel) = self.cancels.get(&job_id) {
                        ytdx_job!(info, job_id, "cancel requested");
                        cancel.cancel();
                    }
                }
                Effect::PersistSettings(settings) => {
                    let config = AppConfig {
                        settings,
                        engine: self.engine.clone(),
                    };
                    persistence::save_config(&self.config_dir, &config);
                }
                Effect::PlayNotification => {
                    // Terminal bell.
                    let mut stdout = std::io::stdout();
                    let _ = stdout.write_all(b"\x07");
                    let _ = stdout.flush();
                }
                Effect::ShowWarning { title, message } => {
                    println!("{}", ui::render::render_warning(&title, &message, dark_mode));
                }
            }
        }
    }

    /// Moves every pending job event onto the calling thread as messages.
    pub fn drain_job_events(&mut self) -> Vec<Msg> {
        let mut msgs = Vec::new();
        while let Ok(event) = self.job_rx.try_recv() {
            let job_id = event.job_id;
            let msg = match event.kind {
                JobEventKind::Progress(percent) => Msg::JobProgress { job_id, percent },
                JobEventKind::Status(text) => Msg::JobStatus { job_id, text },
                JobEventKind::Done(outcome) => {
                    self.cancels.remove(&job_id);
                    Msg::JobDone {
                        job_id,
                        success: outcome.success,
                        message: outcome.message,
                    }
                }
            };
            msgs.push(msg);
        }
        msgs
    }

    /// Cancels every job still running and waits for the workers.
    /// Metadata lookups are abandoned.
    pub fn shutdown(self) {
        let Self {
            mut dispatcher,
            cancels,
            ..
        } = self;
        ytdx_info!("Shutting down with {} unfinished jobs", cancels.len());
        for cancel in cancels.values() {
            cancel.cancel();
        }
        dispatcher.shutdown();
        if dispatcher.active() > 0 {
            ytdx_warn!("Waiting for {} running jobs to stop", dispatcher.active());
        }
        dispatcher.join();
    }
}

fn map_format(preset: FormatPreset) -> FormatSelector {
    match preset {
        FormatPreset::Best => FormatSelector::Best,
        FormatPreset::P720 => FormatSelector::Video720,
        FormatPreset::P360 => FormatSelector::Video360,
        FormatPreset::AudioMp3 => FormatSelector::AudioMp3,
        FormatPreset::AudioM4a => FormatSelector::AudioM4a,
    }
}

fn map_kind(kind: DownloadKind) -> JobKind {
    match kind {
        DownloadKind::Http => JobKind::GenericHttp,
        DownloadKind::Extractor => JobKind::ExtractorBased,
    }
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;
    use std::path::Path;
    use std::time::{Duration, Instant};

    use ytdx_core::{RowId, Settings};
    use ytdx_engine::{
        DownloadError, ExtractorOptions, ExtractorProgress, HttpBody, JobOutcome, MediaInfo,
        ProgressCallback, FINALIZING_STATUS,
    };

    use super::*;

    struct OfflineHttp;

    #[async_trait::async_trait]
    impl HttpSource for OfflineHttp {
        async fn open(&self, _url: &str) -> Result<HttpBody, DownloadError> {
            Err(DownloadError::Network("offline".into()))
        }
    }

    /// Reports half way, then finished, then returns a fixed title.
    struct ScriptedExtractor;

    impl Extractor for ScriptedExtractor {
        fn extract(
            &self,
            _url: &str,
            _options: &ExtractorOptions,
            on_progress: &mut ProgressCallback<'_>,
        ) -> Result<MediaInfo, DownloadError> {
            for event in [
                ExtractorProgress::downloading(50, Some(100)),
                ExtractorProgress::finished(),
            ] {
                if let ControlFlow::Break(()) = on_progress(event) {
                    return Err(DownloadError::Cancelled);
                }
            }
            self.probe("")
        }

        fn probe(&self, _url: &str) -> Result<MediaInfo, DownloadError> {
            Ok(MediaInfo {
                title: Some("Clip".to_string()),
                thumbnail: None,
            })
        }
    }

    fn runner(config_dir: &Path) -> (EffectRunner, mpsc::Receiver<AppEvent>) {
        ytdx_logging::initialize_for_tests();
        let (app_tx, app_rx) = mpsc::channel();
        let context = JobContext {
            http: Arc::new(OfflineHttp),
            extractor: Arc::new(ScriptedExtractor),
        };
        let runner = EffectRunner::with_collaborators(
            context,
            2,
            EngineConfig::default(),
            config_dir.to_path_buf(),
            app_tx,
        );
        (runner, app_rx)
    }

    fn drain_until_done(runner: &mut EffectRunner, jobs: usize) -> Vec<Msg> {
        let deadline = Instant::now() + Duration::from_secs(20);
        let mut msgs = Vec::new();
        while msgs
            .iter()
            .filter(|msg| matches!(msg, Msg::JobDone { .. }))
            .count()
            < jobs
        {
            assert!(Instant::now() < deadline, "timed out, got {msgs:?}");
            msgs.extend(runner.drain_job_events());
            std::thread::sleep(Duration::from_millis(5));
        }
        msgs
    }

    #[test]
    fn job_events_become_messages_in_per_job_order() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runner, _app_rx) = runner(dir.path());
        runner.cancels.insert(1, CancelToken::new());
        runner.cancels.insert(2, CancelToken::new());

        let first = ProgressChannel::new(1, runner.job_tx.clone());
        let second = ProgressChannel::new(2, runner.job_tx.clone());
        first.progress(10.0);
        second.status("resolving");
        first.status("1.0 MB / 4.0 MB");
        second.finish(JobOutcome::succeeded("two"));
        first.progress(140.0);
        first.finish(JobOutcome::failed("boom"));

        let msgs = runner.drain_job_events();
        assert_eq!(
            msgs,
            vec![
                Msg::JobProgress { job_id: 1, percent: 10.0 },
                Msg::JobStatus { job_id: 2, text: "resolving".to_string() },
                Msg::JobStatus { job_id: 1, text: "1.0 MB / 4.0 MB".to_string() },
                Msg::JobDone { job_id: 2, success: true, message: "two".to_string() },
                Msg::JobProgress { job_id: 1, percent: 100.0 },
                Msg::JobDone { job_id: 1, success: false, message: "boom".to_string() },
            ]
        );
        assert!(runner.cancels.is_empty());
        assert!(runner.drain_job_events().is_empty());
        runner.shutdown();
    }

    #[test]
    fn started_download_reports_back_and_releases_its_token() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runner, _app_rx) = runner(dir.path());
        runner.run(
            vec![Effect::StartDownload {
                job_id: 5,
                url: "https://video.example/watch?v=1".to_string(),
                output_dir: dir.path().join("out").display().to_string(),
                format: FormatPreset::P360,
                kind: DownloadKind::Extractor,
            }],
            false,
        );

        let msgs = drain_until_done(&mut runner, 1);
        assert!(msgs.iter().all(|msg| match msg {
            Msg::JobProgress { job_id, .. }
            | Msg::JobStatus { job_id, .. }
            | Msg::JobDone { job_id, .. } => *job_id == 5,
            _ => false,
        }));
        let progress: Vec<f64> = msgs
            .iter()
            .filter_map(|msg| match msg {
                Msg::JobProgress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![50.0, 100.0]);
        assert!(msgs.contains(&Msg::JobStatus {
            job_id: 5,
            text: FINALIZING_STATUS.to_string(),
        }));
        assert_eq!(
            msgs.last(),
            Some(&Msg::JobDone {
                job_id: 5,
                success: true,
                message: "Clip".to_string(),
            })
        );
        assert!(runner.cancels.is_empty());
        runner.shutdown();
    }

    #[test]
    fn cancel_effect_sets_the_jobs_token() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runner, _app_rx) = runner(dir.path());
        let token = CancelToken::new();
        let other = CancelToken::new();
        runner.cancels.insert(9, token.clone());
        runner.cancels.insert(10, other.clone());

        runner.run(
            vec![Effect::CancelJob { job_id: 9 }, Effect::CancelJob { job_id: 77 }],
            false,
        );
        assert!(token.is_cancelled());
        assert!(!other.is_cancelled());
        runner.shutdown();
    }

    #[test]
    fn metadata_is_forwarded_to_the_ui_queue() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runner, app_rx) = runner(dir.path());
        let row: RowId = 3;
        runner.run(
            vec![Effect::FetchMetadata {
                row_id: row,
                url: "https://video.example/watch?v=3".to_string(),
            }],
            false,
        );

        match app_rx.recv_timeout(Duration::from_secs(20)) {
            Ok(AppEvent::Ui(msg)) => assert_eq!(
                msg,
                Msg::MetadataResolved {
                    row_id: row,
                    title: Some("Clip".to_string()),
                    thumbnail: None,
                }
            ),
            Ok(_) => panic!("unexpected app event"),
            Err(err) => panic!("no metadata: {err}"),
        }
        runner.shutdown();
    }

    #[test]
    fn persist_effect_writes_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runner, _app_rx) = runner(dir.path());
        let mut settings = Settings::with_folder("/srv/media");
        settings.format_preset = FormatPreset::AudioM4a;
        runner.run(vec![Effect::PersistSettings(settings.clone())], false);

        assert_eq!(persistence::load_config(dir.path()).settings, settings);
        runner.shutdown();
    }

    #[test]
    fn presets_and_kinds_map_onto_engine_types() {
        let formats: Vec<(FormatPreset, FormatSelector)> = FormatPreset::ALL
            .into_iter()
            .map(|preset| (preset, map_format(preset)))
            .collect();
        assert_eq!(
            formats,
            vec![
                (FormatPreset::Best, FormatSelector::Best),
                (FormatPreset::P720, FormatSelector::Video720),
                (FormatPreset::P360, FormatSelector::Video360),
                (FormatPreset::AudioMp3, FormatSelector::AudioMp3),
                (FormatPreset::AudioM4a, FormatSelector::AudioM4a),
            ]
        );
        assert_eq!(map_kind(DownloadKind::Http), JobKind::GenericHttp);
        assert_eq!(map_kind(DownloadKind::Extractor), JobKind::ExtractorBased);
    }
}
