//! [`Extractor`] backed by the `yt-dlp` command line program.
//!
//! Progress is read from stdout: `--progress-template` makes yt-dlp print its
//! progress dictionary as one JSON object per line behind a marker, and
//! `--print after_move:` reports the final title once post-processing is
//! done. Binary locations come from [`ExtractorSettings`]; the process
//! environment is never modified.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use ytdx_logging::{ytdx_debug, ytdx_trace, ytdx_warn};

use crate::extractor::ProgressCallback;
use crate::{DownloadError, Extractor, ExtractorOptions, ExtractorProgress, MediaInfo};

const PROGRESS_MARKER: &str = "ytdx-progress:";
const TITLE_MARKER: &str = "ytdx-title:";
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub ytdlp_path: PathBuf,
    /// Directory or binary passed to `--ffmpeg-location`.
    pub ffmpeg_location: Option<PathBuf>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            ffmpeg_location: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct YtDlpExtractor {
    settings: ExtractorSettings,
}

impl YtDlpExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.settings.ytdlp_path);
        command.stdin(Stdio::null());
        command
    }

    fn spawn_error(&self, err: std::io::Error) -> DownloadError {
        DownloadError::Extraction(format!(
            "failed to start {}: {err}",
            self.settings.ytdlp_path.display()
        ))
    }
}

impl Extractor for YtDlpExtractor {
    fn extract(
        &self,
        url: &str,
        options: &ExtractorOptions,
        on_progress: &mut ProgressCallback<'_>,
    ) -> Result<MediaInfo, DownloadError> {
        let mut child = self
            .command()
            .args(download_args(url, options, &self.settings))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.spawn_error(err))?;

        let stderr_tail = child.stderr.take().map(collect_stderr_tail);
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Extraction("failed to capture yt-dlp stdout".into()))?;

        let mut title = None;
        let mut stopped = false;
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    ytdx_warn!("Reading yt-dlp output failed: {}", err);
                    break;
                }
            };
            match parse_output_line(&line) {
                Some(OutputLine::Progress(progress)) => {
                    if on_progress(progress).is_break() {
                        stopped = true;
                        break;
                    }
                }
                Some(OutputLine::Title(resolved)) => title = Some(resolved),
                None => ytdx_trace!("yt-dlp: {}", line),
            }
        }

        if stopped {
            // Partial output stays on disk.
            let _ = child.kill();
            let _ = child.wait();
            return Err(DownloadError::Cancelled);
        }

        let status = child
            .wait()
            .map_err(|err| DownloadError::Extraction(err.to_string()))?;
        let stderr_lines = stderr_tail
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(DownloadError::Extraction(failure_message(&stderr_lines, status)));
        }

        Ok(MediaInfo {
            title,
            thumbnail: None,
        })
    }

    fn probe(&self, url: &str) -> Result<MediaInfo, DownloadError> {
        let output = self
            .command()
            .args(["--dump-single-json", "--skip-download", "--no-warnings", "--no-playlist", "--"])
            .arg(url)
            .output()
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<String> = stderr.lines().map(str::to_owned).collect();
            return Err(DownloadError::Extraction(failure_message(&lines, output.status)));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|err| DownloadError::Extraction(format!("unreadable metadata: {err}")))
    }
}

pub(crate) fn download_args(
    url: &str,
    options: &ExtractorOptions,
    settings: &ExtractorSettings,
) -> Vec<OsString> {
    let progress_template = format!("download:{PROGRESS_MARKER}%(progress)j");
    let print_title = format!("after_move:{TITLE_MARKER}%(title)s");
    let mut args: Vec<OsString> = [
        "--newline",
        "--no-warnings",
        "--progress",
        "--no-simulate",
        "--progress-template",
        progress_template.as_str(),
        "--print",
        print_title.as_str(),
        "-f",
        options.format,
        "--merge-output-format",
        options.merge_output_format,
        "-o",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(options.output_template.clone().into_os_string());

    if let Some(audio) = options.audio {
        args.extend(
            [
                "-x".to_string(),
                "--audio-format".to_string(),
                audio.codec.as_str().to_string(),
                "--audio-quality".to_string(),
                format!("{}K", audio.quality_kbps),
            ]
            .map(OsString::from),
        );
    }
    if let Some(ffmpeg) = &settings.ffmpeg_location {
        args.push("--ffmpeg-location".into());
        args.push(ffmpeg.clone().into_os_string());
    }
    args.push("--".into());
    args.push(url.into());
    args
}

#[derive(Debug, PartialEq)]
enum OutputLine {
    Progress(ExtractorProgress),
    Title(String),
}

fn parse_output_line(line: &str) -> Option<OutputLine> {
    let line = line.trim_start_matches('\r').trim_end();
    if let Some(json) = line.strip_prefix(PROGRESS_MARKER) {
        return match serde_json::from_str(json) {
            Ok(progress) => Some(OutputLine::Progress(progress)),
            Err(err) => {
                ytdx_debug!("Ignoring malformed progress line: {}", err);
                None
            }
        };
    }
    line.strip_prefix(TITLE_MARKER)
        .map(|title| OutputLine::Title(title.trim().to_string()))
}

fn collect_stderr_tail(stderr: impl Read + Send + 'static) -> JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            ytdx_debug!("yt-dlp stderr: {}", line);
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail.into()
    })
}

/// Prefers yt-dlp's own `ERROR:` line, then the last thing it printed.
fn failure_message(stderr_lines: &[String], status: ExitStatus) -> String {
    let last_error = stderr_lines
        .iter()
        .rev()
        .find_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(|msg| msg.trim().to_string());
    last_error
        .or_else(|| {
            stderr_lines
                .iter()
                .rev()
                .map(|line| line.trim())
                .find(|line| !line.is_empty())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| format!("yt-dlp exited with {status}"))
}
