//! Transcode invoker: runs the two ffmpeg passes for a [`ConversionJob`].
//!
//! [`TranscodeInvoker::invoke`] resolves ffmpeg, then starts the conversion
//! on a background task and hands back an [`Invocation`]. The invocation
//! carries the live tool log, a cancellation handle and the final result.
//! Everything the conversion creates lives in a [`Workspace`] until the
//! finished GIF is moved into place, so every failure path (error, timeout,
//! cancellation, dropped invocation) leaves the output location untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clipgif_av::probe::probe_with_ffprobe;
use clipgif_av::{ProgressTracker, ToolCommand, ToolRegistry, Workspace, FFMPEG, FFPROBE};
use clipgif_common::{Error, Field, Result};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use super::filters;
use super::request::ConversionJob;

const PALETTE_FILE: &str = "palette.png";

/// Runs conversions one at a time.
#[derive(Debug, Clone)]
pub struct TranscodeInvoker {
    tools: Arc<ToolRegistry>,
    timeout: Option<Duration>,
    temp_root: Option<PathBuf>,
    serial: Arc<Mutex<()>>,
}

impl TranscodeInvoker {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            timeout: None,
            temp_root: None,
            serial: Arc::new(Mutex::new(())),
        }
    }

    /// Wall-clock limit across both passes. `None` disables it.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory in which workspaces are created. Defaults to the system
    /// temp directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Start converting `job`.
    ///
    /// Clones of this invoker share one queue: a second job waits until the
    /// first has finished.
    ///
    /// # Errors
    ///
    /// [`Error::ToolNotFound`] if ffmpeg is missing. Nothing has touched the
    /// filesystem at that point. All later failures are reported by
    /// [`Invocation::wait`].
    pub async fn invoke(&self, job: ConversionJob) -> Result<Invocation> {
        let ffmpeg = self.tools.require(FFMPEG)?.path.clone();
        let ffprobe = self.tools.get(FFPROBE).map(|t| t.path.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let run = Run {
            job,
            ffmpeg,
            ffprobe,
            timeout: self.timeout,
            temp_root: self
                .temp_root
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            log: tx,
            cancel: cancel.clone(),
        };
        let serial = self.serial.clone();

        let handle = tokio::spawn(async move {
            let _turn = tokio::select! {
                guard = serial.lock_owned() => guard,
                _ = run.cancel.cancelled() => return Err(Error::Cancelled),
            };
            run.execute().await
        });

        Ok(Invocation {
            logs: Some(LogStream { rx }),
            cancel,
            handle: Some(handle),
        })
    }
}

/// Tool log lines in emission order.
#[derive(Debug)]
pub struct LogStream {
    rx: mpsc::UnboundedReceiver<String>,
}

impl LogStream {
    /// Next line, or `None` once the conversion has finished.
    pub async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Blocking variant of [`LogStream::next`] for use from a plain thread.
    /// Must not be called from within an async runtime.
    pub fn blocking_next(&mut self) -> Option<String> {
        self.rx.blocking_recv()
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<String> {
        UnboundedReceiverStream::new(self.rx)
    }
}

/// A conversion in flight.
///
/// Dropping an invocation that has not been waited on cancels it.
#[derive(Debug)]
pub struct Invocation {
    logs: Option<LogStream>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<Result<PathBuf>>>,
}

impl Invocation {
    /// Take the log stream. Returns `None` after the first call.
    pub fn take_logs(&mut self) -> Option<LogStream> {
        self.logs.take()
    }

    /// Request cancellation. The running tool is killed and
    /// [`Invocation::wait`] returns [`Error::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels this invocation, e.g. from a signal handler.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the conversion and return the output path.
    ///
    /// A panic inside the conversion task is resumed on the caller.
    pub async fn wait(mut self) -> Result<PathBuf> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Err(Error::Cancelled),
        };
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(Error::Cancelled),
        }
    }
}

impl Drop for Invocation {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}

struct Run {
    job: ConversionJob,
    ffmpeg: PathBuf,
    ffprobe: Option<PathBuf>,
    timeout: Option<Duration>,
    temp_root: PathBuf,
    log: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl Run {
    async fn execute(self) -> Result<PathBuf> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let job = &self.job;

        tracing::info!(
            "converting {} -> {}",
            job.source_path().display(),
            job.output_path().display()
        );

        self.emit(summary(job));
        self.check_source_length().await?;

        let workspace = Workspace::new_in(&self.temp_root, job.output_path())?;
        let palette = workspace.temp_file(PALETTE_FILE);
        let staged = workspace.output();

        self.emit("[1/2] generating palette".to_string());
        self.pass(1, filters::palette_args(job, &palette), deadline)
            .await?;

        self.emit("[2/2] encoding gif".to_string());
        self.pass(2, filters::encode_args(job, &palette, &staged), deadline)
            .await?;

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let output = workspace.finalize(job.output_path())?;
        tracing::info!("wrote {}", output.display());
        Ok(output)
    }

    /// Reject the range if the source length was unknown at build time and
    /// turns out to be too short.
    async fn check_source_length(&self) -> Result<()> {
        let job = &self.job;
        if job.source_length().is_some() {
            return Ok(());
        }
        let Some(ffprobe) = &self.ffprobe else {
            tracing::debug!("source length unknown and ffprobe unavailable, skipping range check");
            return Ok(());
        };

        let probed = tokio::select! {
            probed = probe_with_ffprobe(ffprobe, job.source_path()) => probed,
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
        };
        let length = match probed {
            Ok(info) => info.duration,
            Err(e) => {
                tracing::warn!("could not probe {}: {}", job.source_path().display(), e);
                None
            }
        };

        match length {
            Some(length) if job.end_time() > length => Err(Error::validation(
                Field::Duration,
                format!(
                    "range ends at {}s but the source is only {}s long",
                    filters::seconds(job.end_time()),
                    filters::seconds(length)
                ),
            )),
            _ => Ok(()),
        }
    }

    async fn pass(&self, number: u8, args: Vec<String>, deadline: Option<Instant>) -> Result<()> {
        let remaining = match deadline {
            Some(at) => {
                let left = at.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return Err(self.timed_out());
                }
                Some(left)
            }
            None => None,
        };

        let mut command = ToolCommand::new(self.ffmpeg.clone());
        command.args(args).timeout(remaining);
        self.emit(command.command_line());

        let mut tracker = ProgressTracker::new(self.job.duration());
        let log = &self.log;
        let result = command
            .execute_streaming(
                |line| {
                    if let Some(progress) = tracker.feed(line) {
                        tracing::debug!(
                            pass = number,
                            frame = progress.frame,
                            "pass {}/2: {:.0}%",
                            number,
                            progress.pct * 100.0
                        );
                    }
                    let _ = log.send(line.to_string());
                },
                Some(&self.cancel),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(Error::Timeout { .. }) => Err(self.timed_out()),
            Err(e) => Err(e),
        }
    }

    fn timed_out(&self) -> Error {
        Error::Timeout {
            tool: tool_name(&self.ffmpeg),
            after: self.timeout.unwrap_or_default(),
        }
    }

    fn emit(&self, line: String) {
        let _ = self.log.send(line);
    }
}

/// One-line description of the job's parameters.
fn summary(job: &ConversionJob) -> String {
    format!(
        "{} -> {}: {}s from {}s, {} fps, width {}, quality {} (bayer_scale {}), {} dither, {} colours",
        job.source_path().display(),
        job.output_path().display(),
        filters::seconds(job.duration()),
        filters::seconds(job.start_time()),
        job.frame_rate(),
        job.output_width(),
        job.quality(),
        job.bayer_scale(),
        job.dither_mode(),
        job.palette_size()
    )
}

fn tool_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| FFMPEG.to_string())
}
