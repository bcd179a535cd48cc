//! Builder for executing external tool commands with timeout and
//! cancellation support.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use clipgif_common::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 64;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// The last lines of standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// The child is spawned with `kill_on_drop`, so dropping the future returned
/// by [`ToolCommand::execute`] also terminates the process.
///
/// # Example
///
/// ```no_run
/// use clipgif_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> clipgif_common::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .arg("-v").arg("error")
///     .arg("-print_format").arg("json")
///     .arg("-show_format")
///     .arg("/path/to/clip.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time. `None` waits indefinitely.
    pub fn timeout(&mut self, d: impl Into<Option<Duration>>) -> &mut Self {
        self.timeout = d.into();
        self
    }

    /// The full command line, space separated, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Short name of the program, used in errors and logs.
    pub fn program_name(&self) -> String {
        self.program
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and the stderr tail.
    pub async fn execute(&self) -> Result<ToolOutput> {
        self.execute_streaming(|_| {}, None).await
    }

    /// Execute the command, handing each stderr line to `on_line` as it is
    /// produced.
    ///
    /// Stdout is drained concurrently so neither pipe can fill up and stall
    /// the child.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program cannot be spawned because it
    ///   does not exist.
    /// - [`Error::Cancelled`] if `cancel` fires; the child is killed first.
    /// - [`Error::Timeout`] if the deadline passes; the child is killed first.
    /// - [`Error::ExternalTool`] on a non-zero exit, carrying the stderr tail.
    pub async fn execute_streaming<F>(
        &self,
        mut on_line: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<ToolOutput>
    where
        F: FnMut(&str),
    {
        let program_name = self.program_name();
        tracing::debug!("running {}", self.command_line());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(program_name.clone())
            } else {
                Error::external_tool(program_name.clone(), None, format!("failed to spawn: {e}"))
            }
        })?;

        let stdout_task = child.stdout.take().map(|mut stdout| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stdout.read_to_end(&mut buf).await;
                buf
            })
        });

        let mut stderr = child
            .stderr
            .take()
            .map(|s| BufReader::new(s).split(b'\n'));

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let never = CancellationToken::new();
        let cancel = cancel.unwrap_or(&never);
        let mut tail = StderrTail::default();

        let status = loop {
            tokio::select! {
                chunk = next_chunk(&mut stderr) => match chunk {
                    Some(bytes) => {
                        let line = String::from_utf8_lossy(&bytes);
                        let line = line.trim_end_matches('\r');
                        on_line(line);
                        tail.push(line);
                    }
                    None => {
                        break tokio::select! {
                            status = child.wait() => status?,
                            _ = cancel.cancelled() => {
                                kill(&mut child, &program_name).await;
                                return Err(Error::Cancelled);
                            }
                            _ = sleep_until(deadline) => {
                                kill(&mut child, &program_name).await;
                                return Err(timeout_error(&program_name, self.timeout));
                            }
                        };
                    }
                },
                _ = cancel.cancelled() => {
                    kill(&mut child, &program_name).await;
                    return Err(Error::Cancelled);
                }
                _ = sleep_until(deadline) => {
                    kill(&mut child, &program_name).await;
                    return Err(timeout_error(&program_name, self.timeout));
                }
            }
        };

        let stdout = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let output = ToolOutput {
            status,
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: tail.joined(),
        };

        if !status.success() {
            return Err(Error::external_tool(
                program_name,
                status.code(),
                output.stderr,
            ));
        }

        Ok(output)
    }
}

async fn next_chunk<R>(lines: &mut Option<tokio::io::Split<R>>) -> Option<Vec<u8>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    match lines {
        Some(split) => split.next_segment().await.ok().flatten(),
        None => None,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn kill(child: &mut tokio::process::Child, program_name: &str) {
    if let Err(e) = child.kill().await {
        tracing::warn!("failed to kill {}: {}", program_name, e);
    }
}

fn timeout_error(program_name: &str, after: Option<Duration>) -> Error {
    Error::Timeout {
        tool: program_name.to_string(),
        after: after.unwrap_or_default(),
    }
}

/// Ring buffer holding the most recent stderr lines.
#[derive(Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
}

impl StderrTail {
    fn push(&mut self, line: &str) {
        if self.lines.len() == STDERR_TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    fn joined(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}
