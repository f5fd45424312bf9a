//! Launching the external renderer.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use liveview_scene_model::{QualityTier, RenderRequest};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::locator::{locate, locate_in_output};
use crate::sink::OutputSink;

/// Default renderer executable.
pub const DEFAULT_EXECUTABLE: &str = "manim";

/// Flag that makes the renderer skip its partial-movie cache.
pub const DISABLE_CACHE_FLAG: &str = "--disable_caching";

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Errors from a single render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to start {executable}: {source}")]
    ProcessSpawnFailed {
        executable: String,
        source: std::io::Error,
    },

    #[error("Renderer {}", describe_exit(.exit_code))]
    ExternalProcessFailed { exit_code: Option<i32> },

    #[error("Render supervision failed: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
        }
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// How a render that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The video exists at this path.
    Ready(PathBuf),
    /// The renderer succeeded but no video could be found.
    NotFound,
    /// The render was cancelled through its handle.
    Cancelled,
}

impl RenderOutcome {
    pub fn artifact(&self) -> Option<&Path> {
        match self {
            Self::Ready(path) => Some(path),
            _ => None,
        }
    }
}

/// Runs the renderer and resolves its output.
#[derive(Debug, Clone)]
pub struct RenderInvoker {
    executable: String,
    output_root: PathBuf,
}

impl RenderInvoker {
    /// Invoker for the default executable writing under `output_root`.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            output_root: output_root.into(),
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// `[source, scene, quality flag, cache flag?]`
    pub fn build_args(&self, request: &RenderRequest) -> Vec<String> {
        let mut args = vec![
            request.source_file.to_string_lossy().into_owned(),
            request.scene_name.clone(),
            request.quality.flag().to_string(),
        ];
        if request.disable_cache {
            args.push(DISABLE_CACHE_FLAG.to_string());
        }
        args
    }

    /// Whether the executable can be found.
    pub fn is_available(&self) -> bool {
        executable_exists(&self.executable)
    }

    /// Run a render to completion.
    pub async fn run(
        &self,
        request: &RenderRequest,
        sink: Arc<dyn OutputSink>,
        working_dir: &Path,
    ) -> Result<RenderOutcome, RenderError> {
        self.start(request, sink, working_dir)?.wait().await
    }

    /// Spawn the renderer and return a handle to await or cancel it.
    ///
    /// Must be called from within a Tokio runtime. Spawn failures are
    /// reported to `sink` as well as returned.
    pub fn start(
        &self,
        request: &RenderRequest,
        sink: Arc<dyn OutputSink>,
        working_dir: &Path,
    ) -> Result<RenderHandle, RenderError> {
        let args = self.build_args(request);
        sink.append_line(&format!("Running: {} {}", self.executable, args.join(" ")));
        tracing::debug!(
            executable = %self.executable,
            ?args,
            cwd = %working_dir.display(),
            "Spawning renderer"
        );

        let mut cmd = Command::new(&self.executable);
        cmd.args(&args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                tracing::warn!(executable = %self.executable, error = %source, "Failed to spawn renderer");
                sink.append_line(&format!("Error spawning {}: {source}", self.executable));
                sink.append_line(&format!(
                    "Please make sure {} is installed and accessible.",
                    self.executable
                ));
                return Err(RenderError::ProcessSpawnFailed {
                    executable: self.executable.clone(),
                    source,
                });
            }
        };

        let pid = child.id();
        tracing::info!(
            pid,
            scene = %request.scene_name,
            quality = request.quality.code(),
            "Renderer process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderError::internal("Failed to capture renderer stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::internal("Failed to capture renderer stderr"))?;

        // Both streams are drained concurrently so neither pipe can fill up and stall the child.
        let stdout_task = tokio::spawn(pump(stdout, Arc::clone(&sink), true));
        let stderr_task = tokio::spawn(pump(stderr, sink, false));

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let job = ResolveJob {
            output_root: self.output_root.clone(),
            scene_name: request.scene_name.clone(),
            quality: request.quality,
            working_dir: working_dir.to_path_buf(),
        };
        let task = tokio::spawn(supervise(child, stdout_task, stderr_task, cancel_rx, job));

        Ok(RenderHandle {
            pid,
            cancel: CancelToken {
                tx: Arc::new(Mutex::new(Some(cancel_tx))),
            },
            task,
        })
    }
}

/// Cancels a running render. Clones share the same render.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl CancelToken {
    /// Kill the renderer. Returns `false` if already cancelled or finished.
    pub fn cancel(&self) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        sender.map_or(false, |tx| tx.send(()).is_ok())
    }
}

/// A running render.
#[derive(Debug)]
pub struct RenderHandle {
    pid: Option<u32>,
    cancel: CancelToken,
    task: JoinHandle<Result<RenderOutcome, RenderError>>,
}

impl RenderHandle {
    /// OS process id of the renderer, if it is still known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Kill the renderer; [`RenderHandle::wait`] then yields [`RenderOutcome::Cancelled`].
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Wait for the renderer to exit and resolve its artifact.
    pub async fn wait(self) -> Result<RenderOutcome, RenderError> {
        self.task
            .await
            .map_err(|e| RenderError::internal(format!("render task failed: {e}")))?
    }
}

struct ResolveJob {
    output_root: PathBuf,
    scene_name: String,
    quality: QualityTier,
    working_dir: PathBuf,
}

type PumpTask = JoinHandle<std::io::Result<String>>;

async fn supervise(
    mut child: Child,
    stdout_task: PumpTask,
    stderr_task: PumpTask,
    mut cancel_rx: oneshot::Receiver<()>,
    job: ResolveJob,
) -> Result<RenderOutcome, RenderError> {
    let start = Instant::now();

    let status = tokio::select! {
        status = child.wait() => status
            .map_err(|e| RenderError::internal(format!("Failed to wait on renderer: {e}")))?,
        Ok(()) = &mut cancel_rx => {
            tracing::info!(scene = %job.scene_name, "Cancelling render");
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to kill renderer");
            }
            // The pipes close with the child; let the readers flush what they have.
            let _ = stdout_task.await;
            let _ = stderr_task.await;
            return Ok(RenderOutcome::Cancelled);
        }
    };

    let stdout_text = join_pump(stdout_task).await?;
    join_pump(stderr_task).await?;

    tracing::info!(
        status = %status,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Renderer exited"
    );

    if !status.success() {
        return Err(RenderError::ExternalProcessFailed {
            exit_code: status.code(),
        });
    }

    // A relative output root belongs to the renderer's working directory.
    let output_root = job.working_dir.join(&job.output_root);
    if let Some(path) = locate(&output_root, &job.scene_name, job.quality) {
        return Ok(RenderOutcome::Ready(path));
    }
    tracing::debug!("Directory search found nothing, scanning renderer output");
    Ok(match locate_in_output(&stdout_text, &job.working_dir) {
        Some(path) => RenderOutcome::Ready(path),
        None => RenderOutcome::NotFound,
    })
}

async fn join_pump(task: PumpTask) -> Result<String, RenderError> {
    task.await
        .map_err(|e| RenderError::internal(format!("output reader failed: {e}")))?
        .map_err(RenderError::from)
}

/// Copy a stream into the sink chunk by chunk, optionally keeping a copy.
async fn pump<R>(mut reader: R, sink: Arc<dyn OutputSink>, capture: bool) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut captured = String::new();
    let mut decoder = Utf8Chunker::default();
    let mut buf = vec![0u8; READ_CHUNK_BYTES];

    loop {
        let n = reader.read(&mut buf).await?;
        let text = if n == 0 {
            decoder.finish()
        } else {
            decoder.push(&buf[..n])
        };
        if !text.is_empty() {
            sink.append(&text);
            if capture {
                captured.push_str(&text);
            }
        }
        if n == 0 {
            return Ok(captured);
        }
    }
}

/// Decodes UTF-8 across chunk boundaries.
///
/// A multi-byte character split between two reads is held back until the
/// rest arrives. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());
                    match e.error_len() {
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }

    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// Look the executable up on the search path, or check it directly when it
/// contains a path separator.
fn executable_exists(executable: &str) -> bool {
    let candidate = Path::new(executable);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(executable).is_file()))
        .unwrap_or(false)
}
