//! External frame decoder.
//!
//! The decoder binary is an opaque process: it gets a URL and a throwaway
//! output path, and only its exit status and the size of that file matter.
//! Each run owns its child process. The child is spawned with kill-on-drop,
//! awaited under a timeout, and killed and reaped when the timeout fires.
//! The scratch file is removed by [`ScratchFile`] on every path out.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use camsweep_common::error::{ScanError, VerificationFailure};

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const STDERR_TAIL_LEN: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCapture {
    pub bytes: u64,
}

#[async_trait]
pub trait FrameDecoder: Send + Sync + 'static {
    /// Fails with [`ScanError::DecoderUnavailable`] when the binary cannot run.
    async fn ensure_available(&self) -> Result<(), ScanError>;

    /// Pulls exactly one frame out of `url` within `limit`.
    async fn capture_frame(&self, url: &str, limit: Duration) -> Result<FrameCapture, VerificationFailure>;
}

/// A frame destination that deletes itself when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(dir: &Path) -> Self {
        let name = format!("camsweep-{:016x}.png", rand::random::<u64>());
        Self { path: dir.join(name) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    program: PathBuf,
    leading_args: Vec<OsString>,
    scratch_dir: PathBuf,
}

impl FfmpegDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            scratch_dir: std::env::temp_dir(),
        }
    }

    /// Arguments placed before the decoder flags, for wrappers like `nice`.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn grab_command(&self, url: &str, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(["-y", "-loglevel", "error", "-rtsp_transport", "tcp", "-i"])
            .arg(url)
            .args(["-frames:v", "1"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl FrameDecoder for FfmpegDecoder {
    async fn ensure_available(&self) -> Result<(), ScanError> {
        let unavailable = |source| ScanError::DecoderUnavailable {
            program: self.program.display().to_string(),
            source,
        };

        let mut child = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(unavailable)?;

        match timeout(VERSION_CHECK_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("{} -version exited with {status}", self.program.display());
                Ok(())
            }
            Ok(Err(e)) => Err(unavailable(e)),
            Err(_elapsed) => {
                warn!("{} did not answer -version, continuing anyway", self.program.display());
                let _ = child.kill().await;
                Ok(())
            }
        }
    }

    async fn capture_frame(&self, url: &str, limit: Duration) -> Result<FrameCapture, VerificationFailure> {
        let scratch = ScratchFile::new(&self.scratch_dir);

        let mut child = self
            .grab_command(url, scratch.path())
            .spawn()
            .map_err(VerificationFailure::Spawn)?;
        let stderr = child.stderr.take();

        let finished = timeout(limit, async {
            let (status, stderr) = tokio::join!(child.wait(), read_stderr_tail(stderr));
            status.map(|status| (status, stderr))
        })
        .await;

        let (status, stderr) = match finished {
            Ok(result) => result?,
            Err(_elapsed) => {
                warn!("decoder timed out after {limit:?} on {url}, killing it");
                // kill() also waits, so the child is reaped before we return.
                let _ = child.kill().await;
                return Err(VerificationFailure::Timeout(limit));
            }
        };

        if !status.success() {
            return Err(VerificationFailure::Exit {
                code: status.code(),
                stderr,
            });
        }

        let bytes = match tokio::fs::metadata(scratch.path()).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        if bytes == 0 {
            return Err(VerificationFailure::EmptyOutput);
        }

        Ok(FrameCapture { bytes })
    }
}

/// Last meaningful line the decoder wrote to stderr, truncated.
async fn read_stderr_tail(stderr: Option<ChildStderr>) -> String {
    let Some(mut stderr) = stderr else {
        return String::new();
    };

    let mut raw = Vec::new();
    if stderr.read_to_end(&mut raw).await.is_err() {
        return String::new();
    }

    let text = String::from_utf8_lossy(&raw);
    let line = text.lines().rev().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
    line.chars().take(STDERR_TAIL_LEN).collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
