use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;
use vq_types::{Asset, CancellationToken};

use crate::error::{ProcessError, ProcessResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_CANCEL_POLL: Duration = Duration::from_millis(50);
const STDERR_TAIL_BYTES: usize = 2048;

/// Program path plus an explicit argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInvocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProgramInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Appends `<yuv_type> <ref_path> <dis_path> <width> <height>`.
    pub fn asset_args(self, asset: &Asset) -> Self {
        self.arg(asset.yuv_type().as_str())
            .arg(asset.ref_path())
            .arg(asset.dis_path())
            .arg(asset.width().to_string())
            .arg(asset.height().to_string())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for ProgramInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InvocationOptions {
    pub timeout: Duration,
    pub cancel_poll_interval: Duration,
}

impl Default for InvocationOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cancel_poll_interval: DEFAULT_CANCEL_POLL,
        }
    }
}

impl InvocationOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Runs `invocation` to completion with its stdout appended to `log_path`.
///
/// The child is killed when the timeout elapses or `cancel` fires. A non-zero
/// exit status is reported with the tail of the program's stderr.
pub async fn run_to_log(
    invocation: &ProgramInvocation,
    log_path: &Path,
    options: &InvocationOptions,
    cancel: &CancellationToken,
) -> ProcessResult<()> {
    let program = invocation.program().to_path_buf();
    if cancel.is_cancelled() {
        return Err(ProcessError::Cancelled { program });
    }

    if let Some(parent) = log_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ProcessError::io(parent, source))?;
    }
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|source| ProcessError::io(log_path, source))?;

    debug!(command = %invocation, log = %log_path.display(), "invoking external program");

    let child = Command::new(invocation.program())
        .args(invocation.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

    let wait = tokio::time::timeout(options.timeout, child.wait_with_output());
    let output = tokio::select! {
        outcome = wait => match outcome {
            Ok(result) => result.map_err(|source| ProcessError::io(log_path, source))?,
            Err(_) => {
                return Err(ProcessError::TimedOut {
                    program,
                    timeout: options.timeout,
                });
            }
        },
        _ = wait_cancelled(cancel, options.cancel_poll_interval) => {
            return Err(ProcessError::Cancelled { program });
        }
    };

    if !output.status.success() {
        return Err(ProcessError::Failed {
            program,
            status: output.status,
            stderr: stderr_tail(&output.stderr),
        });
    }
    Ok(())
}

/// Deletes `path`; a file that is already gone is not an error.
pub async fn remove_if_exists(path: &Path) -> ProcessResult<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ProcessError::io(path, source)),
    }
}

async fn wait_cancelled(token: &CancellationToken, poll: Duration) {
    loop {
        if token.is_cancelled() {
            return;
        }
        tokio::time::sleep(poll).await;
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
