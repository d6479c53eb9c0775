use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

pub type ProcessResult<T> = Result<T, ProcessError>;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("{} exited with {status}: {stderr}", .program.display())]
    Failed {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{} did not finish within {timeout:?}", .program.display())]
    TimedOut { program: PathBuf, timeout: Duration },

    #[error("invocation of {} was cancelled", .program.display())]
    Cancelled { program: PathBuf },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{atom}' line {line_number} is malformed: '{line}'")]
    MalformedLine {
        atom: String,
        line_number: usize,
        line: String,
    },

    #[error("'{atom}' line {line_number}: expected frame index {expected}, found {found}")]
    IndexOutOfOrder {
        atom: String,
        line_number: usize,
        expected: u64,
        found: u64,
    },

    #[error("no '{atom}' scores found in log")]
    NoScores { atom: String },

    #[error("'{atom}' has {actual} frames, expected {expected}")]
    FrameCountMismatch {
        atom: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid score pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ProcessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
