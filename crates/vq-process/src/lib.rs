//! External program invocation and indexed score-log parsing.
//!
//! Programs are spawned with a structured argument list (never through a
//! shell), their stdout is appended to a log file, and the log is then read
//! back as `"<atom>: <index> <value>"` lines.

mod error;
mod invocation;
mod score_log;

pub use error::{ProcessError, ProcessResult};
pub use invocation::{InvocationOptions, ProgramInvocation, remove_if_exists, run_to_log};
pub use score_log::{parse_atom_scores, parse_atoms, read_score_log};
