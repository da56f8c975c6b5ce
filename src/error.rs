use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a run before any output is written.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("not authenticated: no session state at {0} (run 'auth' first)")]
    NotAuthenticated(PathBuf),

    #[error("input file not found: {0}")]
    InputMissing(PathBuf),

    #[error("browser error: {0}")]
    Browser(String),
}
