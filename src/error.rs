use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UpdateError>;

/// Why a project update run stopped.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("could not load project {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("could not save project {}: {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    #[error("host initialization failed: {0}")]
    Host(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl UpdateError {
    /// The underlying cause, without the path.
    pub fn reason(&self) -> &str {
        match self {
            UpdateError::Load { reason, .. } | UpdateError::Save { reason, .. } => reason,
            UpdateError::Host(reason) | UpdateError::Config(reason) => reason,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            UpdateError::Load { .. } => 1,
            UpdateError::Host(_) | UpdateError::Config(_) => 2,
            UpdateError::Save { .. } => 3,
        }
    }
}
