//! Error types for Makes
//!
//! All modules use `MakesResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Makes operations
pub type MakesResult<T> = Result<T, MakesError>;

/// All errors that can occur in Makes
#[derive(Error, Debug)]
pub enum MakesError {
    // Source errors
    #[error("Unable to parse [SOURCE]: {0}")]
    UnrecognizedReference(String),

    #[error("Unable to {stage}: {source_ref}")]
    CloneFailed {
        stage: String,
        source_ref: String,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },

    // Build engine errors
    #[error("{message}")]
    IntrospectionFailed {
        message: String,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },

    #[error("Malformed manifest from {source_ref}: {reason}")]
    ManifestInvalid { source_ref: String, reason: String },

    // Configuration errors
    #[error("Required environment variable not set: {0}")]
    ConfigMissing(&'static str),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl MakesError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a version control error carrying the child's captured output
    pub fn clone_failed(
        stage: impl Into<String>,
        source_ref: impl Into<String>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    ) -> Self {
        Self::CloneFailed {
            stage: stage.into(),
            source_ref: source_ref.into(),
            stdout,
            stderr,
        }
    }

    /// Captured (stdout, stderr) of the failing child process, if any
    pub fn captured(&self) -> Option<(&[u8], &[u8])> {
        match self {
            Self::CloneFailed { stdout, stderr, .. }
            | Self::IntrospectionFailed { stdout, stderr, .. } => Some((stdout, stderr)),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnrecognizedReference(_) => {
                Some("Use '.', github:owner/repo@rev or gitlab:owner/repo@rev")
            }
            Self::ConfigMissing("__MAKES_SRC__") => {
                Some("Stable mode needs the Makes source tree; set __MAKES_SRC__ or NIX_UNSTABLE=1")
            }
            _ => None,
        }
    }
}
