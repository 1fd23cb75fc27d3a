//! Error types for crowdtest-core

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Prefix shared by every error-marked response text
pub const ERROR_MARKER_PREFIX: &str = "[Error: ";

/// Failure category carried by error-marked task results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The manifest file does not exist or cannot be opened
    ManifestNotFound,
    /// The manifest exists but is not a valid task mapping
    ManifestMalformed,
    /// None of a task's candidate persona locations could be read
    ContentMissing,
    /// Network, authentication or remote-side failure of the response service
    CallFailed,
    /// The response service answered with an unexpected shape
    CallMalformed,
    /// Anything the task executor did not anticipate (panics, shutdown)
    UnexpectedFailure,
}

impl ErrorKind {
    /// Identifier used in error markers and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ManifestNotFound => "ManifestNotFound",
            ErrorKind::ManifestMalformed => "ManifestMalformed",
            ErrorKind::ContentMissing => "ContentMissing",
            ErrorKind::CallFailed => "CallFailed",
            ErrorKind::CallMalformed => "CallMalformed",
            ErrorKind::UnexpectedFailure => "UnexpectedFailure",
        }
    }

    /// Response text stored in a result that failed with this kind
    pub fn marker(&self) -> String {
        format!("{ERROR_MARKER_PREFIX}{}]", self.as_str())
    }

    /// Whether this kind aborts a whole batch rather than a single task
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::ManifestNotFound | ErrorKind::ManifestMalformed
        )
    }

    /// Parse the kind back out of an error-marked response text
    pub fn from_marker(text: &str) -> Option<Self> {
        text.strip_prefix(ERROR_MARKER_PREFIX)?
            .strip_suffix(']')?
            .parse()
            .ok()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ManifestNotFound" => Ok(ErrorKind::ManifestNotFound),
            "ManifestMalformed" => Ok(ErrorKind::ManifestMalformed),
            "ContentMissing" => Ok(ErrorKind::ContentMissing),
            "CallFailed" => Ok(ErrorKind::CallFailed),
            "CallMalformed" => Ok(ErrorKind::CallMalformed),
            "UnexpectedFailure" => Ok(ErrorKind::UnexpectedFailure),
            _ => Err(format!("Unknown error kind: {s}")),
        }
    }
}

/// Core error type
#[derive(Error, Debug)]
pub enum PanelError {
    /// Manifest could not be opened
    #[error("manifest not found at {path}: {source}")]
    ManifestNotFound {
        /// Path that was tried
        path: PathBuf,
        /// Underlying IO failure
        source: std::io::Error,
    },

    /// Manifest could not be parsed into task descriptors
    #[error("manifest at {path} is malformed: {message}")]
    ManifestMalformed {
        /// Path of the manifest
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// A required builder field was not supplied
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Configuration validation failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Prompt template could not be loaded or is unusable
    #[error("template error: {0}")]
    Template(String),

    /// The concurrency gate was closed by a shutdown request
    #[error("concurrency gate closed")]
    GateClosed,
}

impl PanelError {
    /// Failure category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PanelError::ManifestNotFound { .. } => ErrorKind::ManifestNotFound,
            PanelError::ManifestMalformed { .. } => ErrorKind::ManifestMalformed,
            PanelError::MissingConfig(_)
            | PanelError::Config(_)
            | PanelError::Template(_)
            | PanelError::GateClosed => ErrorKind::UnexpectedFailure,
        }
    }
}

/// Result type alias
pub type PanelResult<T> = std::result::Result<T, PanelError>;
