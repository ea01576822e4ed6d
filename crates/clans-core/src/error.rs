//! Error types for the clans library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all clans operations.
///
/// Variants from `Connection` through `Parse` describe what the Plans server
/// told us (or failed to tell us); [`ClansError::is_plans_error`] groups the
/// ones derived from page content.
#[derive(Error, Debug)]
pub enum ClansError {
    /// The server could not be reached at all
    #[error("Check your internet connection. Plans could also be down.")]
    Connection {
        #[source]
        source: reqwest::Error,
    },
    /// The page lacks the markers of the interface this client understands
    #[error("{reason}")]
    IncompatibleServer { reason: String },
    /// Login did not land on the home page
    #[error("Failed to log in as [{username}].")]
    Authentication { username: String },
    /// An authenticated page came back without its expected content
    #[error("{message}")]
    SessionExpired { message: String },
    /// Submission rejected because the plan changed since it was fetched
    #[error("{message}")]
    Conflict { message: String },
    /// Submission rejected because the text exceeds the server's ceiling
    #[error("{message}")]
    PlanTooLong { message: String },
    /// Submission rejected for a reason we do not classify
    #[error("{message}")]
    Rejected { message: String },
    /// Submission response carried neither an info nor an alert banner
    #[error("Plans did not verify update")]
    UnverifiedUpdate,
    /// The requested plan does not exist
    #[error("{message}")]
    NotFound { message: String },
    /// A page reported a different logged-in user than the one we logged in as
    #[error("Logged in as [{expected}], but Plans now reports [{found}]")]
    IdentityChanged { expected: String, found: String },
    /// Our MD5 of the edit text disagrees with the server's
    #[error("Edit text fingerprint mismatch: server declared {declared}, computed {computed}")]
    FingerprintMismatch { declared: String, computed: String },
    /// Page content could not be interpreted
    #[error("Parse error: {message}")]
    Parse { message: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// An extension refused to continue
    #[error("{extension}: {message}")]
    Extension { extension: String, message: String },
}

impl ClansError {
    /// Creates a parse error with the given message.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a configuration error with the given message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a session-expired error with the given message.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::SessionExpired {
            message: message.into(),
        }
    }

    /// Classifies the body of an alert banner returned by a plan submission.
    pub fn from_rejection(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("edited from another instance") {
            Self::Conflict { message }
        } else if lowered.contains("too long") {
            Self::PlanTooLong { message }
        } else {
            Self::Rejected { message }
        }
    }

    /// Whether this error was derived from the content of a Plans page,
    /// as opposed to the network or the local machine.
    pub fn is_plans_error(&self) -> bool {
        matches!(
            self,
            Self::IncompatibleServer { .. }
                | Self::Authentication { .. }
                | Self::SessionExpired { .. }
                | Self::Conflict { .. }
                | Self::PlanTooLong { .. }
                | Self::Rejected { .. }
                | Self::UnverifiedUpdate
                | Self::NotFound { .. }
                | Self::IdentityChanged { .. }
                | Self::FingerprintMismatch { .. }
                | Self::Parse { .. }
        )
    }
}

/// Extension trait attaching a path to I/O failures.
pub trait IoResultExt<T> {
    /// Map an I/O error to [`ClansError::FileSystem`] for `path`.
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn at_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| ClansError::FileSystem {
            path: path.into(),
            source,
        })
    }
}

/// Result type alias for clans operations
pub type Result<T> = std::result::Result<T, ClansError>;
