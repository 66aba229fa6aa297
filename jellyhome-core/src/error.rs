use std::fmt;

/// Result type for calls across the [`RemoteClient`](crate::RemoteClient) boundary
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result type for cancellable orchestration steps
pub type HomeResult<T> = Result<T, HomeError>;

/// Failures reported by the media-server API boundary
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unauthorized - please sign in again")]
    Unauthorized,

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    /// Human-readable description suitable for an error screen.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Unauthorized)
            || matches!(self, RemoteError::Status { status: 401, .. })
    }
}

/// Outcome of an orchestration step that may have been superseded.
///
/// `Cancelled` is not a failure: callers swallow it without touching state.
#[derive(Debug, thiserror::Error)]
pub enum HomeError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl HomeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HomeError::Cancelled)
    }
}

/// Cloneable error value stored in published snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorCause {
    message: String,
    unauthorized: bool,
}

impl ErrorCause {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            unauthorized: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when signing in again is the only way forward.
    pub fn is_unauthorized(&self) -> bool {
        self.unauthorized
    }
}

impl From<&RemoteError> for ErrorCause {
    fn from(err: &RemoteError) -> Self {
        Self {
            message: err.message(),
            unauthorized: err.is_unauthorized(),
        }
    }
}

impl From<RemoteError> for ErrorCause {
    fn from(err: RemoteError) -> Self {
        ErrorCause::from(&err)
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
