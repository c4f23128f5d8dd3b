use thiserror::Error;

/// Fallback shown when a metadata request fails without a server message.
pub(crate) const INFO_FALLBACK: &str = "Error fetching media information";
/// Fallback shown when a download-start request fails without a server message.
pub(crate) const START_FALLBACK: &str = "Error starting download";
/// Fallback for an `error` job status without a message.
pub(crate) const JOB_FALLBACK: &str = "Unknown error";

/// How a call to the download service went wrong, as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service answered with a non-success status.
    Request { status: u16 },
    /// The service could not be reached or the response was unreadable.
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    pub kind: FailureKind,
    /// Message supplied by the server (or transport layer), if any.
    pub message: Option<String>,
}

impl ServiceFailure {
    pub fn request(status: u16, message: Option<String>) -> Self {
        Self {
            kind: FailureKind::Request { status },
            message,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: Some(message.into()),
        }
    }

    pub(crate) fn into_session_error(self, fallback: &str) -> SessionError {
        let message = self
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        match self.kind {
            FailureKind::Request { status } => SessionError::Request { status, message },
            FailureKind::Transport => SessionError::Transport(message),
        }
    }
}

/// User-facing error. Every variant is dismissible and leaves the session usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please enter a URL")]
    EmptyUrl,
    #[error("Please select a format to download")]
    NoFormatSelected,
    #[error("{message}")]
    Request { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("Download failed: {0}")]
    JobFailed(String),
}

impl SessionError {
    /// Validation errors are raised locally and never reach the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::EmptyUrl | SessionError::NoFormatSelected)
    }
}
