use std::fmt;

use serde::Deserialize;

/// Token echoed back with the result of a one-shot request.
pub type RequestToken = u64;

/// Body of `POST /video_info` on success.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaInfoPayload {
    #[serde(default)]
    pub is_playlist: bool,
    #[serde(default)]
    pub title: Option<String>,
    /// Seconds; the service may send fractional values.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub playlist_count: Option<u64>,
    #[serde(default)]
    pub entries: Vec<PlaylistItem>,
    #[serde(default)]
    pub formats: Vec<FormatEntry>,
    #[serde(default)]
    pub audio_formats: Vec<FormatEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormatEntry {
    pub format_id: String,
    #[serde(default)]
    pub format_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Starting,
    Downloading,
    Processing,
    Complete,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Complete | JobState::Error)
    }
}

/// Body of `GET /download_status/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobStatusReport {
    pub status: JobState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Form fields of `POST /download`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadParams {
    pub url: String,
    pub format_id: String,
    pub audio: bool,
    pub playlist: bool,
}

impl DownloadParams {
    pub(crate) fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("url", self.url.as_str()),
            ("format", self.format_id.as_str()),
            ("type", if self.audio { "audio" } else { "video" }),
            ("playlist", if self.playlist { "true" } else { "false" }),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    MediaInfo {
        token: RequestToken,
        result: Result<MediaInfoPayload, ServiceError>,
    },
    DownloadStarted {
        token: RequestToken,
        result: Result<String, ServiceError>,
    },
    Status {
        job_id: String,
        result: Result<JobStatusReport, ServiceError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub kind: FailureKind,
    /// Server-supplied `error` text, or transport detail.
    pub message: Option<String>,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    pub(crate) fn status(code: u16, message: Option<String>) -> Self {
        Self {
            kind: FailureKind::HttpStatus(code),
            message,
        }
    }

    /// True when the service answered; false for transport-level failures.
    pub fn is_http_status(&self) -> bool {
        matches!(self.kind, FailureKind::HttpStatus(_))
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ServiceError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    MissingDownloadId,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::MissingDownloadId => write!(f, "missing download id"),
        }
    }
}
