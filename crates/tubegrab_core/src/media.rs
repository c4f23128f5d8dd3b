/// Opaque job identifier handed out by the download service.
pub type JobId = String;

/// Monotonic token attached to one-shot requests so late responses can be discarded.
pub type RequestToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadKind {
    #[default]
    Video,
    Audio,
}

impl DownloadKind {
    /// Wire value for the `type` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadKind::Video => "video",
            DownloadKind::Audio => "audio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOption {
    pub format_id: String,
    pub label: String,
}

impl FormatOption {
    /// Builds an option, falling back to the id when the service sent no label.
    pub fn new(format_id: impl Into<String>, label: Option<String>) -> Self {
        let format_id = format_id.into();
        let label = label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| format_id.clone());
        Self { format_id, label }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub title: Option<String>,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaDetails {
    Single {
        duration_seconds: Option<u64>,
        uploader: Option<String>,
        view_count: Option<u64>,
        thumbnail_url: Option<String>,
    },
    Playlist {
        item_count: usize,
        entries: Vec<PlaylistEntry>,
    },
}

/// Immutable metadata snapshot for a single video or a playlist.
///
/// Playlist formats apply uniformly to every entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub details: MediaDetails,
    pub formats: Vec<FormatOption>,
    pub audio_formats: Vec<FormatOption>,
}

impl MediaInfo {
    pub fn is_playlist(&self) -> bool {
        matches!(self.details, MediaDetails::Playlist { .. })
    }

    pub fn contains_format(&self, format_id: &str) -> bool {
        self.formats
            .iter()
            .chain(self.audio_formats.iter())
            .any(|format| format.format_id == format_id)
    }
}

/// Status label reported by the service for one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Starting,
    Downloading { percent: u8 },
    Processing,
    Complete {
        download_url: Option<String>,
        filename: Option<String>,
    },
    Failed { message: Option<String> },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete { .. } | JobStatus::Failed { .. })
    }
}

/// Rounds a raw progress value to a whole percentage in `0..=100`.
pub fn percent_from_raw(raw: Option<f64>) -> u8 {
    match raw {
        Some(value) if value.is_finite() => value.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub file_name: String,
}

impl DownloadLink {
    pub(crate) fn new(url: String, filename: Option<&str>) -> Self {
        let file_name = filename
            .and_then(|name| name.rsplit(['/', '\\']).next())
            .filter(|name| !name.is_empty())
            .unwrap_or("download")
            .to_string();
        Self { url, file_name }
    }
}
