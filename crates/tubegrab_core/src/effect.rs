use crate::{DownloadKind, JobId, RequestToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchMediaInfo { token: RequestToken, url: String },
    StartDownload {
        token: RequestToken,
        request: DownloadRequest,
    },
    /// Begin polling a job. Replaces any poll already running.
    StartPolling { job_id: JobId },
    /// Stop the active poll, if any. Idempotent.
    CancelPolling,
    RecordCompletion(CompletedDownload),
}

/// Body of a download-start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
    pub kind: DownloadKind,
    pub playlist: bool,
}

/// A finished job, handed to the history store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedDownload {
    pub url: String,
    pub title: Option<String>,
    pub format_id: String,
    pub kind: DownloadKind,
    pub playlist: bool,
    pub download_url: Option<String>,
    pub file_name: Option<String>,
}
