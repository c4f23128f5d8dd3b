use crate::{DownloadKind, JobId, JobStatus, MediaInfo, RequestToken, ServiceFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input.
    UrlInputChanged(String),
    /// User asked for metadata of the current URL input.
    InfoRequested,
    /// Metadata request finished.
    MediaInfoLoaded {
        token: RequestToken,
        info: MediaInfo,
    },
    MediaInfoFailed {
        token: RequestToken,
        failure: ServiceFailure,
    },
    /// User picked a format from the displayed lists.
    FormatSelected(String),
    /// User switched between the video and audio tabs.
    DownloadKindChanged(DownloadKind),
    /// User clicked Download.
    DownloadRequested,
    /// Service accepted the download-start request.
    DownloadAccepted { token: RequestToken, job_id: JobId },
    DownloadRejected {
        token: RequestToken,
        failure: ServiceFailure,
    },
    /// One poll of the job status endpoint succeeded.
    StatusReported { job_id: JobId, status: JobStatus },
    /// One poll of the job status endpoint failed.
    StatusPollFailed {
        job_id: JobId,
        failure: ServiceFailure,
    },
    /// User dismissed the error message.
    ErrorDismissed,
    ResetRequested,
    /// Fallback for placeholder wiring.
    NoOp,
}
