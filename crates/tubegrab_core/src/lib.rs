//! Tubegrab core: pure download-session state machine and view-model helpers.
mod effect;
mod error;
mod media;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{CompletedDownload, DownloadRequest, Effect};
pub use error::{FailureKind, ServiceFailure, SessionError};
pub use media::{
    percent_from_raw, DownloadKind, DownloadLink, FormatOption, JobId, JobStatus, MediaDetails,
    MediaInfo, PlaylistEntry, RequestToken,
};
pub use msg::Msg;
pub use state::AppState;
pub use update::update;
pub use view_model::{
    format_duration, format_views, AppViewModel, FormatRowView, MediaSummaryView, ProgressView,
};
