//! Tubegrab engine: job-service client, status poller and effect execution.
mod engine;
mod poller;
mod service;
mod types;

pub use engine::{EngineError, EngineHandle};
pub use poller::{poll_job, ChannelEventSink, EventSink, PollEnd};
pub use service::{JobService, ReqwestJobService, ServiceSettings};
pub use types::{
    DownloadParams, EngineEvent, FailureKind, FormatEntry, JobState, JobStatusReport,
    MediaInfoPayload, PlaylistItem, RequestToken, ServiceError,
};
