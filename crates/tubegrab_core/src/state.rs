use tubegrab_logging::{tg_debug, tg_info};

use crate::view_model::AppViewModel;
use crate::{
    CompletedDownload, DownloadKind, DownloadLink, DownloadRequest, JobId, JobStatus, MediaInfo,
    RequestToken, SessionError,
};

/// Message used when consecutive poll failures hit the configured limit.
pub(crate) const LOST_CONTACT: &str = "Lost contact with the download service";

/// In-memory state of one download session.
///
/// Only [`crate::update`] mutates it. All session fields are reset together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) url_input: String,
    pub(crate) source_url: Option<String>,
    pub(crate) media_info: Option<MediaInfo>,
    pub(crate) selected_format: Option<String>,
    pub(crate) download_kind: DownloadKind,
    pub(crate) loading: bool,
    pub(crate) is_downloading: bool,
    pub(crate) active_job: Option<JobId>,
    pub(crate) last_status: Option<JobStatus>,
    pub(crate) download_link: Option<DownloadLink>,
    pub(crate) error: Option<SessionError>,
    in_flight: Option<DownloadRequest>,
    pending_info: Option<RequestToken>,
    pending_start: Option<RequestToken>,
    poll_failures: u32,
    // Survive reset:
    last_token: RequestToken,
    poll_failure_limit: Option<u32>,
    pub(crate) dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that gives up polling after `limit` consecutive transport failures.
    ///
    /// `None` polls until a terminal status arrives.
    pub fn with_poll_failure_limit(limit: Option<u32>) -> Self {
        Self {
            poll_failure_limit: limit.filter(|limit| *limit > 0),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::from_state(self)
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_downloading(&self) -> bool {
        self.is_downloading
    }

    pub fn active_job(&self) -> Option<&str> {
        self.active_job.as_deref()
    }

    pub fn media_info(&self) -> Option<&MediaInfo> {
        self.media_info.as_ref()
    }

    pub fn selected_format(&self) -> Option<&str> {
        self.selected_format.as_deref()
    }

    pub fn download_kind(&self) -> DownloadKind {
        self.download_kind
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_error(&mut self, error: SessionError) {
        tg_info!("session error: {}", error);
        self.error = Some(error);
        self.mark_dirty();
    }

    fn next_token(&mut self) -> RequestToken {
        self.last_token += 1;
        self.last_token
    }

    /// Clears every session field. Returns whether a poll was active.
    pub(crate) fn reset(&mut self) -> bool {
        let was_polling = self.active_job.is_some();
        let url_input = std::mem::take(&mut self.url_input);
        let last_token = self.last_token;
        let poll_failure_limit = self.poll_failure_limit;
        let dirty = self.dirty;

        *self = Self {
            url_input,
            last_token,
            poll_failure_limit,
            dirty,
            ..Self::default()
        };
        if was_polling {
            tg_debug!("reset cancelled active poll");
        }
        self.mark_dirty();
        was_polling
    }

    pub(crate) fn begin_info_request(&mut self, url: String) -> RequestToken {
        let token = self.next_token();
        self.source_url = Some(url);
        self.loading = true;
        self.pending_info = Some(token);
        self.mark_dirty();
        token
    }

    pub(crate) fn is_pending_info(&self, token: RequestToken) -> bool {
        self.pending_info == Some(token)
    }

    pub(crate) fn apply_media_info(&mut self, info: MediaInfo) {
        self.pending_info = None;
        self.loading = false;
        self.selected_format = info.formats.first().map(|f| f.format_id.clone());
        self.media_info = Some(info);
        self.mark_dirty();
    }

    pub(crate) fn fail_info_request(&mut self, error: SessionError) {
        self.pending_info = None;
        self.loading = false;
        self.set_error(error);
    }

    pub(crate) fn select_format(&mut self, format_id: String) -> bool {
        let known = self
            .media_info
            .as_ref()
            .is_some_and(|info| info.contains_format(&format_id));
        if known {
            self.selected_format = Some(format_id);
            self.mark_dirty();
        }
        known
    }

    pub(crate) fn set_download_kind(&mut self, kind: DownloadKind) {
        if self.download_kind != kind {
            self.download_kind = kind;
            self.mark_dirty();
        }
    }

    /// Builds the download-start request if the session has a selection.
    pub(crate) fn download_request(&self) -> Option<DownloadRequest> {
        let info = self.media_info.as_ref()?;
        let format_id = self.selected_format.clone()?;
        Some(DownloadRequest {
            url: self.source_url.clone().unwrap_or_default(),
            format_id,
            kind: self.download_kind,
            playlist: info.is_playlist(),
        })
    }

    /// Marks a download as started. Returns the job whose poll must be cancelled.
    pub(crate) fn begin_download(
        &mut self,
        request: DownloadRequest,
    ) -> (RequestToken, Option<JobId>) {
        let token = self.next_token();
        let previous = self.active_job.take();
        self.in_flight = Some(request);
        self.pending_start = Some(token);
        self.is_downloading = true;
        self.poll_failures = 0;
        self.last_status = Some(JobStatus::Starting);
        self.download_link = None;
        self.error = None;
        self.mark_dirty();
        (token, previous)
    }

    pub(crate) fn is_pending_start(&self, token: RequestToken) -> bool {
        self.pending_start == Some(token)
    }

    pub(crate) fn accept_download(&mut self, job_id: JobId) {
        self.pending_start = None;
        self.active_job = Some(job_id);
        self.mark_dirty();
    }

    pub(crate) fn reject_download(&mut self, error: SessionError) {
        self.pending_start = None;
        self.in_flight = None;
        self.is_downloading = false;
        self.last_status = None;
        self.set_error(error);
    }

    pub(crate) fn is_active_job(&self, job_id: &str) -> bool {
        self.active_job.as_deref() == Some(job_id)
    }

    /// Applies a reported status. Returns the completion record when the job
    /// finished successfully.
    pub(crate) fn apply_status(&mut self, status: JobStatus) -> Option<CompletedDownload> {
        self.poll_failures = 0;
        self.mark_dirty();
        let completed = match &status {
            JobStatus::Complete {
                download_url,
                filename,
            } => {
                self.download_link = download_url
                    .clone()
                    .map(|url| DownloadLink::new(url, filename.as_deref()));
                self.completion_record(download_url.clone())
            }
            JobStatus::Failed { message } => {
                let message = message
                    .clone()
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| crate::error::JOB_FALLBACK.to_string());
                self.error = Some(SessionError::JobFailed(message));
                None
            }
            _ => None,
        };
        if status.is_terminal() {
            self.finish_job();
        }
        self.last_status = Some(status);
        completed
    }

    /// Counts a failed poll. Returns true when the failure limit ends the job.
    pub(crate) fn record_poll_failure(&mut self) -> bool {
        self.poll_failures = self.poll_failures.saturating_add(1);
        match self.poll_failure_limit {
            Some(limit) if self.poll_failures >= limit => {
                self.last_status = Some(JobStatus::Failed {
                    message: Some(LOST_CONTACT.to_string()),
                });
                self.finish_job();
                self.set_error(SessionError::JobFailed(LOST_CONTACT.to_string()));
                true
            }
            _ => false,
        }
    }

    pub(crate) fn dismiss_error(&mut self) {
        if self.error.take().is_some() {
            self.mark_dirty();
        }
    }

    fn finish_job(&mut self) {
        self.active_job = None;
        self.in_flight = None;
        self.is_downloading = false;
        self.poll_failures = 0;
    }

    fn completion_record(&self, download_url: Option<String>) -> Option<CompletedDownload> {
        let request = self.in_flight.as_ref()?;
        Some(CompletedDownload {
            url: request.url.clone(),
            title: self.media_info.as_ref().and_then(|info| info.title.clone()),
            format_id: request.format_id.clone(),
            kind: request.kind,
            playlist: request.playlist,
            download_url,
            file_name: self
                .download_link
                .as_ref()
                .map(|link| link.file_name.clone()),
        })
    }
}
