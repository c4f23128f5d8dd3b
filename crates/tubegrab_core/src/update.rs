use tubegrab_logging::{tg_debug, tg_info, tg_warn};

use crate::error::{INFO_FALLBACK, START_FALLBACK};
use crate::{AppState, Effect, Msg, SessionError};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::UrlInputChanged(text) => {
            if state.url_input != text {
                state.url_input = text;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::InfoRequested => {
            let url = state.url_input.trim().to_string();
            if url.is_empty() {
                state.set_error(SessionError::EmptyUrl);
                return (state, Vec::new());
            }
            let mut effects = Vec::with_capacity(2);
            if state.reset() {
                effects.push(Effect::CancelPolling);
            }
            let token = state.begin_info_request(url.clone());
            tg_info!("fetching media info token={} url={}", token, url);
            effects.push(Effect::FetchMediaInfo { token, url });
            effects
        }
        Msg::MediaInfoLoaded { token, info } => {
            if state.is_pending_info(token) {
                tg_debug!(
                    "media info token={} playlist={} formats={} audio_formats={}",
                    token,
                    info.is_playlist(),
                    info.formats.len(),
                    info.audio_formats.len()
                );
                state.apply_media_info(info);
            } else {
                tg_debug!("discarding stale media info token={}", token);
            }
            Vec::new()
        }
        Msg::MediaInfoFailed { token, failure } => {
            if state.is_pending_info(token) {
                state.fail_info_request(failure.into_session_error(INFO_FALLBACK));
            } else {
                tg_debug!("discarding stale media info failure token={}", token);
            }
            Vec::new()
        }
        Msg::FormatSelected(format_id) => {
            if !state.select_format(format_id.clone()) {
                tg_warn!("ignoring selection of unknown format {}", format_id);
            }
            Vec::new()
        }
        Msg::DownloadKindChanged(kind) => {
            state.set_download_kind(kind);
            Vec::new()
        }
        Msg::DownloadRequested => {
            let Some(request) = state.download_request() else {
                state.set_error(SessionError::NoFormatSelected);
                return (state, Vec::new());
            };
            let (token, previous) = state.begin_download(request.clone());
            let mut effects = Vec::with_capacity(2);
            if let Some(previous) = previous {
                tg_info!("new download replaces poll for job {}", previous);
                effects.push(Effect::CancelPolling);
            }
            tg_info!(
                "starting download token={} format={} kind={} playlist={}",
                token,
                request.format_id,
                request.kind.as_str(),
                request.playlist
            );
            effects.push(Effect::StartDownload { token, request });
            effects
        }
        Msg::DownloadAccepted { token, job_id } => {
            if state.is_pending_start(token) {
                tg_info!("download accepted job={}", job_id);
                state.accept_download(job_id.clone());
                vec![Effect::StartPolling { job_id }]
            } else {
                tg_debug!("discarding stale download acceptance job={}", job_id);
                Vec::new()
            }
        }
        Msg::DownloadRejected { token, failure } => {
            if state.is_pending_start(token) {
                state.reject_download(failure.into_session_error(START_FALLBACK));
            } else {
                tg_debug!("discarding stale download rejection token={}", token);
            }
            Vec::new()
        }
        Msg::StatusReported { job_id, status } => {
            if !state.is_active_job(&job_id) {
                tg_debug!("discarding status for inactive job {}", job_id);
                return (state, Vec::new());
            }
            let terminal = status.is_terminal();
            let completed = state.apply_status(status);
            let mut effects = Vec::new();
            if terminal {
                tg_info!("job {} reached a terminal status", job_id);
                effects.push(Effect::CancelPolling);
            }
            if let Some(record) = completed {
                effects.push(Effect::RecordCompletion(record));
            }
            effects
        }
        Msg::StatusPollFailed { job_id, failure } => {
            if !state.is_active_job(&job_id) {
                return (state, Vec::new());
            }
            tg_warn!(
                "status poll for job {} failed: {:?} {}",
                job_id,
                failure.kind,
                failure.message.as_deref().unwrap_or("")
            );
            if state.record_poll_failure() {
                vec![Effect::CancelPolling]
            } else {
                Vec::new()
            }
        }
        Msg::ErrorDismissed => {
            state.dismiss_error();
            Vec::new()
        }
        Msg::ResetRequested => {
            if state.reset() {
                vec![Effect::CancelPolling]
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
