use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tubegrab_core::{
    percent_from_raw, DownloadKind, Effect, FailureKind, FormatOption, JobStatus, MediaDetails,
    MediaInfo, Msg, PlaylistEntry, ServiceFailure,
};
use tubegrab_engine::{
    DownloadParams, EngineEvent, EngineHandle, FailureKind as EngineFailure, FormatEntry,
    JobState, JobStatusReport, MediaInfoPayload, ServiceError,
};
use tubegrab_logging::{tg_debug, tg_error, tg_info, tg_warn};
use url::Url;

use super::app::AppEvent;
use super::history::{HistoryEntry, HistoryStore, HistoryWriter};

const EVENT_WAIT: Duration = Duration::from_millis(50);

/// Carries core effects out to the engine and the history store, and turns
/// engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    history: HistoryStore,
    writer: HistoryWriter,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        history: HistoryStore,
        service_url: &str,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let writer = HistoryWriter::spawn(history.clone());
        let runner = Self {
            engine,
            history,
            writer,
        };
        runner.spawn_event_loop(Url::parse(service_url).ok(), event_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchMediaInfo { token, url } => {
                    tg_info!("FetchMediaInfo token={} url={}", token, url);
                    self.engine.fetch_media_info(token, url);
                }
                Effect::StartDownload { token, request } => {
                    tg_info!(
                        "StartDownload token={} format={} kind={} playlist={}",
                        token,
                        request.format_id,
                        request.kind.as_str(),
                        request.playlist
                    );
                    self.engine.start_download(
                        token,
                        DownloadParams {
                            url: request.url,
                            format_id: request.format_id,
                            audio: request.kind == DownloadKind::Audio,
                            playlist: request.playlist,
                        },
                    );
                }
                Effect::StartPolling { job_id } => {
                    tg_info!("StartPolling job_id={}", job_id);
                    self.engine.start_polling(job_id);
                }
                Effect::CancelPolling => {
                    tg_debug!("CancelPolling");
                    self.engine.cancel_polling();
                }
                Effect::RecordCompletion(done) => {
                    let entry = HistoryEntry::from_completed(&done, Utc::now());
                    self.writer.record(entry);
                }
            }
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Stops polling and waits for queued history writes.
    pub fn shutdown(&mut self) {
        self.engine.cancel_polling();
        self.writer.finish();
    }

    fn spawn_event_loop(&self, base: Option<Url>, event_tx: mpsc::Sender<AppEvent>) {
        let engine = self.engine.clone();
        thread::spawn(move || {
            forward_events(|| engine.recv_timeout(EVENT_WAIT), base.as_ref(), &event_tx);
        });
    }
}

/// Pumps engine events into the app channel until either side goes away.
pub(crate) fn forward_events(
    mut next: impl FnMut() -> Result<EngineEvent, RecvTimeoutError>,
    base: Option<&Url>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    loop {
        let event = match next() {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                tg_error!("Engine event channel closed");
                return;
            }
        };
        if event_tx.send(AppEvent::Msg(msg_from_event(event, base))).is_err() {
            return;
        }
    }
}

pub(crate) fn msg_from_event(event: EngineEvent, base: Option<&Url>) -> Msg {
    match event {
        EngineEvent::MediaInfo { token, result } => match result {
            Ok(payload) => Msg::MediaInfoLoaded {
                token,
                info: media_info_from_payload(payload),
            },
            Err(err) => {
                tg_warn!("Media info request {} failed: {}", token, err);
                Msg::MediaInfoFailed {
                    token,
                    failure: failure_from(err),
                }
            }
        },
        EngineEvent::DownloadStarted { token, result } => match result {
            Ok(job_id) => Msg::DownloadAccepted { token, job_id },
            Err(err) => {
                tg_warn!("Download start {} failed: {}", token, err);
                Msg::DownloadRejected {
                    token,
                    failure: failure_from(err),
                }
            }
        },
        EngineEvent::Status { job_id, result } => match result {
            Ok(report) => Msg::StatusReported {
                status: status_from_report(report, base),
                job_id,
            },
            Err(err) => Msg::StatusPollFailed {
                failure: failure_from(err),
                job_id,
            },
        },
    }
}

pub(crate) fn media_info_from_payload(payload: MediaInfoPayload) -> MediaInfo {
    let details = if payload.is_playlist {
        let entries: Vec<PlaylistEntry> = payload
            .entries
            .into_iter()
            .map(|item| PlaylistEntry {
                title: item.title,
                duration_seconds: whole_seconds(item.duration),
            })
            .collect();
        let item_count = payload
            .playlist_count
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(entries.len());
        MediaDetails::Playlist {
            item_count,
            entries,
        }
    } else {
        MediaDetails::Single {
            duration_seconds: whole_seconds(payload.duration),
            uploader: payload.uploader,
            view_count: payload.view_count,
            thumbnail_url: payload.thumbnail,
        }
    };

    MediaInfo {
        title: payload.title,
        details,
        formats: format_options(payload.formats),
        audio_formats: format_options(payload.audio_formats),
    }
}

fn format_options(entries: Vec<FormatEntry>) -> Vec<FormatOption> {
    entries
        .into_iter()
        .map(|entry| FormatOption::new(entry.format_id, entry.format_note))
        .collect()
}

fn whole_seconds(raw: Option<f64>) -> Option<u64> {
    raw.filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value.round() as u64)
}

pub(crate) fn status_from_report(report: JobStatusReport, base: Option<&Url>) -> JobStatus {
    match report.status {
        JobState::Starting => JobStatus::Starting,
        JobState::Downloading => JobStatus::Downloading {
            percent: percent_from_raw(report.progress),
        },
        JobState::Processing => JobStatus::Processing,
        JobState::Complete => JobStatus::Complete {
            download_url: report
                .download_url
                .map(|link| resolve_link(&link, base)),
            filename: report.filename,
        },
        JobState::Error => JobStatus::Failed {
            message: report.error,
        },
    }
}

/// Makes a service-relative file link absolute against the service base URL.
fn resolve_link(link: &str, base: Option<&Url>) -> String {
    if Url::parse(link).is_ok() {
        return link.to_string();
    }
    base.and_then(|base| base.join(link).ok())
        .map(String::from)
        .unwrap_or_else(|| link.to_string())
}

/// Keeps server-supplied text for answered requests. Transport problems carry
/// no message so the session shows its own fallback text.
pub(crate) fn failure_from(err: ServiceError) -> ServiceFailure {
    match err.kind {
        EngineFailure::HttpStatus(code) => ServiceFailure::request(code, err.message),
        EngineFailure::MissingDownloadId => ServiceFailure {
            kind: FailureKind::Transport,
            message: err.message,
        },
        _ => ServiceFailure {
            kind: FailureKind::Transport,
            message: None,
        },
    }
}
