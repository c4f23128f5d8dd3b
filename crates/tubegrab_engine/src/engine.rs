use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tubegrab_logging::{tg_debug, tg_info};

use crate::poller::{poll_job, ChannelEventSink, EventSink};
use crate::{
    DownloadParams, EngineEvent, JobService, ReqwestJobService, RequestToken, ServiceError,
    ServiceSettings,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid service configuration: {0}")]
    Service(#[from] ServiceError),
}

enum EngineCommand {
    FetchMediaInfo {
        token: RequestToken,
        url: String,
    },
    StartDownload {
        token: RequestToken,
        params: DownloadParams,
    },
    StartPolling {
        job_id: String,
    },
    CancelPolling,
}

/// Runs service calls on a background tokio runtime and reports results as
/// [`EngineEvent`]s.
///
/// At most one status poll runs at a time: starting a poll cancels the
/// previous one.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ServiceSettings) -> Result<Self, EngineError> {
        let service = ReqwestJobService::new(&settings)?;
        Self::with_service(Arc::new(service), settings.poll_interval)
    }

    pub fn with_service(
        service: Arc<dyn JobService>,
        poll_interval: Duration,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut active_poll: Option<CancellationToken> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { job_id } => {
                        if let Some(previous) = active_poll.take() {
                            previous.cancel();
                        }
                        tg_info!("polling job {} every {:?}", job_id, poll_interval);
                        let cancel = CancellationToken::new();
                        active_poll = Some(cancel.clone());
                        let service = service.clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        runtime.spawn(async move {
                            poll_job(service.as_ref(), &job_id, poll_interval, cancel, &sink)
                                .await;
                        });
                    }
                    EngineCommand::CancelPolling => {
                        if let Some(previous) = active_poll.take() {
                            tg_debug!("cancelling active poll");
                            previous.cancel();
                        }
                    }
                    command => {
                        let service = service.clone();
                        let sink = ChannelEventSink::new(event_tx.clone());
                        runtime.spawn(async move {
                            handle_request(service.as_ref(), command, &sink).await;
                        });
                    }
                }
            }
            if let Some(previous) = active_poll.take() {
                previous.cancel();
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn fetch_media_info(&self, token: RequestToken, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::FetchMediaInfo {
            token,
            url: url.into(),
        });
    }

    pub fn start_download(&self, token: RequestToken, params: DownloadParams) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::StartDownload { token, params });
    }

    pub fn start_polling(&self, job_id: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling {
            job_id: job_id.into(),
        });
    }

    pub fn cancel_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::CancelPolling);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Blocks up to `timeout` for the next event.
    ///
    /// `Disconnected` means the engine thread is gone and no event will ever arrive.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        let rx = self
            .event_rx
            .lock()
            .map_err(|_| RecvTimeoutError::Disconnected)?;
        rx.recv_timeout(timeout)
    }
}

async fn handle_request(service: &dyn JobService, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::FetchMediaInfo { token, url } => {
            let result = service.fetch_media_info(&url).await;
            sink.emit(EngineEvent::MediaInfo { token, result });
        }
        EngineCommand::StartDownload { token, params } => {
            let result = service.start_download(&params).await;
            sink.emit(EngineEvent::DownloadStarted { token, result });
        }
        EngineCommand::StartPolling { .. } | EngineCommand::CancelPolling => {}
    }
}
