use std::sync::mpsc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tubegrab_logging::tg_debug;

use crate::{EngineEvent, JobService};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEnd {
    /// The service reported `complete` or `error`.
    Terminal,
    Cancelled,
}

/// Polls the status of `job_id` every `interval` until a terminal status is
/// reported or `cancel` fires.
///
/// The first poll is issued immediately. Every poll result is emitted to
/// `sink`. A failed poll is logged and the loop carries on. No event is
/// emitted once `cancel` has fired, even for a request already in flight.
pub async fn poll_job(
    service: &dyn JobService,
    job_id: &str,
    interval: Duration,
    cancel: CancellationToken,
    sink: &dyn EventSink,
) -> PollEnd {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = service.download_status(job_id) => result,
        };

        let terminal = match &result {
            Ok(report) => {
                tg_debug!(
                    "job {} status {:?} progress {:?}",
                    job_id,
                    report.status,
                    report.progress
                );
                report.status.is_terminal()
            }
            Err(err) => {
                tg_debug!("status poll for job {} failed: {}", job_id, err);
                false
            }
        };
        sink.emit(EngineEvent::Status {
            job_id: job_id.to_string(),
            result,
        });
        if terminal {
            tg_debug!("poll for job {} finished", job_id);
            return PollEnd::Terminal;
        }
    }

    tg_debug!("poll for job {} cancelled", job_id);
    PollEnd::Cancelled
}
