use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tubegrab_engine::{
    poll_job, EngineEvent, EventSink, JobState, PollEnd, ReqwestJobService, ServiceSettings,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const INTERVAL: Duration = Duration::from_millis(20);

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Replies with each scripted response in turn, repeating the last one.
struct Script {
    steps: Vec<(u16, Value)>,
    calls: AtomicUsize,
}

impl Script {
    fn new(steps: Vec<(u16, Value)>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for Script {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let (status, body) = &self.steps[call.min(self.steps.len() - 1)];
        ResponseTemplate::new(*status).set_body_json(body.clone())
    }
}

fn service_for(server: &MockServer) -> ReqwestJobService {
    ReqwestJobService::new(&ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    })
    .expect("service")
}

async fn status_requests(server: &MockServer, job_id: &str) -> usize {
    let wanted = format!("/download_status/{job_id}");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == wanted)
        .count()
}

fn states(events: &[EngineEvent]) -> Vec<Option<JobState>> {
    events
        .iter()
        .map(|event| match event {
            EngineEvent::Status { result, .. } => result.as_ref().ok().map(|r| r.status),
            other => panic!("unexpected event {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn poll_runs_until_complete_then_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_status/job-1"))
        .respond_with(Script::new(vec![
            (200, json!({"status": "starting", "progress": 0})),
            (200, json!({"status": "downloading", "progress": 30})),
            (200, json!({"status": "downloading", "progress": 70})),
            (200, json!({"status": "complete", "progress": 100, "download_url": "x.mp4"})),
        ]))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let sink = TestSink::default();
    let end = poll_job(
        &service,
        "job-1",
        INTERVAL,
        CancellationToken::new(),
        &sink,
    )
    .await;

    assert_eq!(end, PollEnd::Terminal);
    let events = sink.take();
    assert_eq!(
        states(&events),
        vec![
            Some(JobState::Starting),
            Some(JobState::Downloading),
            Some(JobState::Downloading),
            Some(JobState::Complete),
        ]
    );
    match &events[3] {
        EngineEvent::Status { job_id, result } => {
            assert_eq!(job_id, "job-1");
            assert_eq!(
                result.as_ref().unwrap().download_url.as_deref(),
                Some("x.mp4")
            );
        }
        other => panic!("unexpected event {other:?}"),
    }

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(status_requests(&server, "job-1").await, 4);
}

#[tokio::test]
async fn poll_stops_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_status/job-1"))
        .respond_with(Script::new(vec![
            (200, json!({"status": "downloading", "progress": 12.5})),
            (200, json!({"status": "error", "error": "disk full"})),
        ]))
        .mount(&server)
        .await;

    let sink = TestSink::default();
    let end = poll_job(
        &service_for(&server),
        "job-1",
        INTERVAL,
        CancellationToken::new(),
        &sink,
    )
    .await;

    assert_eq!(end, PollEnd::Terminal);
    let events = sink.take();
    assert_eq!(events.len(), 2);
    match &events[1] {
        EngineEvent::Status { result, .. } => {
            let report = result.as_ref().unwrap();
            assert_eq!(report.status, JobState::Error);
            assert_eq!(report.error.as_deref(), Some("disk full"));
        }
        other => panic!("unexpected event {other:?}"),
    }

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(status_requests(&server, "job-1").await, 2);
}

#[tokio::test]
async fn transport_failures_do_not_stop_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_status/job-1"))
        .respond_with(Script::new(vec![
            (503, json!({"error": "busy"})),
            (404, json!({"error": "Download not found"})),
            (200, json!({"status": "processing"})),
            (200, json!({"status": "complete"})),
        ]))
        .mount(&server)
        .await;

    let sink = TestSink::default();
    let end = poll_job(
        &service_for(&server),
        "job-1",
        INTERVAL,
        CancellationToken::new(),
        &sink,
    )
    .await;

    assert_eq!(end, PollEnd::Terminal);
    assert_eq!(
        states(&sink.take()),
        vec![
            None,
            None,
            Some(JobState::Processing),
            Some(JobState::Complete)
        ]
    );
}

#[tokio::test]
async fn cancellation_stops_polling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_status/job-1"))
        .respond_with(Script::new(vec![(
            200,
            json!({"status": "downloading", "progress": 1}),
        )]))
        .mount(&server)
        .await;

    let service = Arc::new(service_for(&server));
    let sink = Arc::new(TestSink::default());
    let cancel = CancellationToken::new();
    let task = {
        let service = service.clone();
        let sink = sink.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            poll_job(service.as_ref(), "job-1", INTERVAL, cancel, sink.as_ref()).await
        })
    };

    tokio::time::sleep(INTERVAL * 4).await;
    cancel.cancel();
    let end = task.await.unwrap();
    assert_eq!(end, PollEnd::Cancelled);

    let polled = status_requests(&server, "job-1").await;
    assert!(polled >= 1);
    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(status_requests(&server, "job-1").await, polled);
    assert!(sink.take().len() <= polled);
}
