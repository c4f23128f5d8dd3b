use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tubegrab_engine::{
    DownloadParams, FailureKind, JobService, JobState, ReqwestJobService, ServiceSettings,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> ReqwestJobService {
    let settings = ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    };
    ReqwestJobService::new(&settings).expect("service")
}

#[tokio::test]
async fn media_info_posts_form_and_decodes_single_video() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video_info"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("url=https%3A%2F%2Fexample.com%2Fwatch%3Fv%3D1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playlist": false,
            "title": "Clip",
            "duration": 125.4,
            "uploader": "someone",
            "view_count": 4200,
            "thumbnail": "https://img.example.com/1.jpg",
            "formats": [
                {"format_id": "best", "format_note": "Best Quality (Video)"},
                {"format_id": "18"}
            ],
            "audio_formats": [{"format_id": "bestaudio", "format_note": "Best Quality (Audio)"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = service_for(&server)
        .fetch_media_info("https://example.com/watch?v=1")
        .await
        .expect("info");

    assert!(!info.is_playlist);
    assert_eq!(info.title.as_deref(), Some("Clip"));
    assert_eq!(info.view_count, Some(4200));
    assert_eq!(info.formats.len(), 2);
    assert_eq!(info.formats[1].format_note, None);
    assert_eq!(info.audio_formats[0].format_id, "bestaudio");
}

#[tokio::test]
async fn media_info_decodes_playlist() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playlist": true,
            "title": "Mix",
            "playlist_count": 40,
            "entries": [{"title": "one", "duration": 61}, {"title": null}],
            "formats": [{"format_id": "best"}],
            "audio_formats": []
        })))
        .mount(&server)
        .await;

    let info = service_for(&server)
        .fetch_media_info("https://example.com/list")
        .await
        .expect("info");

    assert!(info.is_playlist);
    assert_eq!(info.playlist_count, Some(40));
    assert_eq!(info.entries.len(), 2);
    assert_eq!(info.entries[0].duration, Some(61.0));
    assert_eq!(info.entries[1].title, None);
}

#[tokio::test]
async fn error_body_message_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video_info"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Video unavailable"})),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .fetch_media_info("https://example.com/gone")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.message.as_deref(), Some("Video unavailable"));
    assert!(err.is_http_status());
}

#[tokio::test]
async fn non_json_error_body_has_no_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/video_info"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .fetch_media_info("https://example.com/v")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(502));
    assert_eq!(err.message, None);
}

#[tokio::test]
async fn start_download_sends_all_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .and(body_string_contains("format=bestaudio"))
        .and(body_string_contains("type=audio"))
        .and(body_string_contains("playlist=true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"download_id": "1700000000000", "message": "Download started"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let params = DownloadParams {
        url: "https://example.com/list".to_string(),
        format_id: "bestaudio".to_string(),
        audio: true,
        playlist: true,
    };
    let job_id = service_for(&server)
        .start_download(&params)
        .await
        .expect("job id");

    assert_eq!(job_id, "1700000000000");
}

#[tokio::test]
async fn start_download_accepts_numeric_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"download_id": 42})))
        .mount(&server)
        .await;

    let params = DownloadParams {
        url: "https://example.com/v".to_string(),
        format_id: "best".to_string(),
        audio: false,
        playlist: false,
    };
    let job_id = service_for(&server).start_download(&params).await.unwrap();
    assert_eq!(job_id, "42");
}

#[tokio::test]
async fn start_download_without_id_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .mount(&server)
        .await;

    let params = DownloadParams {
        url: "https://example.com/v".to_string(),
        format_id: "best".to_string(),
        audio: false,
        playlist: false,
    };
    let err = service_for(&server)
        .start_download(&params)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MissingDownloadId);
    assert_eq!(
        err.message.as_deref(),
        Some("No download ID received from server")
    );
}

#[tokio::test]
async fn status_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_status/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "progress": 100,
            "filename": "/tmp/x/clip.mp4",
            "download_url": "/get_file/abc"
        })))
        .mount(&server)
        .await;

    let report = service_for(&server).download_status("abc").await.unwrap();
    assert_eq!(report.status, JobState::Complete);
    assert_eq!(report.download_url.as_deref(), Some("/get_file/abc"));
    assert_eq!(report.filename.as_deref(), Some("/tmp/x/clip.mp4"));
}

#[tokio::test]
async fn endpoints_resolve_below_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download_status/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "starting"})))
        .expect(1)
        .mount(&server)
        .await;

    let settings = ServiceSettings {
        base_url: format!("{}/api/", server.uri()),
        ..ServiceSettings::default()
    };
    let service = ReqwestJobService::new(&settings).unwrap();
    let report = service.download_status("7").await.unwrap();
    assert_eq!(report.status, JobState::Starting);
}

#[tokio::test]
async fn unknown_status_label_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_status/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "paused"})))
        .mount(&server)
        .await;

    let err = service_for(&server).download_status("abc").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download_status/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"status": "starting"})),
        )
        .mount(&server)
        .await;

    let settings = ServiceSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ServiceSettings::default()
    };
    let service = ReqwestJobService::new(&settings).unwrap();
    let err = service.download_status("slow").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(!err.is_http_status());
}

#[test]
fn invalid_base_url_is_rejected() {
    let settings = ServiceSettings {
        base_url: "not a url".to_string(),
        ..ServiceSettings::default()
    };
    let err = ReqwestJobService::new(&settings).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
