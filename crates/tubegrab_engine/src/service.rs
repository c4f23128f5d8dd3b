use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tubegrab_logging::tg_debug;
use url::Url;

use crate::{DownloadParams, FailureKind, JobStatusReport, MediaInfoPayload, ServiceError};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Root of the job service; endpoints are resolved below it.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Delay between status polls of an active job.
    pub poll_interval: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// The three calls the session makes against the external job service.
#[async_trait::async_trait]
pub trait JobService: Send + Sync {
    async fn fetch_media_info(&self, url: &str) -> Result<MediaInfoPayload, ServiceError>;

    /// Starts a job and returns its id.
    async fn start_download(&self, params: &DownloadParams) -> Result<String, ServiceError>;

    async fn download_status(&self, job_id: &str) -> Result<JobStatusReport, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobService {
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct StartBody {
    #[serde(default)]
    download_id: Option<serde_json::Value>,
}

impl ReqwestJobService {
    pub fn new(settings: &ServiceSettings) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a service root"),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::new(FailureKind::InvalidUrl, "service url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ServiceError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|body| body.error);
            return Err(ServiceError::status(status.as_u16(), message));
        }
        Ok(body.to_vec())
    }
}

#[async_trait::async_trait]
impl JobService for ReqwestJobService {
    async fn fetch_media_info(&self, url: &str) -> Result<MediaInfoPayload, ServiceError> {
        let endpoint = self.endpoint(&["video_info"])?;
        tg_debug!("POST {} url={}", endpoint, url);
        let body = self
            .send(self.client.post(endpoint).form(&[("url", url)]))
            .await?;
        decode(&body)
    }

    async fn start_download(&self, params: &DownloadParams) -> Result<String, ServiceError> {
        let endpoint = self.endpoint(&["download"])?;
        tg_debug!(
            "POST {} format={} audio={} playlist={}",
            endpoint,
            params.format_id,
            params.audio,
            params.playlist
        );
        let body = self
            .send(self.client.post(endpoint).form(&params.form_fields()))
            .await?;
        let start: StartBody = decode(&body)?;
        let job_id = match start.download_id {
            Some(serde_json::Value::String(id)) => id,
            Some(serde_json::Value::Number(id)) => id.to_string(),
            _ => String::new(),
        };
        if job_id.is_empty() {
            return Err(ServiceError::new(
                FailureKind::MissingDownloadId,
                "No download ID received from server",
            ));
        }
        Ok(job_id)
    }

    async fn download_status(&self, job_id: &str) -> Result<JobStatusReport, ServiceError> {
        let endpoint = self.endpoint(&["download_status", job_id])?;
        let body = self.send(self.client.get(endpoint)).await?;
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(body)
        .map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ServiceError::new(FailureKind::Decode, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}
