use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{future, StreamExt};
use grab_core::JobToken;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::sse::SseDecoder;
use crate::{
    ApiError, CreateJobRequest, CreateJobResponse, FailureKind, MetadataRequest, RawMetadata,
    RawScrapeResponse, ScrapeRequest, SseMessage,
};

/// Messages of one progress channel, in server-send order.
pub type SseStream = BoxStream<'static, Result<SseMessage, ApiError>>;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to unary calls only; the progress channel and bundle body are
    /// never cut short.
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The scraping and bundling service.
#[async_trait::async_trait]
pub trait Collaborator: Send + Sync {
    async fn fetch_metadata(&self, request: &MetadataRequest) -> Result<RawMetadata, ApiError>;

    async fn scrape(&self, request: &ScrapeRequest) -> Result<RawScrapeResponse, ApiError>;

    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobToken, ApiError>;

    async fn delete_job(&self, token: &JobToken) -> Result<(), ApiError>;

    async fn download_bundle(&self, token: &JobToken) -> Result<Bytes, ApiError>;

    /// Opens the push channel for `token`. The returned stream ends when the
    /// server closes the connection.
    async fn progress_stream(&self, token: &JobToken) -> Result<SseStream, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestCollaborator {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestCollaborator {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let mut base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be a base url", settings.base_url),
            ));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    /// Appends path segments to the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post_json<B, T>(&self, segment: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint(&[segment]))
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.settings.request_timeout)
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl Collaborator for ReqwestCollaborator {
    async fn fetch_metadata(&self, request: &MetadataRequest) -> Result<RawMetadata, ApiError> {
        self.post_json("scrape-metadata", request).await
    }

    async fn scrape(&self, request: &ScrapeRequest) -> Result<RawScrapeResponse, ApiError> {
        self.post_json("scrape", request).await
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobToken, ApiError> {
        let created: CreateJobResponse = self.post_json("start-download-media", request).await?;
        Ok(created.job_id)
    }

    async fn delete_job(&self, token: &JobToken) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoint(&["download-zip", token.as_str()]))
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn download_bundle(&self, token: &JobToken) -> Result<Bytes, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["download-zip", token.as_str()]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        response.bytes().await.map_err(map_reqwest_error)
    }

    async fn progress_stream(&self, token: &JobToken) -> Result<SseStream, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&["download-progress", token.as_str()]))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let messages = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk| {
                let batch: Vec<Result<SseMessage, ApiError>> = match chunk {
                    Ok(bytes) => decoder.feed(&bytes).into_iter().map(Ok).collect(),
                    Err(err) => vec![Err(map_reqwest_error(err))],
                };
                future::ready(Some(stream::iter(batch)))
            })
            .flatten()
            .boxed();
        Ok(messages)
    }
}

/// Non-2xx answers become `HttpStatus` errors carrying the response text.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    };
    Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), message))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
