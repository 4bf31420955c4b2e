//! In-memory collaborator for exercising the controller and coordinator
//! without a server.
//!
//! Progress channels are scripted per job token: push messages before or
//! after the channel opens, fail it, or end it. Every call, and every drop of
//! an opened channel, is recorded in order.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use grab_core::{JobToken, ProgressEvent};
use tokio::sync::mpsc;

use crate::client::SseStream;
use crate::{
    ApiError, Collaborator, CreateJobRequest, FailureKind, MetadataRequest, RawMetadata,
    RawScrapeResponse, ScrapeRequest, SseMessage,
};

type ScriptedItem = Result<SseMessage, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    FetchMetadata(String),
    Scrape(ScrapeRequest),
    CreateJob(CreateJobRequest),
    DeleteJob(JobToken),
    DownloadBundle(JobToken),
    OpenStream(JobToken),
    /// An opened channel's stream was dropped by its reader.
    CloseStream(JobToken),
}

#[derive(Default)]
struct MockState {
    metadata: Option<Result<RawMetadata, ApiError>>,
    scrape: Option<Result<RawScrapeResponse, ApiError>>,
    jobs: VecDeque<Result<JobToken, ApiError>>,
    delete_error: Option<ApiError>,
    bundles: HashMap<JobToken, Bytes>,
    senders: HashMap<JobToken, mpsc::UnboundedSender<ScriptedItem>>,
    receivers: HashMap<JobToken, mpsc::UnboundedReceiver<ScriptedItem>>,
    calls: Vec<MockCall>,
}

impl MockState {
    fn sender(&mut self, token: &JobToken) -> mpsc::UnboundedSender<ScriptedItem> {
        if let Some(tx) = self.senders.get(token) {
            return tx.clone();
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(token.clone(), tx.clone());
        self.receivers.insert(token.clone(), rx);
        tx
    }
}

#[derive(Clone, Default)]
pub struct MockCollaborator {
    state: Arc<Mutex<MockState>>,
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_metadata(&self, result: Result<RawMetadata, ApiError>) {
        self.lock().metadata = Some(result);
    }

    pub fn set_scrape(&self, result: Result<RawScrapeResponse, ApiError>) {
        self.lock().scrape = Some(result);
    }

    /// Queues the answer of the next create-job call.
    pub fn enqueue_job(&self, result: Result<JobToken, ApiError>) {
        self.lock().jobs.push_back(result);
    }

    /// Makes every delete-job call fail with `error`.
    pub fn fail_deletes(&self, error: ApiError) {
        self.lock().delete_error = Some(error);
    }

    pub fn set_bundle(&self, token: &JobToken, bundle: impl Into<Bytes>) {
        self.lock().bundles.insert(token.clone(), bundle.into());
    }

    pub fn push_message(&self, token: &JobToken, message: SseMessage) {
        let _ = self.lock().sender(token).send(Ok(message));
    }

    pub fn push_data(&self, token: &JobToken, data: &str) {
        self.push_message(token, SseMessage::data(data));
    }

    pub fn push_event(&self, token: &JobToken, event: &ProgressEvent) {
        let data = serde_json::to_string(event).unwrap_or_default();
        self.push_data(token, &data);
    }

    /// Delivers a transport error on the channel.
    pub fn fail_stream(&self, token: &JobToken, message: &str) {
        let _ = self
            .lock()
            .sender(token)
            .send(Err(ApiError::new(FailureKind::Network, message)));
    }

    /// Ends the channel as if the server closed the connection.
    pub fn end_stream(&self, token: &JobToken) {
        let mut state = self.lock();
        state.sender(token);
        state.senders.remove(token);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, expected: &MockCall) -> usize {
        self.lock().calls.iter().filter(|call| *call == expected).count()
    }

    /// Index of the first matching call, for ordering assertions.
    pub fn position(&self, expected: &MockCall) -> Option<usize> {
        self.lock().calls.iter().position(|call| call == expected)
    }

    fn record(&self, call: MockCall) {
        self.lock().calls.push(call);
    }
}

#[async_trait::async_trait]
impl Collaborator for MockCollaborator {
    async fn fetch_metadata(&self, request: &MetadataRequest) -> Result<RawMetadata, ApiError> {
        self.record(MockCall::FetchMetadata(request.url.clone()));
        self.lock()
            .metadata
            .clone()
            .unwrap_or_else(|| Ok(RawMetadata::default()))
    }

    async fn scrape(&self, request: &ScrapeRequest) -> Result<RawScrapeResponse, ApiError> {
        self.record(MockCall::Scrape(request.clone()));
        self.lock()
            .scrape
            .clone()
            .unwrap_or_else(|| Ok(RawScrapeResponse::default()))
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobToken, ApiError> {
        self.record(MockCall::CreateJob(request.clone()));
        self.lock().jobs.pop_front().unwrap_or_else(|| {
            Err(ApiError::new(
                FailureKind::HttpStatus(500),
                "no job scripted",
            ))
        })
    }

    async fn delete_job(&self, token: &JobToken) -> Result<(), ApiError> {
        self.record(MockCall::DeleteJob(token.clone()));
        match self.lock().delete_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn download_bundle(&self, token: &JobToken) -> Result<Bytes, ApiError> {
        self.record(MockCall::DownloadBundle(token.clone()));
        self.lock()
            .bundles
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::new(FailureKind::HttpStatus(404), "ZIP not ready"))
    }

    async fn progress_stream(&self, token: &JobToken) -> Result<SseStream, ApiError> {
        self.record(MockCall::OpenStream(token.clone()));
        let receiver = {
            let mut state = self.lock();
            if !state.receivers.contains_key(token) && !state.senders.contains_key(token) {
                state.sender(token);
            }
            state.receivers.remove(token)
        };
        let receiver = receiver.ok_or_else(|| {
            ApiError::new(FailureKind::HttpStatus(409), "channel already consumed")
        })?;
        Ok(ScriptedStream {
            token: token.clone(),
            receiver,
            mock: self.clone(),
        }
        .boxed())
    }
}

struct ScriptedStream {
    token: JobToken,
    receiver: mpsc::UnboundedReceiver<ScriptedItem>,
    mock: MockCollaborator,
}

impl Stream for ScriptedStream {
    type Item = ScriptedItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.mock.record(MockCall::CloseStream(self.token.clone()));
    }
}
