use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use grab_core::{DownloadJob, JobPhase, JobToken, ProgressEvent, DEFAULT_BUNDLE_NAME};
use grab_logging::{grab_debug, grab_info, grab_warn};
use tokio::sync::mpsc;

use crate::stream::{ChannelStreamSink, ProgressStreamClient, StreamSignal, StreamSink};
use crate::{Collaborator, CreateJobRequest, JobError};

/// Outcome of folding one channel signal into the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Progress,
    Ready,
    Failed(JobError),
}

/// Drives one download job from creation to a terminal state.
///
/// The controller is the only owner of the progress channel: it opens it in
/// [`start`](Self::start), closes it on readiness, on stream failure and in
/// [`reset`](Self::reset), and always closes the previous channel before a new
/// one opens. Signals from a channel that is no longer current are discarded.
pub struct JobController {
    api: Arc<dyn Collaborator>,
    phase: JobPhase,
    job: Option<DownloadJob>,
    channel: Option<ProgressStreamClient>,
    sink: Arc<dyn StreamSink>,
    signals: mpsc::UnboundedReceiver<StreamSignal>,
    last_error: Option<JobError>,
    channels_opened: u64,
    channels_closed: u64,
}

impl JobController {
    pub fn new(api: Arc<dyn Collaborator>) -> Self {
        let (tx, signals) = mpsc::unbounded_channel();
        Self {
            api,
            phase: JobPhase::Idle,
            job: None,
            channel: None,
            sink: Arc::new(ChannelStreamSink::new(tx)),
            signals,
            last_error: None,
            channels_opened: 0,
            channels_closed: 0,
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn job(&self) -> Option<&DownloadJob> {
        self.job.as_ref()
    }

    /// Kept after a stream failure so the bundle can still be fetched or the
    /// job cleaned up.
    pub fn token(&self) -> Option<&JobToken> {
        self.job.as_ref().map(|job| &job.token)
    }

    pub fn is_ready(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.ready)
    }

    pub fn last_error(&self) -> Option<&JobError> {
        self.last_error.as_ref()
    }

    pub fn has_open_channel(&self) -> bool {
        self.channel.is_some()
    }

    pub fn channel_token(&self) -> Option<&JobToken> {
        self.channel.as_ref().map(ProgressStreamClient::token)
    }

    pub fn channels_opened(&self) -> u64 {
        self.channels_opened
    }

    pub fn channels_closed(&self) -> u64 {
        self.channels_closed
    }

    /// Creates a server job for `urls` and subscribes to its progress.
    ///
    /// An empty selection is rejected before anything changes. Any previous
    /// job is released first; a job replaced before it was ready is deleted on
    /// the server, best effort.
    pub async fn start(&mut self, urls: &[String], bundle_name: &str) -> Result<JobToken, JobError> {
        let urls = ordered_unique(urls);
        if urls.is_empty() {
            return Err(JobError::Validation(
                "select at least one asset before starting a download".to_string(),
            ));
        }
        let bundle_name = match bundle_name.trim() {
            "" => DEFAULT_BUNDLE_NAME.to_string(),
            name => name.to_string(),
        };

        self.release_job().await;
        self.phase = JobPhase::Requesting;
        self.last_error = None;

        let request = CreateJobRequest {
            urls: urls.clone(),
            zip_name: bundle_name.clone(),
        };
        let token = match self.api.create_job(&request).await {
            Ok(token) => token,
            Err(err) => {
                grab_warn!("Creating download job failed: {}", err);
                self.phase = JobPhase::Idle;
                let err = JobError::Network(err);
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };

        grab_info!(
            "Download job {} created for {} assets as {}",
            token,
            urls.len(),
            bundle_name
        );
        self.job = Some(DownloadJob::new(token.clone(), urls, bundle_name));
        self.channel = Some(ProgressStreamClient::open(
            self.api.clone(),
            token.clone(),
            self.sink.clone(),
        ));
        self.channels_opened += 1;
        self.phase = JobPhase::Active;
        Ok(token)
    }

    /// Overwrites the job's progress with `event`. A ready event is terminal:
    /// it closes the channel and every later event is ignored.
    pub async fn on_progress_event(&mut self, event: ProgressEvent) {
        if self.phase != JobPhase::Active {
            grab_debug!("Ignoring progress event in phase {:?}", self.phase);
            return;
        }
        let Some(job) = self.job.as_mut() else {
            return;
        };
        job.apply(&event);
        if event.ready {
            grab_info!("Job {} ready, bundle size {} bytes", job.token, job.bundle_size);
            self.phase = JobPhase::Ready;
            self.close_channel().await;
        }
    }

    /// Marks the job failed and closes its channel. The token is kept.
    pub async fn on_stream_error(&mut self, message: impl Into<String>) -> Option<JobError> {
        if self.phase != JobPhase::Active {
            return None;
        }
        let err = JobError::Stream(message.into());
        grab_warn!("Job {:?} errored: {}", self.token().map(JobToken::as_str), err);
        self.phase = JobPhase::Errored;
        self.last_error = Some(err.clone());
        self.close_channel().await;
        Some(err)
    }

    /// Folds one channel signal. Signals from any channel other than the
    /// current one are stale and dropped.
    pub async fn dispatch(&mut self, signal: StreamSignal) -> Option<JobUpdate> {
        if self.phase != JobPhase::Active || self.token() != Some(signal.token()) {
            grab_debug!("Dropping stale signal for job {}", signal.token());
            return None;
        }
        match signal {
            StreamSignal::Progress { event, .. } => {
                self.on_progress_event(event).await;
                Some(if self.phase == JobPhase::Ready {
                    JobUpdate::Ready
                } else {
                    JobUpdate::Progress
                })
            }
            StreamSignal::Failed { message, .. } => {
                self.on_stream_error(message).await.map(JobUpdate::Failed)
            }
        }
    }

    /// Waits for the next signal of the live channel and folds it. Returns
    /// `None` when no channel is open.
    pub async fn next_update(&mut self) -> Option<JobUpdate> {
        while self.channel.is_some() {
            let signal = self.signals.recv().await?;
            if let Some(update) = self.dispatch(signal).await {
                return Some(update);
            }
        }
        None
    }

    /// Folds signals until the job is ready or has failed.
    pub async fn wait_until_settled(&mut self) -> Result<&DownloadJob, JobError> {
        loop {
            match self.next_update().await {
                Some(JobUpdate::Progress) => continue,
                Some(JobUpdate::Failed(err)) => return Err(err),
                Some(JobUpdate::Ready) | None => break,
            }
        }
        match (self.phase, self.job.as_ref()) {
            (JobPhase::Ready, Some(job)) => Ok(job),
            _ => Err(self.last_error.clone().unwrap_or(JobError::NoJob)),
        }
    }

    /// Downloads the bundle of the current job. Allowed after a stream
    /// failure, as the server may have finished regardless.
    pub async fn retrieve_bundle(&self) -> Result<Bytes, JobError> {
        let token = self.token().ok_or(JobError::NoJob)?;
        Ok(self.api.download_bundle(token).await?)
    }

    /// Returns to Idle. Never fails: an unfinished job is deleted on the
    /// server best effort, the channel is closed and all job state is cleared.
    pub async fn reset(&mut self) {
        self.release_job().await;
        self.phase = JobPhase::Idle;
        self.last_error = None;
        while self.signals.try_recv().is_ok() {}
        grab_info!("Job controller reset");
    }

    async fn release_job(&mut self) {
        self.close_channel().await;
        let Some(job) = self.job.take() else {
            return;
        };
        if job.ready {
            return;
        }
        // Fire and forget: one attempt, failure only logged.
        match self.api.delete_job(&job.token).await {
            Ok(()) => grab_info!("Deleted unfinished job {}", job.token),
            Err(err) => grab_warn!("Deleting job {} failed: {}", job.token, err),
        }
    }

    async fn close_channel(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if channel.close().await {
                self.channels_closed += 1;
            }
        }
    }
}

fn ordered_unique(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}
