use std::sync::Arc;

use futures_util::StreamExt;
use grab_core::{JobToken, ProgressEvent};
use grab_logging::{grab_debug, grab_info, grab_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::Collaborator;

/// What a progress channel reports to its owner. Every signal carries the
/// token of the channel that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Progress { token: JobToken, event: ProgressEvent },
    Failed { token: JobToken, message: String },
}

impl StreamSignal {
    pub fn token(&self) -> &JobToken {
        match self {
            StreamSignal::Progress { token, .. } | StreamSignal::Failed { token, .. } => token,
        }
    }
}

pub trait StreamSink: Send + Sync {
    fn emit(&self, signal: StreamSignal);
}

pub struct ChannelStreamSink {
    tx: mpsc::UnboundedSender<StreamSignal>,
}

impl ChannelStreamSink {
    pub fn new(tx: mpsc::UnboundedSender<StreamSignal>) -> Self {
        Self { tx }
    }
}

impl StreamSink for ChannelStreamSink {
    fn emit(&self, signal: StreamSignal) {
        let _ = self.tx.send(signal);
    }
}

/// One subscription to a job's progress channel.
///
/// Well-formed payloads reach the sink in arrival order; payloads that fail to
/// parse are dropped. A transport failure is reported once, after which the
/// channel is finished. There is no reconnection.
pub struct ProgressStreamClient {
    token: JobToken,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProgressStreamClient {
    /// Must be called from within a tokio runtime.
    pub fn open(api: Arc<dyn Collaborator>, token: JobToken, sink: Arc<dyn StreamSink>) -> Self {
        grab_info!("Opening progress channel for job {}", token);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(pump(api, token.clone(), sink, cancel.clone()));
        Self {
            token,
            cancel,
            task: Some(task),
        }
    }

    pub fn token(&self) -> &JobToken {
        &self.token
    }

    /// False once closed or once the channel finished on its own.
    pub fn is_open(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Releases the connection and waits until the reader has stopped, so no
    /// signal is emitted after this returns. Returns false when there was
    /// nothing left to close.
    pub async fn close(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };
        self.cancel.cancel();
        if let Err(err) = task.await {
            if err.is_panic() {
                grab_warn!("Progress reader for job {} panicked", self.token);
            }
        }
        grab_debug!("Closed progress channel for job {}", self.token);
        true
    }
}

impl Drop for ProgressStreamClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn pump(
    api: Arc<dyn Collaborator>,
    token: JobToken,
    sink: Arc<dyn StreamSink>,
    cancel: CancellationToken,
) {
    let fail = |message: String| {
        grab_warn!("Progress channel for job {} failed: {}", token, message);
        sink.emit(StreamSignal::Failed {
            token: token.clone(),
            message,
        });
    };

    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = api.progress_stream(&token) => opened,
    };
    let mut messages = match opened {
        Ok(messages) => messages,
        Err(err) => {
            fail(err.to_string());
            return;
        }
    };

    let mut saw_ready = false;
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = messages.next() => next,
        };
        match next {
            Some(Ok(message)) if message.is_error() => {
                fail(format!("server reported an error: {}", message.data));
                return;
            }
            Some(Ok(message)) => match serde_json::from_str::<ProgressEvent>(&message.data) {
                Ok(event) => {
                    saw_ready |= event.ready;
                    sink.emit(StreamSignal::Progress {
                        token: token.clone(),
                        event,
                    });
                }
                Err(err) => {
                    grab_debug!("Dropping unparseable payload for job {}: {}", token, err);
                }
            },
            Some(Err(err)) => {
                fail(err.to_string());
                return;
            }
            None => {
                if !saw_ready {
                    fail("progress stream ended before the job was ready".to_string());
                }
                return;
            }
        }
    }
}
