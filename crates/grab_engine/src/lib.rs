//! Mediagrab engine: collaborator I/O, progress streaming and job lifecycle.
mod client;
mod controller;
mod coordinator;
mod filename;
mod persist;
mod sse;
mod stream;
pub mod testing;
mod types;

pub use client::{ClientSettings, Collaborator, ReqwestCollaborator, SseStream};
pub use controller::{JobController, JobUpdate};
pub use coordinator::ScrapeCoordinator;
pub use filename::bundle_filename;
pub use persist::{ensure_output_dir, save_bundle, AtomicFileWriter, PersistError};
pub use sse::SseDecoder;
pub use stream::{ChannelStreamSink, ProgressStreamClient, StreamSignal, StreamSink};
pub use types::{
    ApiError, CreateJobRequest, CreateJobResponse, FailureKind, JobError, MetadataRequest,
    RawAsset, RawMetadata, RawScrapeResponse, ScrapeError, ScrapeRequest, SseMessage,
};
