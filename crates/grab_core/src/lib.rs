//! Mediagrab core: pure session state machine, selection algebra and job data.
mod effect;
mod media;
mod metadata;
mod msg;
mod progress;
mod scrape;
mod selection;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use media::{MediaAsset, MediaType, UnknownMediaType};
pub use metadata::{
    derive_bundle_name, detected_pagination_links, PageMetadata, PaginationCandidate,
    DEFAULT_BUNDLE_NAME,
};
pub use msg::Msg;
pub use progress::{
    DownloadJob, JobPhase, JobToken, ProgressEvent, STATUS_PREPARING, STATUS_READY,
};
pub use scrape::{ScrapeConfig, ScrapeOutput};
pub use selection::Selection;
pub use state::AppState;
pub use update::update;
pub use view_model::{AppViewModel, AssetTabView, JobRowView, MediaTypeOption, PageLinkView};
