use crate::{DownloadJob, JobPhase, MediaType, PageMetadata, ScrapeOutput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the target page URL.
    UrlChanged(String),
    /// User edited the keyword filter.
    KeywordChanged(String),
    /// User edited the CSS selector filter.
    SelectorChanged(String),
    /// User edited the bundle name.
    BundleNameChanged(String),
    /// User changed which media types to collect.
    MediaTypesChanged(Vec<MediaType>),
    /// User asked for page metadata.
    FetchMetadataClicked,
    /// Metadata request finished.
    MetadataLoaded(Result<PageMetadata, String>),
    /// User asked to run the scrape.
    ScrapeClicked,
    /// Scrape request finished.
    ScrapeCompleted(Result<ScrapeOutput, String>),
    /// User toggled one asset.
    AssetToggled(String),
    /// User toggled select-all on a media tab.
    SelectAllToggled(MediaType),
    /// User toggled one pagination link.
    PageToggled(String),
    /// User toggled select-all on the pagination list.
    AllPagesToggled,
    /// User switched media tab.
    TabSelected(MediaType),
    /// User asked for the bundle of the selected assets.
    DownloadClicked,
    /// Job controller state changed.
    JobChanged {
        phase: JobPhase,
        job: Option<DownloadJob>,
    },
    /// Job start or progress stream failed.
    JobFailed(String),
    /// User clicked Reset.
    ResetClicked,
}
