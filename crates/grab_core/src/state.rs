use crate::view_model::{
    AppViewModel, AssetTabView, JobRowView, MediaTypeOption, PageLinkView,
};
use crate::{
    derive_bundle_name, detected_pagination_links, DownloadJob, JobPhase, MediaAsset, MediaType,
    PageMetadata, ScrapeConfig, ScrapeOutput, Selection,
};

/// Session state behind the scrape form: configuration, scrape results and
/// the two selection sets. Holds no I/O handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    target_url: String,
    keyword: String,
    selector: String,
    media_types: Vec<MediaType>,
    active_tab: Option<MediaType>,
    metadata: Option<PageMetadata>,
    metadata_loading: bool,
    metadata_error: Option<String>,
    results: Vec<String>,
    assets: Vec<MediaAsset>,
    selected_assets: Selection,
    selected_pages: Selection,
    bundle_name: String,
    scraping: bool,
    error: Option<String>,
    job_phase: JobPhase,
    job: Option<DownloadJob>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            keyword: String::new(),
            selector: String::new(),
            media_types: MediaType::ALL.to_vec(),
            active_tab: Some(MediaType::ALL[0]),
            metadata: None,
            metadata_loading: false,
            metadata_error: None,
            results: Vec::new(),
            assets: Vec::new(),
            selected_assets: Selection::new(),
            selected_pages: Selection::new(),
            bundle_name: derive_bundle_name(None),
            scraping: false,
            error: None,
            job_phase: JobPhase::Idle,
            job: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn media_types(&self) -> &[MediaType] {
        &self.media_types
    }

    pub fn metadata(&self) -> Option<&PageMetadata> {
        self.metadata.as_ref()
    }

    pub fn assets(&self) -> &[MediaAsset] {
        &self.assets
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn selected_assets(&self) -> &Selection {
        &self.selected_assets
    }

    pub fn selected_pages(&self) -> &Selection {
        &self.selected_pages
    }

    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn job_phase(&self) -> JobPhase {
        self.job_phase
    }

    /// Returns and clears the "needs re-render" flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_target_url(&mut self, url: String) {
        self.target_url = url;
    }

    pub(crate) fn set_keyword(&mut self, keyword: String) {
        self.keyword = keyword;
    }

    pub(crate) fn set_selector(&mut self, selector: String) {
        self.selector = selector;
    }

    pub(crate) fn set_bundle_name(&mut self, name: String) {
        self.bundle_name = name;
    }

    /// Stores the chosen types in canonical order. When the active tab is no
    /// longer chosen, the first chosen type becomes active.
    pub(crate) fn set_media_types(&mut self, mut media_types: Vec<MediaType>) {
        media_types.sort();
        media_types.dedup();
        let first = media_types.first().copied();
        if let Some(first) = first {
            if !self.active_tab.is_some_and(|tab| media_types.contains(&tab)) {
                self.active_tab = Some(first);
            }
        }
        self.media_types = media_types;
    }

    pub(crate) fn select_tab(&mut self, media_type: MediaType) {
        self.active_tab = Some(media_type);
    }

    pub(crate) fn begin_metadata_fetch(&mut self) {
        self.metadata_loading = true;
        self.metadata_error = None;
        self.error = None;
        self.clear_scrape_output();
        self.selected_pages.clear();
        self.set_metadata(None);
    }

    pub(crate) fn finish_metadata_fetch(&mut self, result: Result<PageMetadata, String>) {
        self.metadata_loading = false;
        match result {
            Ok(metadata) => self.set_metadata(Some(metadata)),
            Err(message) => self.metadata_error = Some(message),
        }
    }

    /// Metadata and the bundle name derived from it change together.
    fn set_metadata(&mut self, metadata: Option<PageMetadata>) {
        self.bundle_name = derive_bundle_name(metadata.as_ref());
        self.metadata = metadata;
    }

    pub(crate) fn set_metadata_error(&mut self, message: impl Into<String>) {
        self.metadata_error = Some(message.into());
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Builds the scrape request from the current form, then clears previous
    /// output and both selections. The page selection feeds this request
    /// before it is cleared.
    pub(crate) fn begin_scrape(&mut self) -> ScrapeConfig {
        let config = ScrapeConfig {
            url: self.target_url.trim().to_string(),
            keyword: non_blank(&self.keyword),
            selector: non_blank(&self.selector),
            media_types: self.media_types.clone(),
            pagination_links: (!self.selected_pages.is_empty())
                .then(|| self.selected_pages.to_vec()),
        };
        self.scraping = true;
        self.error = None;
        self.clear_scrape_output();
        self.selected_pages.clear();
        self.active_tab = self.media_types.first().copied();
        config
    }

    pub(crate) fn finish_scrape(&mut self, result: Result<ScrapeOutput, String>) {
        self.scraping = false;
        match result {
            Ok(output) => {
                self.results = output.results;
                self.assets = output.media_assets;
            }
            Err(message) => self.error = Some(message),
        }
    }

    fn clear_scrape_output(&mut self) {
        self.results.clear();
        self.assets.clear();
        self.selected_assets.clear();
    }

    pub(crate) fn toggle_asset(&mut self, url: &str) {
        self.selected_assets.toggle(url);
    }

    pub(crate) fn toggle_all_of_type(&mut self, media_type: MediaType) {
        let urls = self
            .assets
            .iter()
            .filter(|asset| asset.media_type == media_type)
            .map(|asset| asset.url.as_str());
        self.selected_assets.toggle_all(urls);
    }

    pub(crate) fn toggle_page(&mut self, url: &str) {
        self.selected_pages.toggle(url);
    }

    /// Clears the page selection when every listed page is selected,
    /// otherwise makes it exactly the listed pages.
    pub(crate) fn toggle_all_pages(&mut self) {
        let links = self.pagination_links();
        if self
            .selected_pages
            .all_selected(links.iter().map(String::as_str))
        {
            self.selected_pages.clear();
        } else {
            self.selected_pages = links.into_iter().collect();
        }
    }

    fn pagination_links(&self) -> Vec<String> {
        self.metadata
            .as_ref()
            .map(|meta| detected_pagination_links(&self.target_url, meta))
            .unwrap_or_default()
    }

    pub(crate) fn set_job(&mut self, phase: JobPhase, job: Option<DownloadJob>) {
        self.job_phase = phase;
        self.job = job;
    }

    pub fn view(&self) -> AppViewModel {
        let pagination_links = self.pagination_links();
        let all_pages_selected = self
            .selected_pages
            .all_selected(pagination_links.iter().map(String::as_str));

        let tabs = self
            .media_types
            .iter()
            .map(|&media_type| {
                let urls: Vec<&str> = self
                    .assets
                    .iter()
                    .filter(|asset| asset.media_type == media_type)
                    .map(|asset| asset.url.as_str())
                    .collect();
                AssetTabView {
                    media_type,
                    label: media_type.label(),
                    count: urls.len(),
                    all_selected: self.selected_assets.all_selected(urls.iter().copied()),
                }
            })
            .collect();

        AppViewModel {
            target_url: self.target_url.clone(),
            media_type_options: MediaType::ALL
                .into_iter()
                .map(|media_type| MediaTypeOption {
                    media_type,
                    label: media_type.label(),
                    chosen: self.media_types.contains(&media_type),
                })
                .collect(),
            detected_media_types: self
                .metadata
                .as_ref()
                .map(|meta| meta.media_types.clone())
                .unwrap_or_default(),
            tabs,
            active_tab: self.active_tab,
            pagination_links: pagination_links
                .into_iter()
                .map(|url| PageLinkView {
                    selected: self.selected_pages.contains(&url),
                    url,
                })
                .collect(),
            all_pages_selected,
            result_count: self.results.len(),
            asset_count: self.assets.len(),
            selected_count: self.selected_assets.len(),
            bundle_name: self.bundle_name.clone(),
            metadata_loading: self.metadata_loading,
            scraping: self.scraping,
            metadata_error: self.metadata_error.clone(),
            error: self.error.clone(),
            job_phase: self.job_phase,
            job: self.job.as_ref().map(|job| JobRowView {
                token: job.token.to_string(),
                status: job.status.clone(),
                current: job.current,
                total: job.total,
                percent: job.percent(),
                bundle_size: job.bundle_size,
                ready: job.ready,
            }),
            dirty: self.dirty,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
