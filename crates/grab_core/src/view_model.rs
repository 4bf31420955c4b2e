use crate::{JobPhase, MediaType};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub target_url: String,
    /// Every canonical type, independent of what the page was detected to hold.
    pub media_type_options: Vec<MediaTypeOption>,
    pub detected_media_types: Vec<MediaType>,
    pub tabs: Vec<AssetTabView>,
    pub active_tab: Option<MediaType>,
    pub pagination_links: Vec<PageLinkView>,
    pub all_pages_selected: bool,
    pub result_count: usize,
    pub asset_count: usize,
    pub selected_count: usize,
    pub bundle_name: String,
    pub metadata_loading: bool,
    pub scraping: bool,
    pub metadata_error: Option<String>,
    pub error: Option<String>,
    pub job_phase: JobPhase,
    pub job: Option<JobRowView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTypeOption {
    pub media_type: MediaType,
    pub label: &'static str,
    pub chosen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTabView {
    pub media_type: MediaType,
    pub label: &'static str,
    pub count: usize,
    pub all_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinkView {
    pub url: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub token: String,
    pub status: String,
    pub current: u64,
    pub total: u64,
    pub percent: u8,
    pub bundle_size: u64,
    pub ready: bool,
}
