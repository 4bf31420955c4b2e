use serde::{Deserialize, Serialize};

use crate::{MediaAsset, MediaType};

/// Parameters of one scrape run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub url: String,
    pub keyword: Option<String>,
    pub selector: Option<String>,
    pub media_types: Vec<MediaType>,
    /// Explicit pages to traverse; `None` scrapes only `url`.
    pub pagination_links: Option<Vec<String>>,
}

impl ScrapeConfig {
    pub fn new(url: impl Into<String>, media_types: Vec<MediaType>) -> Self {
        Self {
            url: url.into(),
            keyword: None,
            selector: None,
            media_types,
            pagination_links: None,
        }
    }
}

/// Normalized scrape result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrapeOutput {
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub media_assets: Vec<MediaAsset>,
}

impl ScrapeOutput {
    pub fn assets_of(&self, media_type: MediaType) -> impl Iterator<Item = &MediaAsset> {
        self.media_assets
            .iter()
            .filter(move |asset| asset.media_type == media_type)
    }
}
