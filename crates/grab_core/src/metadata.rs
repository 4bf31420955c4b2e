use serde::{Deserialize, Serialize};

use crate::MediaType;

/// Bundle name used until page metadata provides a title.
pub const DEFAULT_BUNDLE_NAME: &str = "media-assets.zip";

/// Page information used to configure a scrape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub pagination_candidates: Vec<PaginationCandidate>,
    #[serde(default)]
    pub main_selectors: Vec<String>,
    /// Media types present on the page. Informational only: it never narrows
    /// the set of types a user may choose.
    #[serde(default)]
    pub media_types: Vec<MediaType>,
    #[serde(default)]
    pub pagination_similar_links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationCandidate {
    pub selector: String,
    pub count: u32,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// `<title>.zip` when metadata carries a non-blank title, the default otherwise.
pub fn derive_bundle_name(metadata: Option<&PageMetadata>) -> String {
    metadata
        .and_then(|meta| meta.title.as_deref())
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(|title| format!("{title}.zip"))
        .unwrap_or_else(|| DEFAULT_BUNDLE_NAME.to_string())
}

/// Pages offered for a multi-page scrape: the target itself first, then every
/// similar link except the target, first occurrence wins.
pub fn detected_pagination_links(target_url: &str, metadata: &PageMetadata) -> Vec<String> {
    let mut links: Vec<String> = Vec::with_capacity(metadata.pagination_similar_links.len() + 1);
    if !target_url.is_empty() {
        links.push(target_url.to_string());
    }
    for link in &metadata.pagination_similar_links {
        if link != target_url && !links.contains(link) {
            links.push(link.clone());
        }
    }
    links
}
