use std::sync::Arc;

use grab_core::{MediaAsset, MediaType, PageMetadata, ScrapeConfig, ScrapeOutput};
use grab_logging::{grab_info, grab_warn};

use crate::{
    ApiError, Collaborator, FailureKind, MetadataRequest, RawMetadata, RawScrapeResponse,
    ScrapeError, ScrapeRequest,
};

/// Issues the metadata and scrape requests and normalizes their answers.
#[derive(Clone)]
pub struct ScrapeCoordinator {
    api: Arc<dyn Collaborator>,
}

impl ScrapeCoordinator {
    pub fn new(api: Arc<dyn Collaborator>) -> Self {
        Self { api }
    }

    pub async fn fetch_metadata(&self, target_url: &str) -> Result<PageMetadata, ScrapeError> {
        let url = require_url(target_url)?;
        let raw = self.api.fetch_metadata(&MetadataRequest { url }).await?;
        let metadata = normalize_metadata(raw)?;
        grab_info!(
            "Metadata: {} pagination candidates, {} similar links, media {:?}",
            metadata.pagination_candidates.len(),
            metadata.pagination_similar_links.len(),
            metadata.media_types
        );
        Ok(metadata)
    }

    pub async fn run_scrape(&self, config: &ScrapeConfig) -> Result<ScrapeOutput, ScrapeError> {
        let url = require_url(&config.url)?;
        let request = ScrapeRequest {
            url,
            keyword: config.keyword.clone(),
            selector: config.selector.clone(),
            media_types: config.media_types.clone(),
            pagination_links: config.pagination_links.clone(),
        };
        let raw = self.api.scrape(&request).await?;
        let output = normalize_scrape(raw);
        grab_info!(
            "Scrape returned {} text results and {} media assets",
            output.results.len(),
            output.media_assets.len()
        );
        Ok(output)
    }
}

fn require_url(target_url: &str) -> Result<String, ScrapeError> {
    let url = target_url.trim();
    if url.is_empty() {
        return Err(ScrapeError::Validation("a target URL is required".to_string()));
    }
    Ok(url.to_string())
}

fn normalize_metadata(raw: RawMetadata) -> Result<PageMetadata, ApiError> {
    if let Some(message) = raw.error {
        return Err(ApiError::new(FailureKind::Rejected, message));
    }
    Ok(PageMetadata {
        title: raw.title,
        pagination_candidates: raw.pagination_candidates,
        main_selectors: raw.main_selectors,
        media_types: raw
            .media_types
            .iter()
            .filter_map(|token| parse_media_type(token))
            .collect(),
        pagination_similar_links: raw.pagination_similar_links,
    })
}

fn normalize_scrape(raw: RawScrapeResponse) -> ScrapeOutput {
    let media_assets = raw
        .media_assets
        .unwrap_or_default()
        .into_iter()
        .filter_map(|asset| {
            parse_media_type(&asset.media_type).map(|media_type| MediaAsset {
                url: asset.url,
                media_type,
            })
        })
        .collect();
    ScrapeOutput {
        results: raw.results.unwrap_or_default(),
        media_assets,
    }
}

fn parse_media_type(token: &str) -> Option<MediaType> {
    match token.parse() {
        Ok(media_type) => Some(media_type),
        Err(err) => {
            grab_warn!("Skipping {}", err);
            None
        }
    }
}
