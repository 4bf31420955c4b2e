use crate::ScrapeConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchMetadata { url: String },
    RunScrape(ScrapeConfig),
    StartJob { urls: Vec<String>, bundle_name: String },
    ResetJob,
}
