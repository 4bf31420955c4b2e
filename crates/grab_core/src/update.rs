use crate::{AppState, Effect, Msg, DEFAULT_BUNDLE_NAME};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::UrlChanged(url) => {
            state.set_target_url(url);
            state.mark_dirty();
            Vec::new()
        }
        Msg::KeywordChanged(keyword) => {
            state.set_keyword(keyword);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SelectorChanged(selector) => {
            state.set_selector(selector);
            state.mark_dirty();
            Vec::new()
        }
        Msg::BundleNameChanged(name) => {
            state.set_bundle_name(name);
            state.mark_dirty();
            Vec::new()
        }
        Msg::MediaTypesChanged(media_types) => {
            state.set_media_types(media_types);
            state.mark_dirty();
            Vec::new()
        }
        Msg::FetchMetadataClicked => {
            let url = state.target_url().trim().to_string();
            state.mark_dirty();
            if url.is_empty() {
                state.set_metadata_error("Please enter a URL.");
                return (state, Vec::new());
            }
            state.begin_metadata_fetch();
            vec![Effect::FetchMetadata { url }]
        }
        Msg::MetadataLoaded(result) => {
            state.finish_metadata_fetch(result);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ScrapeClicked => {
            state.mark_dirty();
            if state.target_url().trim().is_empty() {
                state.set_error("Please enter a URL.");
                return (state, Vec::new());
            }
            let config = state.begin_scrape();
            vec![Effect::RunScrape(config)]
        }
        Msg::ScrapeCompleted(result) => {
            state.finish_scrape(result);
            state.mark_dirty();
            Vec::new()
        }
        Msg::AssetToggled(url) => {
            state.toggle_asset(&url);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SelectAllToggled(media_type) => {
            state.toggle_all_of_type(media_type);
            state.mark_dirty();
            Vec::new()
        }
        Msg::PageToggled(url) => {
            state.toggle_page(&url);
            state.mark_dirty();
            Vec::new()
        }
        Msg::AllPagesToggled => {
            state.toggle_all_pages();
            state.mark_dirty();
            Vec::new()
        }
        Msg::TabSelected(media_type) => {
            state.select_tab(media_type);
            state.mark_dirty();
            Vec::new()
        }
        Msg::DownloadClicked => {
            // Empty selection never reaches the job controller.
            if state.selected_assets().is_empty() {
                state.set_error("Select at least one asset to download.");
                state.mark_dirty();
                return (state, Vec::new());
            }
            let bundle_name = match state.bundle_name().trim() {
                "" => DEFAULT_BUNDLE_NAME.to_string(),
                name => name.to_string(),
            };
            vec![Effect::StartJob {
                urls: state.selected_assets().to_vec(),
                bundle_name,
            }]
        }
        Msg::JobChanged { phase, job } => {
            state.set_job(phase, job);
            state.mark_dirty();
            Vec::new()
        }
        Msg::JobFailed(message) => {
            state.set_error(message);
            state.mark_dirty();
            Vec::new()
        }
        Msg::ResetClicked => {
            state = AppState::new();
            state.mark_dirty();
            vec![Effect::ResetJob]
        }
    };

    (state, effects)
}
