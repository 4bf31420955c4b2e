use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use grab_core::{update, AppState, AppViewModel, JobPhase, MediaType, Msg};
use grab_logging::{grab_info, grab_warn};

use crate::effects::EffectRunner;
use crate::render;

/// What the user asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct GrabRequest {
    pub url: String,
    pub all_pages: bool,
    /// Empty keeps every media type.
    pub media_types: Vec<MediaType>,
    pub keyword: Option<String>,
    pub selector: Option<String>,
    pub bundle_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Ready,
    Failed(String),
    Cancelled,
}

/// Owns the session state and feeds it messages, running every effect the
/// update loop emits until the queue drains.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    last_job_line: Option<String>,
}

impl Session {
    pub fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
            last_job_line: None,
        }
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn runner(&self) -> &EffectRunner {
        &self.runner
    }

    pub async fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (mut state, effects) = update(state, msg);
            let was_dirty = state.consume_dirty();
            self.state = state;
            if was_dirty {
                self.render_job();
            }
            inbox.extend(self.runner.run(effects).await);
        }
    }

    /// Fetches metadata, scrapes, selects every found asset and starts the
    /// download job.
    pub async fn prepare(&mut self, request: &GrabRequest) -> anyhow::Result<()> {
        self.dispatch(Msg::UrlChanged(request.url.clone())).await;
        if !request.media_types.is_empty() {
            self.dispatch(Msg::MediaTypesChanged(request.media_types.clone()))
                .await;
        }
        if let Some(keyword) = &request.keyword {
            self.dispatch(Msg::KeywordChanged(keyword.clone())).await;
        }
        if let Some(selector) = &request.selector {
            self.dispatch(Msg::SelectorChanged(selector.clone())).await;
        }

        self.dispatch(Msg::FetchMetadataClicked).await;
        let view = self.view();
        if let Some(err) = &view.metadata_error {
            if request.url.trim().is_empty() {
                bail!("{err}");
            }
            grab_warn!("Metadata unavailable, scraping the page alone: {}", err);
        }
        if request.all_pages && !view.pagination_links.is_empty() && !view.all_pages_selected {
            grab_info!("Selecting {} detected pages", view.pagination_links.len());
            self.dispatch(Msg::AllPagesToggled).await;
        }
        if let Some(name) = &request.bundle_name {
            self.dispatch(Msg::BundleNameChanged(name.clone())).await;
        }

        self.dispatch(Msg::ScrapeClicked).await;
        let view = self.view();
        if let Some(err) = &view.error {
            bail!("scrape failed: {err}");
        }
        for line in render::scrape_summary(&view) {
            println!("{line}");
        }

        for tab in view.tabs.iter().filter(|tab| tab.count > 0 && !tab.all_selected) {
            self.dispatch(Msg::SelectAllToggled(tab.media_type)).await;
        }
        if self.view().selected_count == 0 {
            bail!("no media assets found on {}", request.url);
        }

        self.dispatch(Msg::DownloadClicked).await;
        let view = self.view();
        if let Some(err) = &view.error {
            bail!("could not start download: {err}");
        }
        println!(
            "Bundling {} assets as {}",
            view.selected_count, view.bundle_name
        );
        Ok(())
    }

    /// Follows the job until it settles. When `interrupt` resolves first the
    /// session is reset, which deletes an unfinished server job.
    pub async fn follow_job<F>(&mut self, interrupt: F) -> JobOutcome
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        loop {
            tokio::select! {
                msgs = self.runner.next_job_msgs() => {
                    if msgs.is_empty() {
                        break;
                    }
                    for msg in msgs {
                        self.dispatch(msg).await;
                    }
                }
                _ = &mut interrupt => {
                    grab_info!("Interrupted, resetting session");
                    self.dispatch(Msg::ResetClicked).await;
                    return JobOutcome::Cancelled;
                }
            }
        }
        match self.state.job_phase() {
            JobPhase::Ready => JobOutcome::Ready,
            _ => JobOutcome::Failed(
                self.state
                    .error()
                    .unwrap_or("job ended without a bundle")
                    .to_string(),
            ),
        }
    }

    /// Retrieves the bundle into `output_dir`. After a stream failure the
    /// bundle may exist regardless, so retrieval is attempted either way and
    /// the errored job is released afterwards.
    pub async fn save(
        &mut self,
        outcome: &JobOutcome,
        output_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        match outcome {
            JobOutcome::Ready => self.runner.save_bundle(output_dir).await,
            JobOutcome::Failed(reason) => {
                let saved = self
                    .runner
                    .save_bundle(output_dir)
                    .await
                    .with_context(|| format!("download failed: {reason}"));
                self.dispatch(Msg::ResetClicked).await;
                saved
            }
            JobOutcome::Cancelled => bail!("download cancelled"),
        }
    }

    /// Prepares, follows and saves one job. `interrupt` is honoured at every
    /// step and resets the session; a failed step resets it too. Returns
    /// `None` when interrupted.
    pub async fn run<F>(
        &mut self,
        request: &GrabRequest,
        output_dir: &Path,
        interrupt: F,
    ) -> anyhow::Result<Option<PathBuf>>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let prepared = tokio::select! {
            prepared = self.prepare(request) => prepared,
            _ = &mut interrupt => {
                grab_info!("Interrupted while preparing, resetting session");
                self.dispatch(Msg::ResetClicked).await;
                return Ok(None);
            }
        };
        if let Err(err) = prepared {
            self.dispatch(Msg::ResetClicked).await;
            return Err(err);
        }

        let outcome = self.follow_job(interrupt.as_mut()).await;
        if outcome == JobOutcome::Cancelled {
            return Ok(None);
        }
        self.save(&outcome, output_dir).await.map(Some)
    }

    fn render_job(&mut self) {
        let Some(job) = self.state.view().job else {
            self.last_job_line = None;
            return;
        };
        let line = render::job_line(&job);
        if self.last_job_line.as_deref() != Some(line.as_str()) {
            println!("{line}");
            self.last_job_line = Some(line);
        }
    }
}
