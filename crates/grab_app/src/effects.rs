use std::path::{Path, PathBuf};
use std::sync::Arc;

use grab_core::{Effect, JobPhase, Msg};
use grab_engine::{
    save_bundle, Collaborator, JobController, JobError, JobUpdate, ScrapeCoordinator,
};
use grab_logging::grab_info;

/// Executes core effects against the engine and turns their outcomes back
/// into messages.
pub struct EffectRunner {
    coordinator: ScrapeCoordinator,
    jobs: JobController,
}

impl EffectRunner {
    pub fn new(api: Arc<dyn Collaborator>) -> Self {
        Self {
            coordinator: ScrapeCoordinator::new(api.clone()),
            jobs: JobController::new(api),
        }
    }

    pub fn jobs(&self) -> &JobController {
        &self.jobs
    }

    pub async fn run(&mut self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut msgs = Vec::new();
        for effect in effects {
            match effect {
                Effect::FetchMetadata { url } => {
                    grab_info!("FetchMetadata url={}", url);
                    let result = self.coordinator.fetch_metadata(&url).await;
                    msgs.push(Msg::MetadataLoaded(result.map_err(|err| err.to_string())));
                }
                Effect::RunScrape(config) => {
                    grab_info!(
                        "RunScrape url={} types={:?} pages={}",
                        config.url,
                        config.media_types,
                        config.pagination_links.as_ref().map_or(0, Vec::len)
                    );
                    let result = self.coordinator.run_scrape(&config).await;
                    msgs.push(Msg::ScrapeCompleted(result.map_err(|err| err.to_string())));
                }
                Effect::StartJob { urls, bundle_name } => {
                    let started = self.jobs.start(&urls, &bundle_name).await;
                    msgs.push(self.job_snapshot());
                    if let Err(err) = started {
                        msgs.push(Msg::JobFailed(err.to_string()));
                    }
                }
                Effect::ResetJob => {
                    self.jobs.reset().await;
                }
            }
        }
        msgs
    }

    /// Waits for the next change of the live job. Empty once no progress
    /// channel is open.
    pub async fn next_job_msgs(&mut self) -> Vec<Msg> {
        match self.jobs.next_update().await {
            Some(JobUpdate::Progress) | Some(JobUpdate::Ready) => vec![self.job_snapshot()],
            Some(JobUpdate::Failed(err)) => {
                vec![self.job_snapshot(), Msg::JobFailed(err.to_string())]
            }
            None => Vec::new(),
        }
    }

    /// Downloads the current bundle and writes it into `output_dir`.
    pub async fn save_bundle(&self, output_dir: &Path) -> anyhow::Result<PathBuf> {
        let job = self.jobs.job().ok_or(JobError::NoJob)?;
        if !matches!(self.jobs.phase(), JobPhase::Ready | JobPhase::Errored) {
            anyhow::bail!("job {} is not finished", job.token);
        }
        let bundle = self.jobs.retrieve_bundle().await?;
        let path = save_bundle(output_dir, &job.bundle_name, &bundle)?;
        grab_info!("Saved {} bytes to {:?}", bundle.len(), path);
        Ok(path)
    }

    fn job_snapshot(&self) -> Msg {
        Msg::JobChanged {
            phase: self.jobs.phase(),
            job: self.jobs.job().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grab_core::{JobToken, MediaType, ProgressEvent, ScrapeConfig, STATUS_READY};
    use grab_engine::testing::{MockCall, MockCollaborator};
    use grab_engine::{ApiError, FailureKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn runner(mock: &MockCollaborator) -> EffectRunner {
        EffectRunner::new(Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn scrape_effect_yields_completion_message() {
        let mock = MockCollaborator::new();
        let mut runner = runner(&mock);

        let msgs = runner
            .run(vec![Effect::RunScrape(ScrapeConfig::new(
                "https://x.test/",
                vec![MediaType::Img],
            ))])
            .await;

        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], Msg::ScrapeCompleted(Ok(_))));
    }

    #[tokio::test]
    async fn failed_start_reports_idle_and_error() {
        let mock = MockCollaborator::new();
        mock.enqueue_job(Err(ApiError::new(FailureKind::HttpStatus(500), "boom")));
        let mut runner = runner(&mock);

        let msgs = runner
            .run(vec![Effect::StartJob {
                urls: vec!["https://x.test/a.png".to_string()],
                bundle_name: "a.zip".to_string(),
            }])
            .await;

        assert_eq!(
            msgs[0],
            Msg::JobChanged {
                phase: JobPhase::Idle,
                job: None
            }
        );
        assert!(matches!(&msgs[1], Msg::JobFailed(message) if message.contains("boom")));
    }

    #[tokio::test]
    async fn ready_job_is_saved_and_reset_skips_delete() {
        let mock = MockCollaborator::new();
        let token = JobToken::from("abc123");
        mock.enqueue_job(Ok(token.clone()));
        mock.set_bundle(&token, b"PK zip".to_vec());
        let mut runner = runner(&mock);

        runner
            .run(vec![Effect::StartJob {
                urls: vec!["https://x.test/a.png".to_string()],
                bundle_name: "Gallery.zip".to_string(),
            }])
            .await;
        mock.push_event(
            &token,
            &ProgressEvent {
                status: STATUS_READY.to_string(),
                current: 1,
                total: 1,
                zip_size: 6,
                ready: true,
            },
        );

        let msgs = runner.next_job_msgs().await;
        assert!(matches!(
            &msgs[..],
            [Msg::JobChanged { phase: JobPhase::Ready, job: Some(_) }]
        ));
        assert!(runner.next_job_msgs().await.is_empty());

        let temp = TempDir::new().unwrap();
        let path = runner.save_bundle(temp.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "Gallery.zip");
        assert_eq!(std::fs::read(path).unwrap(), b"PK zip");

        runner.run(vec![Effect::ResetJob]).await;
        assert_eq!(mock.count_calls(&MockCall::DeleteJob(token)), 0);
        assert_eq!(runner.jobs().phase(), JobPhase::Idle);
    }

    #[tokio::test]
    async fn saving_without_a_job_fails() {
        let mock = MockCollaborator::new();
        let runner = runner(&mock);
        let temp = TempDir::new().unwrap();
        assert!(runner.save_bundle(temp.path()).await.is_err());
    }
}
