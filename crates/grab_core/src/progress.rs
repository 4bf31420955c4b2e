use std::fmt;

use serde::{Deserialize, Serialize};

/// Status label the server reports while the archive is being written.
pub const STATUS_PREPARING: &str = "Preparing ZIP...";
/// Status label of a finished job.
pub const STATUS_READY: &str = "ready";

/// Opaque job identifier assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobToken(String);

impl JobToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One payload pushed over the progress channel. All fields are required;
/// unknown extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: String,
    pub current: u64,
    pub total: u64,
    pub zip_size: u64,
    pub ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Requesting,
    Active,
    Ready,
    Errored,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Ready | JobPhase::Errored)
    }
}

/// Client-side record of one server bundling job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub token: JobToken,
    pub urls: Vec<String>,
    pub bundle_name: String,
    pub status: String,
    pub current: u64,
    pub total: u64,
    pub bundle_size: u64,
    pub ready: bool,
}

impl DownloadJob {
    pub fn new(token: JobToken, urls: Vec<String>, bundle_name: impl Into<String>) -> Self {
        Self {
            token,
            urls,
            bundle_name: bundle_name.into(),
            status: String::new(),
            current: 0,
            total: 0,
            bundle_size: 0,
            ready: false,
        }
    }

    /// Last-received-wins: every progress field is overwritten.
    pub fn apply(&mut self, event: &ProgressEvent) {
        self.status.clone_from(&event.status);
        self.current = event.current;
        self.total = event.total;
        self.bundle_size = event.zip_size;
        self.ready = event.ready;
    }

    /// Completion percentage for display.
    pub fn percent(&self) -> u8 {
        if self.status == STATUS_PREPARING || self.status == STATUS_READY {
            return 100;
        }
        if self.total == 0 {
            return 0;
        }
        let ratio = self.current.min(self.total) as f64 / self.total as f64;
        (ratio * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> DownloadJob {
        DownloadJob::new(JobToken::from("t"), vec!["u".to_string()], "b.zip")
    }

    #[test]
    fn event_overwrites_all_progress_fields() {
        let mut job = job();
        job.apply(&ProgressEvent {
            status: "Downloading Files".to_string(),
            current: 2,
            total: 3,
            zip_size: 0,
            ready: false,
        });
        job.apply(&ProgressEvent {
            status: "Downloading Files".to_string(),
            current: 1,
            total: 3,
            zip_size: 7,
            ready: false,
        });
        assert_eq!(job.current, 1);
        assert_eq!(job.bundle_size, 7);
        assert_eq!(job.percent(), 33);
    }

    #[test]
    fn percent_saturates_for_final_stages() {
        let mut job = job();
        assert_eq!(job.percent(), 0);
        job.status = STATUS_PREPARING.to_string();
        assert_eq!(job.percent(), 100);
    }

    #[test]
    fn missing_field_fails_to_parse() {
        let result = serde_json::from_str::<ProgressEvent>(r#"{"status":"x","current":1}"#);
        assert!(result.is_err());
        let extra = serde_json::from_str::<ProgressEvent>(
            r#"{"status":"ready","current":1,"total":1,"zip_size":9,"ready":true,"zip_name":"a.zip","error":null}"#,
        );
        assert!(extra.is_ok());
    }
}
