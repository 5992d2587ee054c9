//! Run Record - lifecycle of one run inside a batch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is created but not yet started.
    Pending,
    /// Run is currently executing.
    Running,
    /// Run produced an experiment log.
    Success,
    /// Run aborted with an error.
    Failed,
    /// Run was cancelled between days.
    Cancelled,
}

/// Run Record tracks one independent run of a batch.
///
/// Each run has its own seed, so a batch can be replayed run by run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    index: usize,
    seed: u64,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl RunRecord {
    /// Create a new run record in Pending status.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the run in its batch
    /// * `seed` - Seed of the run's random-number source
    #[must_use]
    pub fn new(index: usize, seed: u64) -> Self {
        Self {
            run_id: format!("run-{:03}", index + 1),
            index,
            seed,
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            error: None,
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the position in the batch.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Get the run's seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the failure message, if the run failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start the run, transitioning from Pending to Running.
    ///
    /// Sets the `started_at` timestamp to now.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Complete the run with the given final status.
    ///
    /// Sets the `ended_at` timestamp to now.
    pub fn complete(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// Complete the run as Failed, keeping the error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.complete(RunStatus::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_default() {
        let run = RunRecord::new(0, 17);
        assert_eq!(run.status(), RunStatus::Pending);
        assert_eq!(run.run_id(), "run-001");
        assert_eq!(run.seed(), 17);
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = RunRecord::new(1, 0);
        run.start();
        assert_eq!(run.status(), RunStatus::Running);
        assert!(run.started_at().is_some());
        run.complete(RunStatus::Success);
        assert_eq!(run.status(), RunStatus::Success);
        assert!(run.ended_at().is_some());
    }

    #[test]
    fn test_run_failure_keeps_message() {
        let mut run = RunRecord::new(2, 0);
        run.start();
        run.fail("bad data");
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(run.error(), Some("bad data"));
    }
}
