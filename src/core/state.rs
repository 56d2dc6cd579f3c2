//! Run state model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Run has not started
    NotStarted,
    /// Run is in progress
    Running,
    /// All steps completed
    Completed,
    /// A step failed and the run was aborted
    Failed,
    /// The run was cancelled at a step boundary
    Cancelled,
}

/// Bookkeeping for a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique id for this run
    pub execution_id: Uuid,

    /// Current status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution reached a terminal status
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::NotStarted,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
        self.finished_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.status = ExecutionStatus::Cancelled;
        self.finished_at = Some(Utc::now());
    }

    /// Whether the run reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
