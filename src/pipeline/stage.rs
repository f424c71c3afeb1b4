//! Request lifecycle: the ordered stages of a resize request.

use crate::error::PatternError;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

/// Stages of a resize request, in the only order they may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    SourcePersisted,
    Summarized,
    EstimatorInvoked,
    ScaleResolved,
    Transformed,
    Assembled,
    Responded,
    /// Terminal; reachable from any non-terminal stage.
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Responded | Stage::Failed)
    }

    /// The stage that must follow this one on success.
    pub fn next(&self) -> Option<Stage> {
        use Stage::*;
        match self {
            Received => Some(SourcePersisted),
            SourcePersisted => Some(Summarized),
            Summarized => Some(EstimatorInvoked),
            EstimatorInvoked => Some(ScaleResolved),
            ScaleResolved => Some(Transformed),
            Transformed => Some(Assembled),
            Assembled => Some(Responded),
            Responded | Failed => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Received => "received",
            Stage::SourcePersisted => "source-persisted",
            Stage::Summarized => "summarized",
            Stage::EstimatorInvoked => "estimator-invoked",
            Stage::ScaleResolved => "scale-resolved",
            Stage::Transformed => "transformed",
            Stage::Assembled => "assembled",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Tracks one request through its stages, logging each transition.
#[derive(Debug)]
pub struct StageTracker {
    job_id: String,
    current: Stage,
    started: Instant,
}

impl StageTracker {
    pub fn new(job_id: impl Into<String>) -> Self {
        let job_id = job_id.into();
        info!("[{}] {}", job_id, Stage::Received);
        Self {
            job_id,
            current: Stage::Received,
            started: Instant::now(),
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Move to `to`, which must be the immediate successor of the current
    /// stage.
    pub fn advance(&mut self, to: Stage) -> Result<(), PatternError> {
        if self.current.next() != Some(to) {
            return Err(PatternError::Internal(format!(
                "job {}: illegal stage transition {} → {}",
                self.job_id, self.current, to
            )));
        }
        info!(
            "[{}] {} ({} ms)",
            self.job_id,
            to,
            self.started.elapsed().as_millis()
        );
        self.current = to;
        Ok(())
    }

    /// Enter the terminal `Failed` stage. No-op once terminal.
    pub fn fail(&mut self, err: &PatternError) {
        if self.current.is_terminal() {
            return;
        }
        warn!("[{}] failed after {}: {}", self.job_id, self.current, err);
        self.current = Stage::Failed;
    }
}
