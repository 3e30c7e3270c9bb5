//! Runs the pipelines for every selected kind in dependency order.

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::backup::BackupSink;
use crate::client::WorkspaceApi;
use crate::descriptors;
use crate::error::MigrationError;
use crate::pipeline::{MigrationOutcome, Pipeline};
use crate::resource::ResourceKind;

/// What to do after a pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the next pipeline.
    Continue,
    /// Stop; remaining pipelines are not run.
    Abort,
}

/// Decision callback that always aborts. Used when nobody can be asked.
pub fn abort_on_failure(_kind: ResourceKind, _error: &MigrationError) -> Decision {
    Decision::Abort
}

/// Status of one pipeline in a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineStatus {
    /// The pipeline ran; partial failures are in the outcome.
    Completed(MigrationOutcome),
    /// The pipeline returned an error.
    Failed {
        /// Error message.
        message: String,
    },
    /// The run was aborted before this pipeline.
    NotRun,
}

/// One pipeline's entry in a run report.
#[derive(Debug, Clone, Serialize)]
pub struct RunEntry {
    /// Resource kind.
    pub kind: ResourceKind,
    /// What happened.
    pub status: PipelineStatus,
}

/// Result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// When the run started.
    pub started_at: DateTime<Local>,
    /// When the run finished.
    pub finished_at: DateTime<Local>,
    /// One entry per selected kind, in run order.
    pub entries: Vec<RunEntry>,
}

impl RunReport {
    /// Entries whose pipeline returned an error.
    pub fn failed(&self) -> impl Iterator<Item = &RunEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, PipelineStatus::Failed { .. }))
    }

    /// Outcomes of completed pipelines.
    pub fn outcomes(&self) -> impl Iterator<Item = &MigrationOutcome> {
        self.entries.iter().filter_map(|e| match &e.status {
            PipelineStatus::Completed(outcome) => Some(outcome),
            _ => None,
        })
    }

    /// Check if the run stopped before every pipeline ran.
    pub fn aborted(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.status, PipelineStatus::NotRun))
    }

    /// Check if every pipeline completed.
    pub fn all_completed(&self) -> bool {
        self.entries
            .iter()
            .all(|e| matches!(e.status, PipelineStatus::Completed(_)))
    }

    /// Total wall-clock duration.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Sequences the resource pipelines.
pub struct MigrationRunner<'a> {
    pipeline: Pipeline<'a>,
    kinds: Vec<ResourceKind>,
}

impl<'a> MigrationRunner<'a> {
    /// Create a runner for every kind.
    pub fn new(
        source: &'a dyn WorkspaceApi,
        target: &'a dyn WorkspaceApi,
        backup: &'a dyn BackupSink,
    ) -> Self {
        Self {
            pipeline: Pipeline::new(source, target, backup),
            kinds: Vec::new(),
        }
    }

    /// Restrict the run to some kinds. Run order is unaffected.
    pub fn only(mut self, kinds: &[ResourceKind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    /// Kinds this runner will run, in order.
    pub fn planned(&self) -> Vec<ResourceKind> {
        descriptors::in_run_order(&self.kinds)
            .into_iter()
            .map(|d| d.kind)
            .collect()
    }

    /// Run every selected pipeline. `on_failure` decides whether to go on
    /// after a pipeline returns an error.
    pub async fn run<F>(&self, mut on_failure: F) -> RunReport
    where
        F: FnMut(ResourceKind, &MigrationError) -> Decision,
    {
        let started_at = Local::now();
        let planned = descriptors::in_run_order(&self.kinds);
        info!(pipelines = planned.len(), "Starting workspace migration");

        let mut entries = Vec::with_capacity(planned.len());
        let mut stopped = false;

        for descriptor in planned {
            if stopped {
                entries.push(RunEntry {
                    kind: descriptor.kind,
                    status: PipelineStatus::NotRun,
                });
                continue;
            }

            info!(kind = %descriptor.kind, "Starting migration: {}", descriptor.kind.display_name());
            let status = match self.pipeline.run(descriptor).await {
                Ok(outcome) => {
                    info!(kind = %descriptor.kind, summary = %outcome.summary(), "Completed migration");
                    PipelineStatus::Completed(outcome)
                }
                Err(e) => {
                    error!(kind = %descriptor.kind, error = %e, "Failed migration");
                    if on_failure(descriptor.kind, &e) == Decision::Abort {
                        warn!("Migration process stopped");
                        stopped = true;
                    }
                    PipelineStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };

            entries.push(RunEntry {
                kind: descriptor.kind,
                status,
            });
        }

        RunReport {
            started_at,
            finished_at: Local::now(),
            entries,
        }
    }
}
