//! # wsmig-migrate
//!
//! Migration engine for wsmig.
//!
//! This crate provides functionality for:
//! - Declarative resource descriptors for nine workspace resource kinds
//! - A generic list, detail, backup and create pipeline driven by descriptors
//! - Pre-mutation JSON backups for manual recovery
//! - A runner that sequences pipelines in dependency order
//! - Read-only pre-flight validation of both workspaces
//! - Export of a workspace to Terraform variable files
//!
//! ## Architecture
//!
//! Each resource kind is described by a static [`ResourceDescriptor`]. The
//! [`Pipeline`] interprets a descriptor against a source and a target
//! [`WorkspaceApi`]; the source is only ever read.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ Descriptors  │────▶│ Runner         │────▶│ Pipeline    │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                              │                     │
//!                              ▼                     ▼
//!                      ┌────────────────┐     ┌─────────────┐
//!                      │ Run Report     │     │ Backup File │
//!                      └────────────────┘     └─────────────┘
//!                                                    │
//!                                                    ▼
//!                                            ┌─────────────┐
//!                                            │ Create Tgt  │
//!                                            └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsmig_migrate::{Endpoint, FileBackupWriter, HttpWorkspaceClient, MigrationRunner};
//!
//! async fn migrate() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = HttpWorkspaceClient::new(&Endpoint::new("https://src.example.com", "dapi-src"))?;
//!     let target = HttpWorkspaceClient::new(&Endpoint::new("https://tgt.example.com", "dapi-tgt"))?;
//!     let backup = FileBackupWriter::new("./backups");
//!
//!     let runner = MigrationRunner::new(&source, &target, &backup);
//!     let report = runner.run(wsmig_migrate::abort_on_failure).await;
//!
//!     for outcome in report.outcomes() {
//!         println!("{}: {}", outcome.kind, outcome.summary());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Backups
//!
//! Every pipeline writes its collected items before the first create call:
//!
//! ```text
//! backups/
//! ├── backup_groups_20240109_140507.json
//! ├── backup_cluster_policies_20240109_140509.json
//! └── backup_jobs_20240109_140533.json
//! ```

pub mod backup;
pub mod client;
pub mod descriptors;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod resource;
pub mod runner;
pub mod validator;

// Re-exports
pub use backup::{BackupRecord, BackupSink, FileBackupWriter};
pub use client::{Endpoint, HttpWorkspaceClient, WorkspaceApi};
pub use descriptors::{DESCRIPTORS, POST_MIGRATION_STEPS, SECRET_PLACEHOLDER, descriptor, in_run_order};
pub use error::{ApiError, ApiResult, MigrateResult, MigrationError};
pub use export::{ExportReport, ExportedFile, TerraformExporter};
pub use pipeline::{ItemError, MigrationOutcome, Pipeline, Stage, fetch_detail, list_items};
pub use resource::{
    DetailOp, FieldRule, FollowUp, ListOp, Literal, ObjectType, PayloadPolicy, ResourceDescriptor,
    ResourceKind, SkipRule,
};
pub use runner::{Decision, MigrationRunner, PipelineStatus, RunEntry, RunReport, abort_on_failure};
pub use validator::{CheckResult, EndpointReport, KindCount, ValidationReport, Validator};
