//! Terraform variable export.
//!
//! Lists one workspace and writes `*.auto.tfvars.json` files that Terraform
//! modules can consume to recreate the resources elsewhere. Nothing is
//! written to the workspace.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::client::WorkspaceApi;
use crate::descriptors;
use crate::error::{MigrateResult, MigrationError};
use crate::pipeline::list_items;
use crate::resource::{FieldRule, Literal, ResourceKind, lookup};

/// How one resource kind is rendered into a variables file.
struct ExportTarget {
    kind: ResourceKind,
    file: &'static str,
    root: &'static str,
    key_prefix: &'static str,
    /// Extra root keys written as empty objects.
    empty_roots: &'static [&'static str],
    fields: &'static [FieldRule],
    warning: Option<&'static str>,
}

const EXPORT_TARGETS: &[ExportTarget] = &[
    ExportTarget {
        kind: ResourceKind::Groups,
        file: "users_groups.auto.tfvars.json",
        root: "groups",
        key_prefix: "group",
        empty_roots: &["users", "group_members"],
        fields: &[FieldRule::renamed("display_name", "group_name")],
        warning: None,
    },
    ExportTarget {
        kind: ResourceKind::Clusters,
        file: "clusters.auto.tfvars.json",
        root: "clusters",
        key_prefix: "cluster",
        empty_roots: &[],
        fields: &[
            FieldRule::keep("cluster_name"),
            FieldRule::keep("spark_version"),
            FieldRule::keep("node_type_id"),
            FieldRule::or("num_workers", Literal::Int(1)),
            FieldRule::or("autotermination_minutes", Literal::Int(120)),
            FieldRule::keep("spark_conf"),
        ],
        warning: None,
    },
    ExportTarget {
        kind: ResourceKind::SecretScopes,
        file: "secrets.auto.tfvars.json",
        root: "secret_scopes",
        key_prefix: "scope",
        empty_roots: &[],
        fields: &[FieldRule::keep("name")],
        warning: Some("Secret values cannot be exported - must be set manually"),
    },
    ExportTarget {
        kind: ResourceKind::SqlWarehouses,
        file: "sql_warehouses.auto.tfvars.json",
        root: "sql_warehouses",
        key_prefix: "warehouse",
        empty_roots: &[],
        fields: &[
            FieldRule::keep("name"),
            FieldRule::keep("cluster_size"),
            FieldRule::or("max_num_clusters", Literal::Int(1)),
            FieldRule::or("enable_photon", Literal::Bool(true)),
        ],
        warning: None,
    },
    ExportTarget {
        kind: ResourceKind::GitRepos,
        file: "repos.auto.tfvars.json",
        root: "repos",
        key_prefix: "repo",
        empty_roots: &[],
        fields: &[
            FieldRule::keep("url"),
            FieldRule::renamed("git_provider", "provider"),
            FieldRule::keep("path"),
            FieldRule::keep("branch"),
        ],
        warning: Some("Git credentials will need to be re-authenticated"),
    },
    ExportTarget {
        kind: ResourceKind::Jobs,
        file: "jobs.auto.tfvars.json",
        root: "jobs",
        key_prefix: "job",
        empty_roots: &[],
        fields: &[
            FieldRule::renamed("name", "settings.name"),
            FieldRule {
                name: "max_concurrent_runs",
                from: Some("settings.max_concurrent_runs"),
                default: Some(Literal::Int(1)),
            },
        ],
        warning: Some("Jobs require manual review for task configurations and cluster references"),
    },
];

const NOTEBOOK_NOTE: &str = "Notebooks are not exported; store notebook content in source files and \
                             reference it from databricks_notebook resources";

/// One written variables file.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    /// Resource kind.
    pub kind: ResourceKind,
    /// File path.
    pub path: PathBuf,
    /// Number of exported objects.
    pub count: usize,
}

/// Result of an export.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    /// Written files, in export order.
    pub files: Vec<ExportedFile>,
    /// Items that need manual review.
    pub warnings: Vec<String>,
}

impl ExportReport {
    /// Total exported objects.
    pub fn total(&self) -> usize {
        self.files.iter().map(|f| f.count).sum()
    }
}

/// Exports one workspace to Terraform variable files.
pub struct TerraformExporter<'a> {
    api: &'a dyn WorkspaceApi,
    output: PathBuf,
}

impl<'a> TerraformExporter<'a> {
    /// Create an exporter writing into `output`.
    pub fn new(api: &'a dyn WorkspaceApi, output: impl Into<PathBuf>) -> Self {
        Self {
            api,
            output: output.into(),
        }
    }

    /// Export every supported kind. Any list failure aborts the export.
    pub async fn export(&self) -> MigrateResult<ExportReport> {
        tokio::fs::create_dir_all(&self.output).await?;
        info!(host = self.api.host(), output = %self.output.display(), "Exporting workspace");

        let mut report = ExportReport::default();

        for target in EXPORT_TARGETS {
            let descriptor = descriptors::descriptor(target.kind);
            let items = list_items(self.api, &descriptor.list).await.map_err(|e| {
                MigrationError::export(format!("failed to list {}: {}", target.kind, e))
            })?;

            let mut entries = Map::new();
            for item in items {
                let item = descriptor.normalize(item);
                if descriptor.skip.is_some_and(|rule| rule.applies(&item)) {
                    continue;
                }

                let index = entries.len();
                let mut entry = Map::new();
                for rule in target.fields {
                    if let Some(value) = rule.resolve(&item) {
                        entry.insert(rule.name.to_string(), value);
                    }
                }

                if target.kind == ResourceKind::Jobs {
                    let name = entry
                        .entry("name")
                        .or_insert_with(|| Value::String(format!("Job {}", index)))
                        .clone();
                    if lookup(&item, "settings.tasks").is_some() {
                        let warning = format!(
                            "Job '{}' has multi-task workflow - manual review needed",
                            name.as_str().unwrap_or_default()
                        );
                        warn!("{}", warning);
                        report.warnings.push(warning);
                    }
                }

                entries.insert(format!("{}_{}", target.key_prefix, index), Value::Object(entry));
            }

            let count = entries.len();
            let mut document = Map::new();
            document.insert(target.root.to_string(), Value::Object(entries));
            for root in target.empty_roots {
                document.insert(root.to_string(), json!({}));
            }

            let path = self.output.join(target.file);
            let content = serde_json::to_string_pretty(&Value::Object(document))?;
            tokio::fs::write(&path, content).await?;
            info!(kind = %target.kind, count, path = %path.display(), "Exported");

            if let Some(warning) = target.warning {
                warn!("{}", warning);
                report.warnings.push(warning.to_string());
            }

            report.files.push(ExportedFile {
                kind: target.kind,
                path,
                count,
            });
        }

        info!("{}", NOTEBOOK_NOTE);
        report.warnings.push(NOTEBOOK_NOTE.to_string());

        Ok(report)
    }
}
