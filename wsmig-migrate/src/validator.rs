//! Read-only pre-flight checks.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::client::WorkspaceApi;
use crate::descriptors;
use crate::pipeline::list_items;
use crate::resource::ResourceKind;

/// Cheap call used to decide whether an endpoint answers at all.
const CONNECTIVITY_PATH: &str = "/api/2.0/clusters/list";

/// List calls used as a proxy for permission coverage.
const PERMISSION_CHECKS: &[(&str, &str, Option<(&str, &str)>)] = &[
    ("Workspace", "/api/2.0/workspace/list", Some(("path", "/"))),
    ("Clusters", "/api/2.0/clusters/list", None),
    ("Jobs", "/api/2.1/jobs/list", None),
    ("Groups", "/api/2.0/groups/list", None),
    ("Secret Scopes", "/api/2.0/secrets/scopes/list", None),
];

/// Kinds counted on each endpoint.
const COUNTED_KINDS: &[ResourceKind] = &[
    ResourceKind::Groups,
    ResourceKind::Clusters,
    ResourceKind::Jobs,
    ResourceKind::SecretScopes,
    ResourceKind::SqlWarehouses,
    ResourceKind::GitRepos,
];

/// Outcome of one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// What was checked.
    pub label: String,
    /// Error, if the check failed.
    pub error: Option<String>,
}

impl CheckResult {
    fn ok(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            error: None,
        }
    }

    fn failed(label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            error: Some(error.into()),
        }
    }

    /// Check if this check passed.
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Number of objects of one kind; `None` when it could not be retrieved.
#[derive(Debug, Clone, Serialize)]
pub struct KindCount {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Object count.
    pub count: Option<usize>,
}

/// Checks for one workspace.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointReport {
    /// `source` or `target`.
    pub role: &'static str,
    /// Workspace host.
    pub host: String,
    /// Connectivity check.
    pub connection: CheckResult,
    /// Permission checks; empty when the endpoint is unreachable.
    pub permissions: Vec<CheckResult>,
    /// Object counts; empty when the endpoint is unreachable.
    pub counts: Vec<KindCount>,
}

impl EndpointReport {
    /// Check if the endpoint is reachable and every permission check passed.
    pub fn passed(&self) -> bool {
        self.connection.passed() && self.permissions.iter().all(CheckResult::passed)
    }
}

/// Result of a validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Local environment checks.
    pub local: Vec<CheckResult>,
    /// Source then target.
    pub endpoints: Vec<EndpointReport>,
}

impl ValidationReport {
    /// Single pass/fail verdict. Object counts never fail validation.
    pub fn passed(&self) -> bool {
        self.local.iter().all(CheckResult::passed)
            && self.endpoints.iter().all(EndpointReport::passed)
    }
}

/// Pre-flight validator. Only issues GET calls.
pub struct Validator<'a> {
    source: &'a dyn WorkspaceApi,
    target: &'a dyn WorkspaceApi,
    backup_dir: Option<PathBuf>,
}

impl<'a> Validator<'a> {
    /// Create a validator for two workspaces.
    pub fn new(source: &'a dyn WorkspaceApi, target: &'a dyn WorkspaceApi) -> Self {
        Self {
            source,
            target,
            backup_dir: None,
        }
    }

    /// Also check that backups can be written to a directory.
    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    /// Run every check.
    pub async fn run(&self) -> ValidationReport {
        let mut local = Vec::new();
        if let Some(dir) = &self.backup_dir {
            local.push(check_writable(dir).await);
        }

        let endpoints = vec![
            check_endpoint("source", self.source).await,
            check_endpoint("target", self.target).await,
        ];

        let report = ValidationReport { local, endpoints };
        if report.passed() {
            info!("All validation checks passed");
        } else {
            error!("Some validation checks failed");
        }
        report
    }
}

async fn check_endpoint(role: &'static str, api: &dyn WorkspaceApi) -> EndpointReport {
    let connection = match api.get(CONNECTIVITY_PATH, &[]).await {
        Ok(_) => {
            info!(role, host = api.host(), "Connected to workspace");
            CheckResult::ok(format!("Connect to {} workspace", role))
        }
        Err(e) => {
            error!(role, host = api.host(), error = %e, "Failed to connect to workspace");
            CheckResult::failed(format!("Connect to {} workspace", role), e.to_string())
        }
    };

    let mut report = EndpointReport {
        role,
        host: api.host().to_string(),
        connection,
        permissions: Vec::new(),
        counts: Vec::new(),
    };

    if !report.connection.passed() {
        return report;
    }

    for (label, path, param) in PERMISSION_CHECKS {
        let query: Vec<(&str, String)> = param
            .iter()
            .map(|(k, v)| (*k, (*v).to_string()))
            .collect();
        let result = match api.get(path, &query).await {
            Ok(_) => CheckResult::ok(format!("{} access", label)),
            Err(e) => {
                error!(role, check = label, error = %e, "Permission check failed");
                CheckResult::failed(format!("{} access", label), e.to_string())
            }
        };
        report.permissions.push(result);
    }

    for kind in COUNTED_KINDS {
        let descriptor = descriptors::descriptor(*kind);
        let count = match list_items(api, &descriptor.list).await {
            Ok(items) => Some(
                items
                    .iter()
                    .filter(|item| !descriptor.skip.is_some_and(|rule| rule.applies(item)))
                    .count(),
            ),
            Err(e) => {
                warn!(role, kind = %kind, error = %e, "Unable to count objects");
                None
            }
        };
        report.counts.push(KindCount { kind: *kind, count });
    }

    report
}

async fn check_writable(dir: &Path) -> CheckResult {
    let label = format!("Backup directory {} is writable", dir.display());

    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return CheckResult::failed(label, "not a directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return CheckResult::failed(label, "directory does not exist");
        }
        Err(e) => return CheckResult::failed(label, e.to_string()),
    }

    let scratch = dir.join(".wsmig_write_check");
    let result = async {
        tokio::fs::write(&scratch, b"").await?;
        tokio::fs::remove_file(&scratch).await
    }
    .await;

    match result {
        Ok(()) => CheckResult::ok(label),
        Err(e) => CheckResult::failed(label, e.to_string()),
    }
}
