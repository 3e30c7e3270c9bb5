//! The resource migration pipeline.
//!
//! ```text
//! ┌──────────┐     ┌──────────────┐     ┌──────────┐     ┌────────────────┐
//! │ List src │────▶│ Skip/Detail  │────▶│  Backup  │────▶│ Create on tgt  │
//! └──────────┘     └──────────────┘     └──────────┘     └────────────────┘
//!   soft-fail        drop item on          abort on         count per item,
//!   to empty         detail failure        failure          never short-circuit
//! ```
//!
//! One [`Pipeline`] run migrates one resource kind as described by its
//! [`ResourceDescriptor`]. The source workspace is only ever read.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::backup::{BackupRecord, BackupSink};
use crate::client::WorkspaceApi;
use crate::error::{ApiResult, MigrateResult, MigrationError};
use crate::resource::{
    DetailOp, FollowUp, ListOp, ObjectType, ResourceDescriptor, ResourceKind, scalar_string,
};

/// Stage an item error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching detail from the source; the item was dropped.
    Detail,
    /// Creating on the target; the item counts as failed.
    Create,
    /// Post-create follow-up; the item itself succeeded.
    FollowUp,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detail => write!(f, "detail"),
            Self::Create => write!(f, "create"),
            Self::FollowUp => write!(f, "follow-up"),
        }
    }
}

/// An error for a single item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    /// Item name.
    pub item: String,
    /// Stage the error happened in.
    pub stage: Stage,
    /// Error message.
    pub message: String,
}

/// Result of migrating one resource kind.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationOutcome {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Items listed on the source.
    pub listed: usize,
    /// Items excluded by the descriptor's skip rule.
    pub skipped: usize,
    /// Items dropped because their detail could not be fetched.
    pub dropped: usize,
    /// Items created on the target.
    pub succeeded: usize,
    /// Items whose create call failed.
    pub failed: usize,
    /// Follow-up calls that succeeded (memberships, placeholder secrets).
    pub follow_ups_succeeded: usize,
    /// Follow-up calls that failed.
    pub follow_ups_failed: usize,
    /// Per-item errors.
    pub errors: Vec<ItemError>,
    /// Backup written before any create call.
    pub backup: Option<BackupRecord>,
}

impl MigrationOutcome {
    /// Create an empty outcome.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            listed: 0,
            skipped: 0,
            dropped: 0,
            succeeded: 0,
            failed: 0,
            follow_ups_succeeded: 0,
            follow_ups_failed: 0,
            errors: Vec::new(),
            backup: None,
        }
    }

    /// Number of create calls issued.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Check if nothing failed or was dropped.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.dropped == 0 && self.follow_ups_failed == 0
    }

    /// Get a summary of the outcome.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} succeeded", self.succeeded),
            format!("{} failed", self.failed),
        ];

        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.dropped > 0 {
            parts.push(format!("{} dropped", self.dropped));
        }
        if self.follow_ups_succeeded + self.follow_ups_failed > 0 {
            parts.push(format!(
                "{} follow-ups ({} failed)",
                self.follow_ups_succeeded + self.follow_ups_failed,
                self.follow_ups_failed
            ));
        }

        parts.join(", ")
    }

    fn record(&mut self, item: String, stage: Stage, message: String) {
        self.errors.push(ItemError {
            item,
            stage,
            message,
        });
    }
}

/// List every item for a list operation.
///
/// Fails only when the top-level call fails; sub-directories that cannot be
/// listed during a walk are logged and skipped.
pub async fn list_items(api: &dyn WorkspaceApi, op: &ListOp) -> ApiResult<Vec<Value>> {
    match *op {
        ListOp::Get { path, items_key } => {
            let response = api.get(path, &[]).await?;
            Ok(take_array(response, items_key))
        }
        ListOp::Paged {
            path,
            items_key,
            page_size,
        } => {
            let mut items = Vec::new();
            let mut offset = 0u64;
            loop {
                let query = [
                    ("limit", page_size.to_string()),
                    ("offset", offset.to_string()),
                ];
                let response = api.get(path, &query).await?;
                let has_more = response
                    .get("has_more")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let page = take_array(response, items_key);
                let page_len = page.len();
                items.extend(page);

                if !has_more || page_len == 0 {
                    break;
                }
                offset += u64::from(page_size);
            }
            Ok(items)
        }
        ListOp::Walk { object_type } => walk_workspace(api, object_type).await,
    }
}

async fn walk_workspace(api: &dyn WorkspaceApi, object_type: ObjectType) -> ApiResult<Vec<Value>> {
    const LIST_PATH: &str = "/api/2.0/workspace/list";

    let mut found = Vec::new();
    let mut pending = VecDeque::from([String::from("/")]);
    let mut root = true;

    while let Some(dir) = pending.pop_front() {
        let response = match api.get(LIST_PATH, &[("path", dir.clone())]).await {
            Ok(response) => response,
            Err(e) if root => return Err(e),
            Err(e) => {
                warn!(path = %dir, error = %e, "Failed to list workspace path");
                continue;
            }
        };
        root = false;

        for object in take_array(response, "objects") {
            let kind = object.get("object_type").and_then(Value::as_str);
            if kind == Some(ObjectType::Directory.as_str()) {
                if let Some(path) = object.get("path").and_then(Value::as_str) {
                    pending.push_back(path.to_string());
                }
            }
            if kind == Some(object_type.as_str()) {
                found.push(object);
            }
        }
    }

    Ok(found)
}

fn take_array(mut response: Value, key: &str) -> Vec<Value> {
    match response.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Fetch the full detail of one item.
pub async fn fetch_detail(
    api: &dyn WorkspaceApi,
    descriptor: &ResourceDescriptor,
    op: &DetailOp,
    item: Value,
) -> MigrateResult<Value> {
    let id = descriptor.item_id(&item).ok_or_else(|| {
        MigrationError::other(format!("item has no '{}' field", descriptor.id_field))
    })?;

    match *op {
        DetailOp::Query { path, param } => Ok(api.get(path, &[(param, id)]).await?),
        DetailOp::ById { path } => Ok(api.get(&format!("{}/{}", path, id), &[]).await?),
        DetailOp::Children {
            path,
            param,
            items_key,
            attach_as,
        } => {
            // A failed child listing leaves the parent migratable without children.
            let children = match api.get(path, &[(param, id.clone())]).await {
                Ok(response) => take_array(response, items_key),
                Err(e) => {
                    warn!(
                        item = %id,
                        children = attach_as,
                        error = %e,
                        "Failed to list children, continuing without them"
                    );
                    Vec::new()
                }
            };
            Ok(attach(item, attach_as, Value::Array(children)))
        }
        DetailOp::Export { path, format } => {
            let mut response = api
                .get(path, &[("path", id), ("format", format.to_string())])
                .await?;
            let content = response
                .get_mut("content")
                .map(Value::take)
                .unwrap_or(Value::Null);
            Ok(attach(item, "content", content))
        }
    }
}

fn attach(mut item: Value, key: &str, value: Value) -> Value {
    if let Value::Object(map) = &mut item {
        map.insert(key.to_string(), value);
    }
    item
}

/// Migrates one resource kind from a source to a target workspace.
pub struct Pipeline<'a> {
    source: &'a dyn WorkspaceApi,
    target: &'a dyn WorkspaceApi,
    backup: &'a dyn BackupSink,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline.
    pub fn new(
        source: &'a dyn WorkspaceApi,
        target: &'a dyn WorkspaceApi,
        backup: &'a dyn BackupSink,
    ) -> Self {
        Self {
            source,
            target,
            backup,
        }
    }

    /// Run the pipeline for a descriptor.
    ///
    /// Partial failure is reported in the outcome. An error is returned only
    /// when the backup cannot be written (nothing was created) or when every
    /// create call failed to reach the target.
    #[tracing::instrument(skip_all, fields(kind = %descriptor.kind))]
    pub async fn run(&self, descriptor: &ResourceDescriptor) -> MigrateResult<MigrationOutcome> {
        let mut outcome = MigrationOutcome::new(descriptor.kind);

        info!(source = self.source.host(), target = self.target.host(), "Starting migration");
        if let Some(notice) = descriptor.notice {
            warn!("{}", notice);
        }

        let listed = match list_items(self.source, &descriptor.list).await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "Failed to list items on source");
                Vec::new()
            }
        };
        outcome.listed = listed.len();
        info!(count = listed.len(), "Found items");

        let items = self.collect(descriptor, listed, &mut outcome).await;

        let record = self.backup.write(descriptor.kind, &items).await?;
        outcome.backup = Some(record);

        let mut transport_failures = 0usize;
        let mut last_transport_error = String::new();

        for item in &items {
            let name = descriptor.item_name(item);
            let payload = descriptor.payload.build(item);
            debug!(item = %name, "Creating");

            match self.target.post(descriptor.create, &payload).await {
                Ok(_) => {
                    info!(item = %name, "Created");
                    outcome.succeeded += 1;
                    if let Some(follow_up) = descriptor.follow_up {
                        self.follow_up(descriptor, &follow_up, item, &name, &mut outcome)
                            .await;
                    }
                }
                Err(e) => {
                    error!(item = %name, error = %e, "Failed to create");
                    if e.is_transport() {
                        transport_failures += 1;
                        last_transport_error = e.to_string();
                    }
                    outcome.failed += 1;
                    outcome.record(name, Stage::Create, e.to_string());
                }
            }
        }

        if outcome.attempted() > 0 && transport_failures == outcome.attempted() {
            return Err(MigrationError::unreachable(
                self.target.host(),
                last_transport_error,
            ));
        }

        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            skipped = outcome.skipped,
            dropped = outcome.dropped,
            "Migration completed"
        );

        Ok(outcome)
    }

    async fn collect(
        &self,
        descriptor: &ResourceDescriptor,
        listed: Vec<Value>,
        outcome: &mut MigrationOutcome,
    ) -> Vec<Value> {
        let mut items = Vec::with_capacity(listed.len());

        for entry in listed {
            let item = descriptor.normalize(entry);

            if let Some(rule) = &descriptor.skip {
                if rule.applies(&item) {
                    info!(item = %descriptor.item_name(&item), reason = rule.reason, "Skipping");
                    outcome.skipped += 1;
                    continue;
                }
            }

            let Some(op) = &descriptor.detail else {
                items.push(item);
                continue;
            };

            let name = descriptor.item_name(&item);
            match fetch_detail(self.source, descriptor, op, item).await {
                Ok(detail) => items.push(detail),
                Err(e) => {
                    error!(item = %name, error = %e, "Failed to fetch detail, dropping item");
                    outcome.dropped += 1;
                    outcome.record(name, Stage::Detail, e.to_string());
                }
            }
        }

        items
    }

    async fn follow_up(
        &self,
        descriptor: &ResourceDescriptor,
        follow_up: &FollowUp,
        item: &Value,
        name: &str,
        outcome: &mut MigrationOutcome,
    ) {
        let Some(id) = descriptor.item_id(item) else {
            return;
        };

        match *follow_up {
            FollowUp::GroupMembers => self.replay_members(&id, outcome).await,
            FollowUp::PlaceholderSecrets { placeholder } => {
                self.put_placeholders(&id, item, placeholder, name, outcome)
                    .await
            }
        }
    }

    async fn replay_members(&self, group: &str, outcome: &mut MigrationOutcome) {
        let members = match self
            .source
            .get("/api/2.0/groups/list-members", &[("group_name", group.to_string())])
            .await
        {
            Ok(response) => take_array(response, "members"),
            Err(e) => {
                error!(group, error = %e, "Failed to list group members");
                outcome.follow_ups_failed += 1;
                outcome.record(group.to_string(), Stage::FollowUp, e.to_string());
                return;
            }
        };

        for member in members {
            let (field, member_name) = match (
                member.get("user_name").and_then(scalar_string),
                member.get("group_name").and_then(scalar_string),
            ) {
                (Some(user), _) => ("user_name", user),
                (None, Some(nested)) => ("group_name", nested),
                (None, None) => continue,
            };

            if field == "user_name" {
                let user = json!({
                    "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                    "userName": member_name,
                    "active": true,
                });
                // Usually fails with 409 because the user already exists.
                if let Err(e) = self.target.post("/api/2.0/preview/scim/v2/Users", &user).await {
                    debug!(user = %member_name, error = %e, "User not provisioned");
                }
            }

            let body = json!({ field: member_name, "parent_name": group });
            match self.target.post("/api/2.0/groups/add-member", &body).await {
                Ok(_) => {
                    info!(group, member = %member_name, "Added member");
                    outcome.follow_ups_succeeded += 1;
                }
                Err(e) => {
                    error!(group, member = %member_name, error = %e, "Failed to add member");
                    outcome.follow_ups_failed += 1;
                    outcome.record(
                        format!("{}/{}", group, member_name),
                        Stage::FollowUp,
                        e.to_string(),
                    );
                }
            }
        }
    }

    async fn put_placeholders(
        &self,
        scope: &str,
        item: &Value,
        placeholder: &str,
        name: &str,
        outcome: &mut MigrationOutcome,
    ) {
        let keys = item
            .get("secrets")
            .and_then(Value::as_array)
            .map(|secrets| {
                secrets
                    .iter()
                    .filter_map(|s| s.get("key").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        for key in keys {
            let body = json!({
                "scope": scope,
                "key": key,
                "string_value": placeholder,
            });
            match self.target.post("/api/2.0/secrets/put", &body).await {
                Ok(_) => {
                    warn!(scope, key = %key, "Created secret placeholder - PLEASE UPDATE VALUE");
                    outcome.follow_ups_succeeded += 1;
                }
                Err(e) => {
                    error!(scope, key = %key, error = %e, "Failed to create secret placeholder");
                    outcome.follow_ups_failed += 1;
                    outcome.record(format!("{}/{}", name, key), Stage::FollowUp, e.to_string());
                }
            }
        }
    }
}
