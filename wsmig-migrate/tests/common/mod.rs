//! Shared test fixtures: an in-memory workspace and a recording backup sink.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde_json::{Value, json};
use wsmig_migrate::{
    ApiError, ApiResult, BackupRecord, BackupSink, MigrateResult, MigrationError, ResourceKind,
    WorkspaceApi,
};

/// Something that happened during a test run.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Get { host: String, key: String },
    Post { host: String, path: String, body: Value },
    Backup { kind: ResourceKind, items: Vec<Value> },
}

/// Event log shared between mocks so ordering can be asserted.
pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

/// POSTs recorded for a host, as `(path, body)`.
pub fn posts_to(log: &EventLog, host: &str) -> Vec<(String, Value)> {
    events(log)
        .into_iter()
        .filter_map(|e| match e {
            Event::Post { host: h, path, body } if h == host => Some((path, body)),
            _ => None,
        })
        .collect()
}

/// GET keys recorded for a host.
pub fn gets_to(log: &EventLog, host: &str) -> Vec<String> {
    events(log)
        .into_iter()
        .filter_map(|e| match e {
            Event::Get { host: h, key } if h == host => Some(key),
            _ => None,
        })
        .collect()
}

type PostFailure = Box<dyn Fn(&str, &Value) -> Option<ApiError> + Send + Sync>;

/// In-memory workspace. GETs are answered from routes keyed by path and
/// sorted query; unknown routes answer 404. POSTs succeed unless a failure
/// rule says otherwise.
pub struct MockWorkspace {
    host: String,
    routes: HashMap<String, Value>,
    failing: HashSet<String>,
    post_failure: Option<PostFailure>,
    log: EventLog,
}

impl MockWorkspace {
    pub fn new(host: &str, log: &EventLog) -> Self {
        Self {
            host: host.to_string(),
            routes: HashMap::new(),
            failing: HashSet::new(),
            post_failure: None,
            log: log.clone(),
        }
    }

    /// Serve the same routes under another host.
    pub fn rename(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Answer a GET with a JSON document.
    pub fn route(mut self, path: &str, query: &[(&str, &str)], response: Value) -> Self {
        self.routes.insert(route_key(path, query), response);
        self
    }

    /// Make a GET fail with HTTP 500.
    pub fn fail_get(mut self, path: &str, query: &[(&str, &str)]) -> Self {
        self.failing.insert(route_key(path, query));
        self
    }

    /// Decide per POST whether it fails.
    pub fn fail_posts<F>(mut self, rule: F) -> Self
    where
        F: Fn(&str, &Value) -> Option<ApiError> + Send + Sync + 'static,
    {
        self.post_failure = Some(Box::new(rule));
        self
    }

    /// Every call fails at the transport level.
    pub fn unreachable(self) -> Self {
        let host = self.host.clone();
        let mut mock = self.fail_posts(move |path, _| {
            Some(ApiError::transport(format!("{}{}", host, path), "connection refused"))
        });
        mock.failing.insert("*".to_string());
        mock
    }
}

fn route_key(path: &str, query: &[(&str, &str)]) -> String {
    let mut pairs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    pairs.sort();
    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, pairs.join("&"))
    }
}

#[async_trait::async_trait]
impl WorkspaceApi for MockWorkspace {
    fn host(&self) -> &str {
        &self.host
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let key = route_key(path, &query);
        self.log.lock().unwrap().push(Event::Get {
            host: self.host.clone(),
            key: key.clone(),
        });

        let url = format!("{}{}", self.host, path);
        if self.failing.contains("*") {
            return Err(ApiError::transport(url, "connection refused"));
        }
        if self.failing.contains(&key) {
            return Err(ApiError::status(url, 500, "internal error"));
        }
        self.routes
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::status(url, 404, "not found"))
    }

    async fn post(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.log.lock().unwrap().push(Event::Post {
            host: self.host.clone(),
            path: path.to_string(),
            body: body.clone(),
        });

        match self.post_failure.as_ref().and_then(|rule| rule(path, body)) {
            Some(err) => Err(err),
            None => Ok(json!({})),
        }
    }
}

/// Backup sink that records into the shared log.
pub struct RecordingBackup {
    log: EventLog,
    fail: bool,
}

impl RecordingBackup {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: false,
        }
    }

    pub fn failing(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl BackupSink for RecordingBackup {
    async fn write(&self, kind: ResourceKind, items: &[Value]) -> MigrateResult<BackupRecord> {
        if self.fail {
            return Err(MigrationError::backup(kind.as_str(), "disk full"));
        }
        self.log.lock().unwrap().push(Event::Backup {
            kind,
            items: items.to_vec(),
        });
        Ok(BackupRecord {
            kind,
            written_at: Local::now(),
            path: PathBuf::from(format!("backup_{}.json", kind.as_str())),
            item_count: items.len(),
        })
    }
}

pub const SOURCE: &str = "https://source.example.com";
pub const TARGET: &str = "https://target.example.com";

/// A source workspace holding a little of every kind.
pub fn populated_source(log: &EventLog) -> MockWorkspace {
    MockWorkspace::new(SOURCE, log)
        .route("/api/2.0/groups/list", &[], json!({"group_names": ["admins", "data"]}))
        .route(
            "/api/2.0/groups/list-members",
            &[("group_name", "admins")],
            json!({"members": [{"user_name": "ada@example.com"}, {"group_name": "data"}]}),
        )
        .route("/api/2.0/groups/list-members", &[("group_name", "data")], json!({}))
        .route(
            "/api/2.0/policies/clusters/list",
            &[],
            json!({"policies": [
                {"policy_id": "P1", "name": "Personal Compute", "is_default": true},
                {"policy_id": "P2", "name": "small"},
            ]}),
        )
        .route(
            "/api/2.0/policies/clusters/get",
            &[("policy_id", "P2")],
            json!({"policy_id": "P2", "name": "small", "definition": "{}"}),
        )
        .route("/api/2.0/sql/warehouses", &[], json!({"warehouses": [{"id": "w1", "name": "bi"}]}))
        .route(
            "/api/2.0/sql/warehouses/w1",
            &[],
            json!({"id": "w1", "name": "bi", "cluster_size": "Small", "state": "RUNNING"}),
        )
        .route("/api/2.0/secrets/scopes/list", &[], json!({"scopes": [{"name": "kv", "backend_type": "DATABRICKS"}]}))
        .route(
            "/api/2.0/secrets/list",
            &[("scope", "kv")],
            json!({"secrets": [{"key": "user"}, {"key": "password"}]}),
        )
        .route(
            "/api/2.0/workspace/list",
            &[("path", "/")],
            json!({"objects": [
                {"path": "/Shared", "object_type": "DIRECTORY"},
                {"path": "/readme", "object_type": "NOTEBOOK", "language": "PYTHON"},
            ]}),
        )
        .route(
            "/api/2.0/workspace/list",
            &[("path", "/Shared")],
            json!({"objects": [{"path": "/Shared/etl", "object_type": "NOTEBOOK", "language": "SQL"}]}),
        )
        .route(
            "/api/2.0/workspace/export",
            &[("format", "SOURCE"), ("path", "/readme")],
            json!({"content": "cHJpbnQoMSk="}),
        )
        .route(
            "/api/2.0/workspace/export",
            &[("format", "SOURCE"), ("path", "/Shared/etl")],
            json!({"content": "U0VMRUNUIDE="}),
        )
        .route(
            "/api/2.0/clusters/list",
            &[],
            json!({"clusters": [
                {"cluster_id": "c1", "cluster_name": "shared", "cluster_source": "UI"},
                {"cluster_id": "c2", "cluster_name": "job-123", "cluster_source": "JOB"},
            ]}),
        )
        .route(
            "/api/2.0/clusters/get",
            &[("cluster_id", "c1")],
            json!({"cluster_id": "c1", "cluster_name": "shared", "spark_version": "14.3.x-scala2.12",
                   "node_type_id": "Standard_DS3_v2", "num_workers": 2, "state": "RUNNING"}),
        )
        .route(
            "/api/2.0/repos",
            &[],
            json!({"repos": [{"id": 7, "path": "/Repos/team/app"}]}),
        )
        .route(
            "/api/2.0/repos/7",
            &[],
            json!({"id": 7, "path": "/Repos/team/app", "url": "https://github.com/org/app",
                   "provider": "gitHub", "branch": "main"}),
        )
        .route(
            "/api/2.1/jobs/list",
            &[("limit", "25"), ("offset", "0")],
            json!({"jobs": [{"job_id": 11, "settings": {"name": "nightly"}}], "has_more": false}),
        )
        .route(
            "/api/2.1/jobs/get",
            &[("job_id", "11")],
            json!({"job_id": 11, "creator_user_name": "ada@example.com",
                   "settings": {"name": "nightly", "max_concurrent_runs": 1, "tasks": [{"task_key": "a"}]}}),
        )
}
