//! Resource descriptors.
//!
//! A [`ResourceDescriptor`] is the static description of how one resource
//! kind is listed, detailed, reshaped and recreated. The pipeline interprets
//! descriptors; it has no per-kind control flow of its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The nine migratable resource kinds, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Groups, their users and memberships.
    Groups,
    /// Cluster policies.
    ClusterPolicies,
    /// SQL warehouses.
    SqlWarehouses,
    /// Secret scopes and secret keys.
    SecretScopes,
    /// Workspace directory tree.
    WorkspaceFolders,
    /// All-purpose clusters.
    Clusters,
    /// Notebooks.
    Notebooks,
    /// Git repo links.
    GitRepos,
    /// Jobs.
    Jobs,
}

impl ResourceKind {
    /// Every kind, in dependency order.
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Groups,
        ResourceKind::ClusterPolicies,
        ResourceKind::SqlWarehouses,
        ResourceKind::SecretScopes,
        ResourceKind::WorkspaceFolders,
        ResourceKind::Clusters,
        ResourceKind::Notebooks,
        ResourceKind::GitRepos,
        ResourceKind::Jobs,
    ];

    /// Stable slug used in backup file names and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::ClusterPolicies => "cluster_policies",
            Self::SqlWarehouses => "sql_warehouses",
            Self::SecretScopes => "secret_scopes",
            Self::WorkspaceFolders => "workspace_folders",
            Self::Clusters => "clusters",
            Self::Notebooks => "notebooks",
            Self::GitRepos => "git_repos",
            Self::Jobs => "jobs",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Groups => "Users & Groups",
            Self::ClusterPolicies => "Cluster Policies",
            Self::SqlWarehouses => "SQL Warehouses",
            Self::SecretScopes => "Secret Scopes",
            Self::WorkspaceFolders => "Workspace Folders",
            Self::Clusters => "Clusters",
            Self::Notebooks => "Notebooks",
            Self::GitRepos => "Git Repos",
            Self::Jobs => "Jobs",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown resource kind '{}'", s))
    }
}

/// Workspace object types collected by a tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// `DIRECTORY` entries.
    Directory,
    /// `NOTEBOOK` entries.
    Notebook,
}

impl ObjectType {
    /// Wire name of the object type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "DIRECTORY",
            Self::Notebook => "NOTEBOOK",
        }
    }
}

/// How items are listed on the source.
#[derive(Debug, Clone, Copy)]
pub enum ListOp {
    /// One GET; items are the array under `items_key`.
    Get {
        /// API path.
        path: &'static str,
        /// Response key holding the items.
        items_key: &'static str,
    },
    /// Offset paging with `limit`/`offset` until `has_more` is false.
    Paged {
        /// API path.
        path: &'static str,
        /// Response key holding the items.
        items_key: &'static str,
        /// Page size sent as `limit`.
        page_size: u32,
    },
    /// Recursive walk of the workspace tree from `/`.
    Walk {
        /// Object type to collect.
        object_type: ObjectType,
    },
}

/// How an item's full detail is fetched.
#[derive(Debug, Clone, Copy)]
pub enum DetailOp {
    /// GET `path?param=<id>`; the response replaces the item.
    Query {
        /// API path.
        path: &'static str,
        /// Query parameter carrying the identifier.
        param: &'static str,
    },
    /// GET `path/<id>`; the response replaces the item.
    ById {
        /// API path prefix.
        path: &'static str,
    },
    /// GET `path?param=<id>`; the array under `items_key` is attached to the
    /// item as `attach_as`. A failed listing attaches an empty array.
    Children {
        /// API path.
        path: &'static str,
        /// Query parameter carrying the identifier.
        param: &'static str,
        /// Response key holding the children.
        items_key: &'static str,
        /// Field the children are stored under.
        attach_as: &'static str,
    },
    /// GET `path?path=<id>&format=<format>`; the response `content` is merged
    /// into the item.
    Export {
        /// API path.
        path: &'static str,
        /// Export format.
        format: &'static str,
    },
}

/// A constant JSON value usable in `'static` tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// String.
    Str(&'static str),
    /// `{}`.
    EmptyObject,
    /// `[]`.
    EmptyArray,
}

impl Literal {
    /// Convert to a JSON value.
    pub fn to_value(self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(b),
            Self::Int(i) => Value::from(i),
            Self::Str(s) => Value::String(s.to_string()),
            Self::EmptyObject => Value::Object(Map::new()),
            Self::EmptyArray => Value::Array(Vec::new()),
        }
    }

    /// Check if a JSON value equals this literal.
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool(b), Value::Bool(v)) => b == *v,
            (Self::Int(i), Value::Number(n)) => n.as_i64() == Some(i),
            (Self::Str(s), Value::String(v)) => s == v,
            (Self::EmptyObject, Value::Object(m)) => m.is_empty(),
            (Self::EmptyArray, Value::Array(a)) => a.is_empty(),
            _ => false,
        }
    }
}

/// Items whose `field` equals `value` are not migrated.
#[derive(Debug, Clone, Copy)]
pub struct SkipRule {
    /// Field to test.
    pub field: &'static str,
    /// Value that marks the item as skipped.
    pub value: Literal,
    /// Reason, for the log.
    pub reason: &'static str,
}

impl SkipRule {
    /// Check if an item is skipped.
    pub fn applies(&self, item: &Value) -> bool {
        lookup(item, self.field).is_some_and(|v| self.value.matches(v))
    }
}

/// One field of a create payload.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Field name in the payload.
    pub name: &'static str,
    /// Source field (dotted path) when it differs from `name`.
    pub from: Option<&'static str>,
    /// Value used when the source field is missing, null or empty.
    pub default: Option<Literal>,
}

impl FieldRule {
    /// Copy a field as-is; omitted when missing.
    pub const fn keep(name: &'static str) -> Self {
        Self {
            name,
            from: None,
            default: None,
        }
    }

    /// Copy a field, falling back to a default.
    pub const fn or(name: &'static str, default: Literal) -> Self {
        Self {
            name,
            from: None,
            default: Some(default),
        }
    }

    /// Copy a field from a differently named source field.
    pub const fn renamed(name: &'static str, from: &'static str) -> Self {
        Self {
            name,
            from: Some(from),
            default: None,
        }
    }

    /// Resolve this field against a source object.
    pub fn resolve(&self, source: &Value) -> Option<Value> {
        lookup(source, self.from.unwrap_or(self.name))
            .filter(|v| !is_blank(v))
            .cloned()
            .or_else(|| self.default.map(Literal::to_value))
    }
}

/// How a fetched item is turned into a create payload.
#[derive(Debug, Clone, Copy)]
pub struct PayloadPolicy {
    /// Object inside the item the payload is built from.
    pub root: Option<&'static str>,
    /// Allowed fields; `None` keeps every field.
    pub allow: Option<&'static [FieldRule]>,
    /// Fields removed after the allow-list is applied.
    pub strip: &'static [&'static str],
}

impl PayloadPolicy {
    /// Build the create payload for an item.
    pub fn build(&self, item: &Value) -> Value {
        let source = match self.root {
            Some(root) => lookup(item, root).cloned().unwrap_or(Value::Null),
            None => item.clone(),
        };

        let mut payload = match self.allow {
            Some(rules) => {
                let mut map = Map::new();
                for rule in rules {
                    if let Some(value) = rule.resolve(&source) {
                        map.insert(rule.name.to_string(), value);
                    }
                }
                map
            }
            None => match source {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        };

        for field in self.strip {
            payload.remove(*field);
        }

        Value::Object(payload)
    }
}

/// Per-item step run after a successful create.
#[derive(Debug, Clone, Copy)]
pub enum FollowUp {
    /// Replay the group's membership on the target.
    GroupMembers,
    /// Put a placeholder secret for every key attached under `secrets`.
    PlaceholderSecrets {
        /// Literal value written instead of the real secret.
        placeholder: &'static str,
    },
}

/// Static description of one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Source list operation.
    pub list: ListOp,
    /// Optional detail fetch.
    pub detail: Option<DetailOp>,
    /// Target create path (POST).
    pub create: &'static str,
    /// Field identifying an item on the source.
    pub id_field: &'static str,
    /// Field (dotted path) naming an item in logs.
    pub name_field: &'static str,
    /// Items never migrated.
    pub skip: Option<SkipRule>,
    /// Create payload policy.
    pub payload: PayloadPolicy,
    /// Post-create step.
    pub follow_up: Option<FollowUp>,
    /// Warning logged when the pipeline starts.
    pub notice: Option<&'static str>,
}

impl ResourceDescriptor {
    /// Identifier of an item, rendered for a path segment or query parameter.
    pub fn item_id(&self, item: &Value) -> Option<String> {
        lookup(item, self.id_field).and_then(scalar_string)
    }

    /// Display name of an item.
    pub fn item_name(&self, item: &Value) -> String {
        lookup(item, self.name_field)
            .and_then(scalar_string)
            .or_else(|| self.item_id(item))
            .unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Turn a list entry into an object. Bare strings (group names) become
    /// `{ <id_field>: <string> }`.
    pub fn normalize(&self, entry: Value) -> Value {
        match entry {
            Value::String(s) => {
                let mut map = Map::new();
                map.insert(self.id_field.to_string(), Value::String(s));
                Value::Object(map)
            }
            other => other,
        }
    }
}

/// Look up a dotted path (`settings.name`) in a JSON value.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

/// Render a string or number as a plain string.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
