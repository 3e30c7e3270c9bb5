//! The descriptor table: one entry per resource kind, in run order.

use crate::resource::{
    DetailOp, FieldRule, FollowUp, ListOp, Literal, ObjectType, PayloadPolicy, ResourceDescriptor,
    ResourceKind, SkipRule,
};

/// Literal value written for every migrated secret key.
pub const SECRET_PLACEHOLDER: &str = "PLACEHOLDER_PLEASE_UPDATE";

/// Steps the operator must take by hand after a full run.
pub const POST_MIGRATION_STEPS: &[&str] = &[
    "Update secret values in secret scopes (placeholders were created)",
    "Review and update cluster IDs in jobs",
    "Verify notebook paths in jobs are correct",
    "Test SQL warehouses and start them if needed",
    "Test all-purpose clusters and start them if needed",
    "Verify Git repo credentials are configured",
    "Run test jobs to ensure everything works",
];

const GROUP_FIELDS: &[FieldRule] = &[FieldRule::keep("group_name")];

const POLICY_FIELDS: &[FieldRule] = &[
    FieldRule::keep("name"),
    FieldRule::keep("definition"),
    FieldRule::or("description", Literal::Str("")),
    FieldRule::or("max_clusters_per_user", Literal::Int(10)),
    FieldRule::keep("policy_family_definition_overrides"),
];

const WAREHOUSE_FIELDS: &[FieldRule] = &[
    FieldRule::keep("name"),
    FieldRule::keep("cluster_size"),
    FieldRule::or("min_num_clusters", Literal::Int(1)),
    FieldRule::or("max_num_clusters", Literal::Int(1)),
    FieldRule::or("auto_stop_mins", Literal::Int(120)),
    FieldRule::or("tags", Literal::EmptyObject),
    FieldRule::or("spot_instance_policy", Literal::Str("COST_OPTIMIZED")),
    FieldRule::or("enable_photon", Literal::Bool(true)),
    FieldRule::or("enable_serverless_compute", Literal::Bool(false)),
    FieldRule::or("warehouse_type", Literal::Str("PRO")),
    FieldRule::or("channel", Literal::EmptyObject),
];

const SCOPE_FIELDS: &[FieldRule] = &[
    FieldRule::renamed("scope", "name"),
    FieldRule::or("initial_manage_principal", Literal::Str("users")),
    FieldRule::or("backend_type", Literal::Str("DATABRICKS")),
];

const FOLDER_FIELDS: &[FieldRule] = &[FieldRule::keep("path")];

// Runtime state (cluster_id, state, start_time, ...) is dropped by omission.
const CLUSTER_FIELDS: &[FieldRule] = &[
    FieldRule::keep("cluster_name"),
    FieldRule::keep("spark_version"),
    FieldRule::keep("node_type_id"),
    FieldRule::keep("driver_node_type_id"),
    FieldRule::keep("autoscale"),
    FieldRule::keep("num_workers"),
    FieldRule::or("autotermination_minutes", Literal::Int(120)),
    FieldRule::or("spark_conf", Literal::EmptyObject),
    FieldRule::or("spark_env_vars", Literal::EmptyObject),
    FieldRule::or("custom_tags", Literal::EmptyObject),
    FieldRule::keep("cluster_log_conf"),
    FieldRule::or("init_scripts", Literal::EmptyArray),
    FieldRule::or("ssh_public_keys", Literal::EmptyArray),
    FieldRule::or("enable_elastic_disk", Literal::Bool(true)),
    FieldRule::or("enable_local_disk_encryption", Literal::Bool(false)),
    FieldRule::or("runtime_engine", Literal::Str("STANDARD")),
    FieldRule::keep("policy_id"),
    FieldRule::keep("instance_pool_id"),
];

const NOTEBOOK_FIELDS: &[FieldRule] = &[
    FieldRule::keep("path"),
    FieldRule::keep("content"),
    FieldRule::or("language", Literal::Str("PYTHON")),
    FieldRule::or("format", Literal::Str("SOURCE")),
    FieldRule::or("overwrite", Literal::Bool(false)),
];

const REPO_FIELDS: &[FieldRule] = &[
    FieldRule::keep("url"),
    FieldRule::keep("provider"),
    FieldRule::keep("path"),
    FieldRule::keep("branch"),
    FieldRule::keep("tag"),
];

/// Descriptors for every kind, in dependency order.
pub static DESCRIPTORS: [ResourceDescriptor; 9] = [
    ResourceDescriptor {
        kind: ResourceKind::Groups,
        list: ListOp::Get {
            path: "/api/2.0/groups/list",
            items_key: "group_names",
        },
        detail: None,
        create: "/api/2.0/groups/create",
        id_field: "group_name",
        name_field: "group_name",
        skip: None,
        payload: PayloadPolicy {
            root: None,
            allow: Some(GROUP_FIELDS),
            strip: &[],
        },
        follow_up: Some(FollowUp::GroupMembers),
        notice: None,
    },
    ResourceDescriptor {
        kind: ResourceKind::ClusterPolicies,
        list: ListOp::Get {
            path: "/api/2.0/policies/clusters/list",
            items_key: "policies",
        },
        detail: Some(DetailOp::Query {
            path: "/api/2.0/policies/clusters/get",
            param: "policy_id",
        }),
        create: "/api/2.0/policies/clusters/create",
        id_field: "policy_id",
        name_field: "name",
        skip: Some(SkipRule {
            field: "is_default",
            value: Literal::Bool(true),
            reason: "built-in policy",
        }),
        payload: PayloadPolicy {
            root: None,
            allow: Some(POLICY_FIELDS),
            strip: &[],
        },
        follow_up: None,
        notice: None,
    },
    ResourceDescriptor {
        kind: ResourceKind::SqlWarehouses,
        list: ListOp::Get {
            path: "/api/2.0/sql/warehouses",
            items_key: "warehouses",
        },
        detail: Some(DetailOp::ById {
            path: "/api/2.0/sql/warehouses",
        }),
        create: "/api/2.0/sql/warehouses",
        id_field: "id",
        name_field: "name",
        skip: None,
        payload: PayloadPolicy {
            root: None,
            allow: Some(WAREHOUSE_FIELDS),
            strip: &[],
        },
        follow_up: None,
        notice: None,
    },
    ResourceDescriptor {
        kind: ResourceKind::SecretScopes,
        list: ListOp::Get {
            path: "/api/2.0/secrets/scopes/list",
            items_key: "scopes",
        },
        detail: Some(DetailOp::Children {
            path: "/api/2.0/secrets/list",
            param: "scope",
            items_key: "secrets",
            attach_as: "secrets",
        }),
        create: "/api/2.0/secrets/scopes/create",
        id_field: "name",
        name_field: "name",
        skip: None,
        payload: PayloadPolicy {
            root: None,
            allow: Some(SCOPE_FIELDS),
            strip: &[],
        },
        follow_up: Some(FollowUp::PlaceholderSecrets {
            placeholder: SECRET_PLACEHOLDER,
        }),
        notice: Some("Secret values cannot be read via the API - placeholders will be created"),
    },
    ResourceDescriptor {
        kind: ResourceKind::WorkspaceFolders,
        list: ListOp::Walk {
            object_type: ObjectType::Directory,
        },
        detail: None,
        create: "/api/2.0/workspace/mkdirs",
        id_field: "path",
        name_field: "path",
        skip: None,
        payload: PayloadPolicy {
            root: None,
            allow: Some(FOLDER_FIELDS),
            strip: &[],
        },
        follow_up: None,
        notice: None,
    },
    ResourceDescriptor {
        kind: ResourceKind::Clusters,
        list: ListOp::Get {
            path: "/api/2.0/clusters/list",
            items_key: "clusters",
        },
        detail: Some(DetailOp::Query {
            path: "/api/2.0/clusters/get",
            param: "cluster_id",
        }),
        create: "/api/2.0/clusters/create",
        id_field: "cluster_id",
        name_field: "cluster_name",
        skip: Some(SkipRule {
            field: "cluster_source",
            value: Literal::Str("JOB"),
            reason: "job cluster (migrated with its job)",
        }),
        payload: PayloadPolicy {
            root: None,
            allow: Some(CLUSTER_FIELDS),
            strip: &[],
        },
        follow_up: None,
        notice: Some("Clusters are created in TERMINATED state - start them manually as needed"),
    },
    ResourceDescriptor {
        kind: ResourceKind::Notebooks,
        list: ListOp::Walk {
            object_type: ObjectType::Notebook,
        },
        detail: Some(DetailOp::Export {
            path: "/api/2.0/workspace/export",
            format: "SOURCE",
        }),
        create: "/api/2.0/workspace/import",
        id_field: "path",
        name_field: "path",
        skip: None,
        payload: PayloadPolicy {
            root: None,
            allow: Some(NOTEBOOK_FIELDS),
            strip: &[],
        },
        follow_up: None,
        notice: None,
    },
    ResourceDescriptor {
        kind: ResourceKind::GitRepos,
        list: ListOp::Get {
            path: "/api/2.0/repos",
            items_key: "repos",
        },
        detail: Some(DetailOp::ById {
            path: "/api/2.0/repos",
        }),
        create: "/api/2.0/repos",
        id_field: "id",
        name_field: "path",
        skip: None,
        payload: PayloadPolicy {
            root: None,
            allow: Some(REPO_FIELDS),
            strip: &[],
        },
        follow_up: None,
        notice: Some("Git credentials are not migrated - configure them on the target"),
    },
    ResourceDescriptor {
        kind: ResourceKind::Jobs,
        list: ListOp::Paged {
            path: "/api/2.1/jobs/list",
            items_key: "jobs",
            page_size: 25,
        },
        detail: Some(DetailOp::Query {
            path: "/api/2.1/jobs/get",
            param: "job_id",
        }),
        create: "/api/2.1/jobs/create",
        id_field: "job_id",
        name_field: "settings.name",
        skip: None,
        payload: PayloadPolicy {
            root: Some("settings"),
            allow: None,
            strip: &["creator_user_name", "created_time", "job_id"],
        },
        follow_up: None,
        notice: Some(
            "Cluster IDs, notebook paths and file paths inside jobs are not rewritten - review migrated jobs",
        ),
    },
];

/// Descriptor for a kind.
pub fn descriptor(kind: ResourceKind) -> &'static ResourceDescriptor {
    // The table is ordered like `ResourceKind::ALL`.
    &DESCRIPTORS[kind as usize]
}

/// Descriptors for the selected kinds, in run order. An empty selection
/// means every kind.
pub fn in_run_order(selected: &[ResourceKind]) -> Vec<&'static ResourceDescriptor> {
    DESCRIPTORS
        .iter()
        .filter(|d| selected.is_empty() || selected.contains(&d.kind))
        .collect()
}
