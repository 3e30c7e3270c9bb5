//! Integration tests for the resource pipeline.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use wsmig_migrate::{
    ApiError, ListOp, MigrationError, ObjectType, Pipeline, ResourceKind, Stage, descriptor,
    list_items,
};

#[tokio::test]
async fn test_backup_precedes_create_for_every_kind() {
    for kind in ResourceKind::ALL {
        let log = event_log();
        let source = populated_source(&log);
        let target = MockWorkspace::new(TARGET, &log);
        let backup = RecordingBackup::new(&log);

        Pipeline::new(&source, &target, &backup)
            .run(descriptor(kind))
            .await
            .unwrap();

        let events = events(&log);
        let backup_at = events
            .iter()
            .position(|e| matches!(e, Event::Backup { .. }))
            .unwrap_or_else(|| panic!("no backup for {}", kind));
        let first_post = events
            .iter()
            .position(|e| matches!(e, Event::Post { host, .. } if host == TARGET))
            .unwrap_or_else(|| panic!("no create for {}", kind));

        assert!(backup_at < first_post, "backup after create for {}", kind);
    }
}

#[tokio::test]
async fn test_detail_failures_drop_items() {
    let log = event_log();
    let source = MockWorkspace::new(SOURCE, &log)
        .route(
            "/api/2.0/policies/clusters/list",
            &[],
            json!({"policies": [
                {"policy_id": "P1", "name": "one"},
                {"policy_id": "P2", "name": "two"},
                {"policy_id": "P3", "name": "three"},
            ]}),
        )
        .route(
            "/api/2.0/policies/clusters/get",
            &[("policy_id", "P1")],
            json!({"policy_id": "P1", "name": "one", "definition": "{}"}),
        )
        .fail_get("/api/2.0/policies/clusters/get", &[("policy_id", "P2")])
        .route(
            "/api/2.0/policies/clusters/get",
            &[("policy_id", "P3")],
            json!({"policy_id": "P3", "name": "three", "definition": "{}"}),
        );
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::ClusterPolicies))
        .await
        .unwrap();

    assert_eq!(outcome.listed, 3);
    assert_eq!(outcome.dropped, 1);
    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].stage, Stage::Detail);
    assert_eq!(outcome.errors[0].item, "two");

    let backed_up = events(&log)
        .into_iter()
        .find_map(|e| match e {
            Event::Backup { items, .. } => Some(items),
            _ => None,
        })
        .unwrap();
    assert_eq!(backed_up.len(), 2);
    assert_eq!(posts_to(&log, TARGET).len(), 2);
}

#[tokio::test]
async fn test_builtin_policies_never_created() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::ClusterPolicies))
        .await
        .unwrap();

    assert_eq!(outcome.skipped, 1);
    let posts = posts_to(&log, TARGET);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "/api/2.0/policies/clusters/create");
    assert_eq!(
        posts[0].1,
        json!({"name": "small", "definition": "{}", "description": "", "max_clusters_per_user": 10})
    );
    assert!(
        !gets_to(&log, SOURCE)
            .iter()
            .any(|key| key.contains("policy_id=P1"))
    );
}

#[tokio::test]
async fn test_job_clusters_are_never_attempted() {
    let log = event_log();
    let source = MockWorkspace::new(SOURCE, &log).route(
        "/api/2.0/clusters/list",
        &[],
        json!({"clusters": [
            {"cluster_id": "j1", "cluster_name": "job-1", "cluster_source": "JOB"},
            {"cluster_id": "j2", "cluster_name": "job-2", "cluster_source": "JOB"},
        ]}),
    );
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::Clusters))
        .await
        .unwrap();

    assert_eq!(outcome.skipped, 2);
    assert_eq!(outcome.attempted(), 0);
    assert_eq!(outcome.failed, 0);
    assert!(posts_to(&log, TARGET).is_empty());
    assert_eq!(outcome.backup.unwrap().item_count, 0);
}

#[tokio::test]
async fn test_secret_scopes_get_one_placeholder_per_key() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::SecretScopes))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.follow_ups_succeeded, 2);

    let posts = posts_to(&log, TARGET);
    assert_eq!(posts[0].0, "/api/2.0/secrets/scopes/create");
    let puts: Vec<_> = posts
        .iter()
        .filter(|(path, _)| path == "/api/2.0/secrets/put")
        .map(|(_, body)| body.clone())
        .collect();
    assert_eq!(
        puts,
        vec![
            json!({"scope": "kv", "key": "user", "string_value": "PLACEHOLDER_PLEASE_UPDATE"}),
            json!({"scope": "kv", "key": "password", "string_value": "PLACEHOLDER_PLEASE_UPDATE"}),
        ]
    );

    assert!(
        !gets_to(&log, SOURCE)
            .iter()
            .any(|key| key.starts_with("/api/2.0/secrets/get"))
    );
}

#[tokio::test]
async fn test_secret_listing_failure_still_creates_scope() {
    let log = event_log();
    let source = populated_source(&log).fail_get("/api/2.0/secrets/list", &[("scope", "kv")]);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::SecretScopes))
        .await
        .unwrap();

    assert_eq!(outcome.listed, 1);
    assert_eq!(outcome.dropped, 0);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.follow_ups_succeeded, 0);

    let backed_up = events(&log).into_iter().find_map(|e| match e {
        Event::Backup { items, .. } => Some(items),
        _ => None,
    });
    assert_eq!(backed_up.unwrap()[0]["secrets"], json!([]));

    let paths: Vec<_> = posts_to(&log, TARGET).into_iter().map(|(path, _)| path).collect();
    assert_eq!(paths, vec!["/api/2.0/secrets/scopes/create".to_string()]);
}

#[tokio::test]
async fn test_create_failure_does_not_stop_batch() {
    let log = event_log();
    let source = MockWorkspace::new(SOURCE, &log)
        .route(
            "/api/2.0/clusters/list",
            &[],
            json!({"clusters": [
                {"cluster_id": "a", "cluster_name": "a"},
                {"cluster_id": "b", "cluster_name": "b"},
                {"cluster_id": "c", "cluster_name": "c"},
            ]}),
        )
        .route("/api/2.0/clusters/get", &[("cluster_id", "a")], json!({"cluster_id": "a", "cluster_name": "a"}))
        .route("/api/2.0/clusters/get", &[("cluster_id", "b")], json!({"cluster_id": "b", "cluster_name": "b"}))
        .route("/api/2.0/clusters/get", &[("cluster_id", "c")], json!({"cluster_id": "c", "cluster_name": "c"}));
    let target = MockWorkspace::new(TARGET, &log).fail_posts(|path, body| {
        (body["cluster_name"] == "b")
            .then(|| ApiError::status(path, 400, "INVALID_PARAMETER_VALUE"))
    });
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::Clusters))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.errors[0].stage, Stage::Create);
    assert_eq!(outcome.errors[0].item, "b");

    let names: Vec<_> = posts_to(&log, TARGET)
        .into_iter()
        .map(|(_, body)| body["cluster_name"].clone())
        .collect();
    assert_eq!(names, vec![json!("a"), json!("b"), json!("c")]);
}

#[tokio::test]
async fn test_group_membership_is_replayed() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::Groups))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.follow_ups_succeeded, 2);
    assert_eq!(outcome.follow_ups_failed, 0);

    let posts = posts_to(&log, TARGET);
    let members: Vec<_> = posts
        .iter()
        .filter(|(path, _)| path == "/api/2.0/groups/add-member")
        .map(|(_, body)| body.clone())
        .collect();
    assert_eq!(
        members,
        vec![
            json!({"user_name": "ada@example.com", "parent_name": "admins"}),
            json!({"group_name": "data", "parent_name": "admins"}),
        ]
    );
    assert!(
        posts
            .iter()
            .any(|(path, body)| path == "/api/2.0/preview/scim/v2/Users"
                && body["userName"] == "ada@example.com")
    );
}

#[tokio::test]
async fn test_existing_user_does_not_fail_membership() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log).fail_posts(|path, _| {
        (path == "/api/2.0/preview/scim/v2/Users")
            .then(|| ApiError::status(path, 409, "RESOURCE_ALREADY_EXISTS"))
    });
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::Groups))
        .await
        .unwrap();

    assert_eq!(outcome.follow_ups_succeeded, 2);
    assert!(outcome.is_clean());
}

#[tokio::test]
async fn test_notebooks_carry_exported_content() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::Notebooks))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 2);
    let posts = posts_to(&log, TARGET);
    assert_eq!(
        posts[0].1,
        json!({
            "path": "/readme",
            "content": "cHJpbnQoMSk=",
            "language": "PYTHON",
            "format": "SOURCE",
            "overwrite": false,
        })
    );
    assert_eq!(posts[1].1["language"], json!("SQL"));
}

#[tokio::test]
async fn test_job_payload_is_settings_without_ids() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::Jobs))
        .await
        .unwrap();

    let posts = posts_to(&log, TARGET);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "/api/2.1/jobs/create");
    assert_eq!(
        posts[0].1,
        json!({"name": "nightly", "max_concurrent_runs": 1, "tasks": [{"task_key": "a"}]})
    );
}

#[tokio::test]
async fn test_backup_failure_aborts_before_create() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::failing(&log);

    let err = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::SqlWarehouses))
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Backup { .. }));
    assert!(err.is_pre_mutation());
    assert!(posts_to(&log, TARGET).is_empty());
}

#[tokio::test]
async fn test_unreachable_target_fails_pipeline() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log).unreachable();
    let backup = RecordingBackup::new(&log);

    let err = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::Clusters))
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::Unreachable { .. }));
}

#[tokio::test]
async fn test_unreachable_source_yields_empty_outcome() {
    let log = event_log();
    let source = MockWorkspace::new(SOURCE, &log).unreachable();
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let outcome = Pipeline::new(&source, &target, &backup)
        .run(descriptor(ResourceKind::GitRepos))
        .await
        .unwrap();

    assert_eq!(outcome.listed, 0);
    assert_eq!(outcome.attempted(), 0);
    assert!(posts_to(&log, TARGET).is_empty());
}

#[tokio::test]
async fn test_jobs_listing_follows_pages() {
    let log = event_log();
    let source = MockWorkspace::new(SOURCE, &log)
        .route(
            "/api/2.1/jobs/list",
            &[("limit", "25"), ("offset", "0")],
            json!({"jobs": [{"job_id": 1}, {"job_id": 2}], "has_more": true}),
        )
        .route(
            "/api/2.1/jobs/list",
            &[("limit", "25"), ("offset", "25")],
            json!({"jobs": [{"job_id": 3}], "has_more": false}),
        );

    let jobs = list_items(&source, &descriptor(ResourceKind::Jobs).list)
        .await
        .unwrap();

    let ids: Vec<_> = jobs.iter().map(|j| j["job_id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    assert_eq!(gets_to(&log, SOURCE).len(), 2);
}

#[tokio::test]
async fn test_workspace_walk_is_breadth_first() {
    let log = event_log();
    let source = MockWorkspace::new(SOURCE, &log)
        .route(
            "/api/2.0/workspace/list",
            &[("path", "/")],
            json!({"objects": [
                {"path": "/Users", "object_type": "DIRECTORY"},
                {"path": "/Shared", "object_type": "DIRECTORY"},
            ]}),
        )
        .route(
            "/api/2.0/workspace/list",
            &[("path", "/Users")],
            json!({"objects": [{"path": "/Users/ada", "object_type": "DIRECTORY"}]}),
        )
        .route("/api/2.0/workspace/list", &[("path", "/Users/ada")], json!({}))
        .fail_get("/api/2.0/workspace/list", &[("path", "/Shared")]);

    let folders = list_items(
        &source,
        &ListOp::Walk {
            object_type: ObjectType::Directory,
        },
    )
    .await
    .unwrap();

    let paths: Vec<_> = folders.iter().map(|f| f["path"].clone()).collect();
    assert_eq!(paths, vec![json!("/Users"), json!("/Shared"), json!("/Users/ada")]);
}

#[tokio::test]
async fn test_workspace_walk_fails_when_root_fails() {
    let log = event_log();
    let source = MockWorkspace::new(SOURCE, &log);

    let result = list_items(
        &source,
        &ListOp::Walk {
            object_type: ObjectType::Notebook,
        },
    )
    .await;

    assert_eq!(result.unwrap_err().status_code(), Some(404));
}
