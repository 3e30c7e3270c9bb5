//! Integration tests for the migration runner.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use wsmig_migrate::{
    Decision, MigrationRunner, PipelineStatus, ResourceKind, abort_on_failure,
};

#[tokio::test]
async fn test_full_run_never_writes_to_source() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let report = MigrationRunner::new(&source, &target, &backup)
        .run(abort_on_failure)
        .await;

    assert!(report.all_completed());
    assert_eq!(report.entries.len(), 9);
    assert!(posts_to(&log, SOURCE).is_empty());
    assert!(!posts_to(&log, TARGET).is_empty());
}

#[tokio::test]
async fn test_runs_in_dependency_order() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    MigrationRunner::new(&source, &target, &backup)
        .run(abort_on_failure)
        .await;

    let backed_up: Vec<_> = events(&log)
        .into_iter()
        .filter_map(|e| match e {
            Event::Backup { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(backed_up, ResourceKind::ALL.to_vec());
}

#[tokio::test]
async fn test_selection_runs_only_selected_kinds() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log);
    let backup = RecordingBackup::new(&log);

    let runner = MigrationRunner::new(&source, &target, &backup)
        .only(&[ResourceKind::Jobs, ResourceKind::SecretScopes]);
    assert_eq!(
        runner.planned(),
        vec![ResourceKind::SecretScopes, ResourceKind::Jobs]
    );

    let report = runner.run(abort_on_failure).await;
    let kinds: Vec<_> = report.entries.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ResourceKind::SecretScopes, ResourceKind::Jobs]);
}

#[tokio::test]
async fn test_default_decision_stops_remaining_pipelines() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log).unreachable();
    let backup = RecordingBackup::new(&log);

    let report = MigrationRunner::new(&source, &target, &backup)
        .run(abort_on_failure)
        .await;

    assert!(matches!(
        report.entries[0].status,
        PipelineStatus::Failed { .. }
    ));
    assert!(
        report.entries[1..]
            .iter()
            .all(|e| matches!(e.status, PipelineStatus::NotRun))
    );
    assert!(report.aborted());

    let backups = events(&log)
        .into_iter()
        .filter(|e| matches!(e, Event::Backup { .. }))
        .count();
    assert_eq!(backups, 1);
}

#[tokio::test]
async fn test_continue_decision_runs_everything() {
    let log = event_log();
    let source = populated_source(&log);
    let target = MockWorkspace::new(TARGET, &log).unreachable();
    let backup = RecordingBackup::new(&log);

    let mut asked = Vec::new();
    let report = MigrationRunner::new(&source, &target, &backup)
        .run(|kind, _err| {
            asked.push(kind);
            Decision::Continue
        })
        .await;

    assert!(!report.aborted());
    assert_eq!(report.entries.len(), 9);
    assert_eq!(asked, ResourceKind::ALL.to_vec());
    assert_eq!(report.failed().count(), 9);
}
