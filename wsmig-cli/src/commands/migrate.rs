//! `wsmig migrate` command - Migrate resources between workspaces.

use std::path::Path;

use wsmig_migrate::{
    Decision, FileBackupWriter, MigrationRunner, POST_MIGRATION_STEPS, PipelineStatus, RunReport,
};

use crate::cli::MigrateArgs;
use crate::commands::connect;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::{self, success, warn};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Run the migrate command
pub async fn run(config_path: &Path, args: MigrateArgs) -> CliResult<()> {
    output::header("Workspace Migration");

    let config = Config::load(config_path)?;
    let source = connect(&config.source)?;
    let target = connect(&config.target)?;
    let backup = FileBackupWriter::new(&config.migration.backup_dir);

    output::kv("Source", &config.source.host);
    output::kv("Target", &config.target.host);
    output::kv("Backups", &backup.dir().display().to_string());
    output::newline();

    let runner = MigrationRunner::new(&source, &target, &backup).only(&args.kinds);
    let planned = runner.planned();

    output::section("Migration order");
    for (i, kind) in planned.iter().enumerate() {
        output::numbered_item(i + 1, kind.display_name());
    }
    output::newline();

    warn("This will create resources in the target workspace.");
    warn("Resources with the same name may fail to create or be duplicated.");
    warn("A backup of each resource kind is written before anything is created.");
    output::newline();

    if !args.yes && !output::confirm_exact("Do you want to proceed with the migration?") {
        output::info("Migration cancelled");
        return Ok(());
    }

    let interactive = !args.no_prompt;
    let report = runner
        .run(|kind, err| {
            output::newline();
            output::error(&format!("{} migration failed: {}", kind.display_name(), err));
            if interactive && output::confirm("Continue with remaining migrations?") {
                Decision::Continue
            } else {
                Decision::Abort
            }
        })
        .await;

    print_summary(&report);

    if report.all_completed() {
        success("All migrations completed!");
        output::newline();
        output::section("Post-migration steps");
        for (i, step) in POST_MIGRATION_STEPS.iter().enumerate() {
            output::numbered_item(i + 1, step);
        }
        Ok(())
    } else {
        let failed = report.failed().count();
        let not_run = report
            .entries
            .iter()
            .filter(|e| matches!(e.status, PipelineStatus::NotRun))
            .count();
        Err(CliError::Migration(format!(
            "{} resource kind(s) failed, {} not run",
            failed, not_run
        )))
    }
}

fn print_summary(report: &RunReport) {
    output::header("Migration Summary");

    for entry in &report.entries {
        let name = entry.kind.display_name();
        match &entry.status {
            PipelineStatus::Completed(outcome) => {
                output::check(
                    outcome.is_clean(),
                    &format!("{}: {}", name, outcome.summary()),
                );
                for error in &outcome.errors {
                    output::dim(&format!(
                        "      {} ({}): {}",
                        error.item, error.stage, error.message
                    ));
                }
            }
            PipelineStatus::Failed { message } => {
                output::check(false, &format!("{}: {}", name, message));
            }
            PipelineStatus::NotRun => {
                output::dim(&format!("  - {}: not run", name));
            }
        }
    }

    output::newline();
    output::kv("Started", &report.started_at.format(TIME_FORMAT).to_string());
    output::kv("Finished", &report.finished_at.format(TIME_FORMAT).to_string());
    output::kv(
        "Duration",
        &format!("{:.1}s", report.duration().num_milliseconds() as f64 / 1000.0),
    );
    output::newline();
}
