//! `wsmig validate` command - Pre-flight checks for both workspaces.

use std::path::Path;

use wsmig_migrate::{EndpointReport, Validator};

use crate::commands::connect;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::{self, success};

/// Run the validate command
pub async fn run(config_path: &Path) -> CliResult<()> {
    output::header("Migration Validation");

    output::step(1, 3, "Loading configuration...");
    let config = Config::load(config_path)?;
    let source = connect(&config.source)?;
    let target = connect(&config.target)?;

    output::step(2, 3, "Checking workspaces...");
    let report = Validator::new(&source, &target)
        .backup_dir(&config.migration.backup_dir)
        .run()
        .await;

    output::step(3, 3, "Collecting results...");
    output::newline();

    output::section("Local environment");
    for check in &report.local {
        output::check(check.passed(), &describe(&check.label, check.error.as_deref()));
    }
    output::newline();

    for endpoint in &report.endpoints {
        print_endpoint(endpoint);
    }

    if report.passed() {
        success("All validation checks passed! Ready for migration.");
        Ok(())
    } else {
        Err(CliError::Validation(
            "Some validation checks failed. Fix the issues above before migrating.".to_string(),
        ))
    }
}

fn print_endpoint(endpoint: &EndpointReport) {
    output::section(&format!("{} workspace ({})", capitalize(endpoint.role), endpoint.host));

    let connection = &endpoint.connection;
    output::check(
        connection.passed(),
        &describe(&connection.label, connection.error.as_deref()),
    );
    for check in &endpoint.permissions {
        output::check(check.passed(), &describe(&check.label, check.error.as_deref()));
    }

    if !endpoint.counts.is_empty() {
        output::newline();
        for count in &endpoint.counts {
            let value = count
                .count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unavailable".to_string());
            output::kv(count.kind.display_name(), &value);
        }
    }
    output::newline();
}

fn describe(label: &str, error: Option<&str>) -> String {
    match error {
        Some(e) => format!("{}: {}", label, e),
        None => label.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
