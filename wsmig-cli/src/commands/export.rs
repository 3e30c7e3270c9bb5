//! `wsmig export` command - Export a workspace to Terraform variable files.

use std::path::Path;

use wsmig_migrate::TerraformExporter;

use crate::cli::ExportArgs;
use crate::commands::connect;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::{self, success, warn};

/// Run the export command
pub async fn run(config_path: &Path, args: ExportArgs) -> CliResult<()> {
    output::header(&format!(
        "Exporting from {} workspace to Terraform configs",
        args.workspace
    ));

    let config = Config::load(config_path)?;
    let endpoint = config.endpoint(args.workspace);
    let client = connect(endpoint)?;

    output::kv("Workspace", &endpoint.host);
    output::kv("Output", &args.output.display().to_string());
    output::newline();

    let report = TerraformExporter::new(&client, &args.output).export().await?;

    for file in &report.files {
        output::list_item(&format!(
            "{} {} -> {}",
            file.count,
            file.kind.display_name(),
            file.path.display()
        ));
    }
    output::newline();

    if !report.warnings.is_empty() {
        output::section("Manual review needed");
        for warning in &report.warnings {
            warn(warning);
        }
        output::newline();
    }

    success(&format!(
        "Export complete: {} objects in {} files",
        report.total(),
        report.files.len()
    ));

    output::newline();
    output::section("Next steps");
    output::numbered_item(1, "Review generated .auto.tfvars.json files");
    output::numbered_item(2, "Create main.tf to use the modules");
    output::numbered_item(3, "Run 'terraform init'");
    output::numbered_item(4, "Run 'terraform plan' to preview");
    output::numbered_item(5, "Run 'terraform apply' to create resources");

    Ok(())
}
