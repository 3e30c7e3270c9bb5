//! `wsmig kinds` command - List resource kinds in migration order.

use wsmig_migrate::DESCRIPTORS;

use crate::error::CliResult;
use crate::output;

/// Run the kinds command
pub async fn run() -> CliResult<()> {
    output::header("Resource Kinds");

    for (i, descriptor) in DESCRIPTORS.iter().enumerate() {
        output::numbered_item(
            i + 1,
            &format!("{:<18} {}", descriptor.kind.as_str(), descriptor.kind.display_name()),
        );
    }

    output::newline();
    output::dim("Kinds always run in this order; pass slugs to `wsmig migrate` to select some.");

    Ok(())
}
