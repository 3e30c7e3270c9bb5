//! CLI command implementations.

pub mod export;
pub mod kinds;
pub mod migrate;
pub mod validate;
pub mod version;

use wsmig_migrate::{Endpoint, HttpWorkspaceClient};

use crate::error::CliResult;

/// Build an API client for a configured endpoint
pub(crate) fn connect(endpoint: &Endpoint) -> CliResult<HttpWorkspaceClient> {
    Ok(HttpWorkspaceClient::new(endpoint)?)
}
