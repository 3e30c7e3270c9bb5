//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use wsmig_migrate::Endpoint;

use crate::cli::WorkspaceRole;
use crate::error::{CliError, CliResult};

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default backup directory
pub const BACKUP_DIR: &str = ".";

/// wsmig configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace resources are read from
    pub source: Endpoint,

    /// Workspace resources are created in
    pub target: Endpoint,

    /// Migration settings
    #[serde(default)]
    pub migration: MigrationSettings,
}

/// Migration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSettings {
    /// Directory backups are written to
    pub backup_dir: PathBuf,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from(BACKUP_DIR),
        }
    }
}

/// Config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

impl Config {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content, ConfigFormat::from_path(path))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration content
    pub fn parse(content: &str, format: ConfigFormat) -> CliResult<Self> {
        let config = match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };
        Ok(config)
    }

    /// Check both endpoints
    pub fn validate(&self) -> CliResult<()> {
        validate_endpoint("source", &self.source)?;
        validate_endpoint("target", &self.target)?;
        Ok(())
    }

    /// Endpoint for a workspace role
    pub fn endpoint(&self, role: WorkspaceRole) -> &Endpoint {
        match role {
            WorkspaceRole::Source => &self.source,
            WorkspaceRole::Target => &self.target,
        }
    }
}

fn validate_endpoint(role: &str, endpoint: &Endpoint) -> CliResult<()> {
    let url = url::Url::parse(&endpoint.host).map_err(|e| {
        CliError::Config(format!("{}.host '{}' is not a URL: {}", role, endpoint.host, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CliError::Config(format!(
            "{}.host must use http or https, got '{}'",
            role,
            url.scheme()
        )));
    }

    if endpoint.token.trim().is_empty() {
        return Err(CliError::Config(format!("{}.token is empty", role)));
    }

    Ok(())
}
