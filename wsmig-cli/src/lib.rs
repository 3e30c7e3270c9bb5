//! wsmig CLI - Command-line interface for workspace migration.
//!
//! This crate provides the CLI tool for migrating configuration from a
//! source workspace to a target workspace, including pre-flight validation
//! and export to Terraform variable files.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
