//! CLI module for the VPC provisioner.
//!
//! This module provides the command-line arguments and the formatting of
//! plans, reports and failures.

mod commands;
mod output;

pub use commands::{Cli, OutputFormat};
pub use output::OutputFormatter;
