//! CLI argument definitions.
//!
//! The provisioner has a single action; flags only adjust how it runs.

use clap::Parser;
use std::path::PathBuf;

/// Provision a VPC with public and private subnets, gateways and routing.
#[derive(Parser, Debug)]
#[command(name = "vpc-provisioner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Compute and print the plan without calling AWS.
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Dotenv file to load before reading the environment.
    #[arg(long, env = "PROVISIONER_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_runs_everything() {
        let cli = Cli::try_parse_from(["vpc-provisioner"]).unwrap();
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
        assert!(matches!(cli.output, OutputFormat::Text));
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "vpc-provisioner",
            "--dry-run",
            "-v",
            "--output",
            "json",
            "--env-file",
            "staging.env",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.env_file, Some(PathBuf::from("staging.env")));
    }

    #[test]
    fn test_command_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
