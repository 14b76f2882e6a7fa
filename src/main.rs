//! VPC provisioner CLI entrypoint.
//!
//! Reads the network configuration from the environment, plans the subnet
//! layout and provisions it in AWS.

use std::io::Write;
use std::process::ExitCode;

use vpc_provisioner::cli::{Cli, OutputFormatter};
use vpc_provisioner::cloud::{Ec2Provider, ResourceProvisioner};
use vpc_provisioner::config::{ConfigParser, ConfigValidator, NetworkConfig};
use vpc_provisioner::error::Result;
use vpc_provisioner::planner::{CidrPlanner, PlanExecutor, PlanHasher};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);

    match runtime.block_on(run(&cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", formatter.format_failure(&e));
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads and validates the configuration.
fn load_config(cli: &Cli) -> Result<NetworkConfig> {
    let parser = match &cli.env_file {
        Some(path) => ConfigParser::new().with_env_file(path),
        None => ConfigParser::new(),
    };
    parser.load_dotenv()?;

    let config = parser.parse_env()?;
    let validation = ConfigValidator::new().validate(&config)?;
    for warning in &validation.warnings {
        warn!("{warning}");
    }

    Ok(config)
}

/// Main async entry point.
async fn run(cli: &Cli, formatter: &OutputFormatter) -> Result<()> {
    let config = load_config(cli)?;

    let plan = CidrPlanner::new()
        .with_subnet_prefix(config.subnet_prefix)
        .plan(&config)?;
    let plan_hash = PlanHasher::new().short_hash(&plan);

    emit(&formatter.format_plan(&plan, &plan_hash))?;

    if cli.dry_run {
        info!("Dry run: no resources created");
        return Ok(());
    }

    let provider = Ec2Provider::new(&config.region).await;
    let provisioner = ResourceProvisioner::new(&provider, config.wait);
    let executor = PlanExecutor::new(&provisioner, Uuid::new_v4());

    let report = executor.execute(&plan).await?;
    emit(&formatter.format_report(&report))?;

    Ok(())
}

/// Writes formatted output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    stdout.flush()?;
    Ok(())
}
