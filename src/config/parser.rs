//! Configuration parser for loading settings from the environment.
//!
//! Values come from process environment variables, optionally seeded from a
//! dotenv file. Unset variables fall back to defaults; set-but-blank
//! variables are rejected.

use crate::error::{ConfigError, Result};
use crate::planner::Ipv4Cidr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::network::{
    DEFAULT_AZ_LIST, DEFAULT_REGION, DEFAULT_TAG_PREFIX, DEFAULT_VPC_CIDR, NetworkConfig,
    WaitConfig,
};

/// Environment variable holding the VPC CIDR.
pub const VPC_CIDR_VAR: &str = "VPC_CIDR";
/// Environment variable holding the region.
pub const REGION_VAR: &str = "REGION";
/// Environment variable holding the comma-separated AZ list.
pub const AZ_LIST_VAR: &str = "AZ_LIST";
/// Environment variable holding the name-tag prefix.
pub const TAG_PREFIX_VAR: &str = "VPC_TAG_NAME";
/// Environment variable holding the subnet prefix override.
pub const SUBNET_PREFIX_VAR: &str = "SUBNET_PREFIX";
/// Environment variable holding the waiter timeout.
pub const WAIT_TIMEOUT_VAR: &str = "WAIT_TIMEOUT_SECS";
/// Environment variable holding the waiter poll interval.
pub const POLL_INTERVAL_VAR: &str = "POLL_INTERVAL_SECS";

/// Default dotenv file name.
const DEFAULT_ENV_FILE: &str = ".env";

/// Configuration parser for building a [`NetworkConfig`].
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Explicit dotenv file; `.env` in the working directory otherwise.
    env_file: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { env_file: None }
    }

    /// Sets the dotenv file to load. Unlike the default `.env`, an explicit
    /// file must exist.
    #[must_use]
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Loads the dotenv file into the process environment.
    ///
    /// Variables already set in the environment are not overridden.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or any file cannot be
    /// parsed.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| env_file_error(&env_path, &e.to_string()))?;
        } else if self.env_file.is_some() {
            return Err(env_file_error(&env_path, "file not found").into());
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is blank or malformed.
    pub fn parse_env(&self) -> Result<NetworkConfig> {
        self.parse_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is blank or malformed.
    pub fn parse_lookup<F>(&self, lookup: F) -> Result<NetworkConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vpc_cidr: Ipv4Cidr = require(&lookup, VPC_CIDR_VAR, DEFAULT_VPC_CIDR)?.parse()?;
        let region = require(&lookup, REGION_VAR, DEFAULT_REGION)?;
        let availability_zones = parse_az_list(&require(&lookup, AZ_LIST_VAR, DEFAULT_AZ_LIST)?)?;
        let tag_prefix = require(&lookup, TAG_PREFIX_VAR, DEFAULT_TAG_PREFIX)?;

        let subnet_prefix = optional(&lookup, SUBNET_PREFIX_VAR)?
            .map(|value| parse_prefix(SUBNET_PREFIX_VAR, &value))
            .transpose()?;

        let defaults = WaitConfig::default();
        let wait = WaitConfig {
            timeout_secs: optional(&lookup, WAIT_TIMEOUT_VAR)?
                .map(|v| parse_number(WAIT_TIMEOUT_VAR, &v))
                .transpose()?
                .unwrap_or(defaults.timeout_secs),
            poll_interval_secs: optional(&lookup, POLL_INTERVAL_VAR)?
                .map(|v| parse_number(POLL_INTERVAL_VAR, &v))
                .transpose()?
                .unwrap_or(defaults.poll_interval_secs),
        };

        debug!(
            "Loaded configuration: {vpc_cidr} in {region}, {} zones",
            availability_zones.len()
        );

        Ok(NetworkConfig {
            vpc_cidr,
            region,
            availability_zones,
            tag_prefix,
            subnet_prefix,
            wait,
        })
    }
}

/// Reads a variable, treating unset as absent and blank as an error.
fn optional<F>(lookup: &F, name: &str) -> std::result::Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Err(ConfigError::MissingEnvVar {
            name: name.to_string(),
        }),
        Some(value) => Ok(Some(value.trim().to_string())),
    }
}

fn require<F>(lookup: &F, name: &str, default: &str) -> std::result::Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(optional(lookup, name)?.unwrap_or_else(|| default.to_string()))
}

/// Splits a comma-separated AZ list, trimming entries and skipping blanks.
fn parse_az_list(value: &str) -> std::result::Result<Vec<String>, ConfigError> {
    let zones: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .map(str::to_string)
        .collect();

    if zones.is_empty() {
        return Err(ConfigError::invalid_var(
            AZ_LIST_VAR,
            value,
            "no availability zones listed",
        ));
    }

    Ok(zones)
}

/// Parses a prefix length, accepting an optional leading `/`.
fn parse_prefix(name: &str, value: &str) -> std::result::Result<u8, ConfigError> {
    let prefix: u8 = parse_number(name, value.strip_prefix('/').unwrap_or(value))?;
    if prefix > Ipv4Cidr::MAX_PREFIX_LEN {
        return Err(ConfigError::invalid_var(
            name,
            value,
            format!("prefix length must be at most {}", Ipv4Cidr::MAX_PREFIX_LEN),
        ));
    }
    Ok(prefix)
}

fn parse_number<T>(name: &str, value: &str) -> std::result::Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid_var(name, value, e.to_string()))
}

fn env_file_error(path: &Path, message: &str) -> ConfigError {
    ConfigError::EnvFile {
        location: path.display().to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvisionerError;
    use std::collections::HashMap;
    use std::io::Write;

    fn parse(vars: &[(&str, &str)]) -> Result<NetworkConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ConfigParser::new().parse_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.vpc_cidr.to_string(), "10.0.0.0/16");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.availability_zones, vec!["us-east-1a", "us-east-1b"]);
        assert_eq!(config.tag_prefix, "MyVPC");
        assert_eq!(config.subnet_prefix, None);
        assert_eq!(config.wait, WaitConfig::default());
    }

    #[test]
    fn test_explicit_values() {
        let config = parse(&[
            ("VPC_CIDR", "172.16.0.0/20"),
            ("REGION", "eu-west-1"),
            ("AZ_LIST", " eu-west-1a , ,eu-west-1c,"),
            ("VPC_TAG_NAME", "staging"),
            ("SUBNET_PREFIX", "/24"),
            ("WAIT_TIMEOUT_SECS", "120"),
            ("POLL_INTERVAL_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.vpc_cidr.to_string(), "172.16.0.0/20");
        assert_eq!(config.availability_zones, vec!["eu-west-1a", "eu-west-1c"]);
        assert_eq!(config.tag_prefix, "staging");
        assert_eq!(config.subnet_prefix, Some(24));
        assert_eq!(config.wait.timeout_secs, 120);
        assert_eq!(config.wait.poll_interval_secs, 5);
    }

    #[test]
    fn test_blank_variable_is_missing() {
        let err = parse(&[("REGION", "   ")]).unwrap_err();
        assert!(matches!(
            err,
            ProvisionerError::Config(ConfigError::MissingEnvVar { ref name }) if name == "REGION"
        ));
    }

    #[test]
    fn test_empty_az_list_rejected() {
        let err = parse(&[("AZ_LIST", " , ,")]).unwrap_err();
        assert!(matches!(
            err,
            ProvisionerError::Config(ConfigError::InvalidEnvVar { ref name, .. }) if name == "AZ_LIST"
        ));
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert!(matches!(
            parse(&[("VPC_CIDR", "10.0.0.0")]).unwrap_err(),
            ProvisionerError::Config(ConfigError::InvalidCidr { .. })
        ));
        assert!(matches!(
            parse(&[("VPC_CIDR", "10.0.0.1/16")]).unwrap_err(),
            ProvisionerError::Config(ConfigError::InvalidCidr { .. })
        ));
        assert!(matches!(
            parse(&[("SUBNET_PREFIX", "40")]).unwrap_err(),
            ProvisionerError::Config(ConfigError::InvalidEnvVar { .. })
        ));
        assert!(matches!(
            parse(&[("POLL_INTERVAL_SECS", "soon")]).unwrap_err(),
            ProvisionerError::Config(ConfigError::InvalidEnvVar { .. })
        ));
    }

    #[test]
    fn test_load_dotenv_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "VPC_PROVISIONER_DOTENV_MARKER=loaded").unwrap();

        ConfigParser::new()
            .with_env_file(file.path())
            .load_dotenv()
            .unwrap();

        assert_eq!(
            std::env::var("VPC_PROVISIONER_DOTENV_MARKER").as_deref(),
            Ok("loaded")
        );
    }

    #[test]
    fn test_missing_explicit_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigParser::new()
            .with_env_file(dir.path().join("absent.env"))
            .load_dotenv()
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::Config(ConfigError::EnvFile { .. })));
    }
}
