//! Configuration validation for network configs.
//!
//! Checks every value against the limits AWS enforces before any API call is
//! made, so a bad configuration never leaves a half-built network behind.

use crate::error::{ConfigError, Result};
use crate::planner::MIN_SUBNET_PREFIX;
use std::collections::HashSet;
use tracing::debug;

use super::network::NetworkConfig;

/// Shortest prefix AWS accepts for a VPC or subnet block.
pub const MAX_BLOCK_PREFIX: u8 = 16;

/// Longest accepted name-tag prefix.
///
/// AWS tag values are limited to 256 characters; derived names append
/// suffixes such as `-private-subnet-12`.
pub const MAX_TAG_PREFIX_LEN: usize = 200;

/// Validator for network configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The variable that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a network configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, if any.
    pub fn validate(&self, config: &NetworkConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_vpc(config, &mut result);
        Self::validate_region(&config.region, &mut result);
        Self::validate_zones(config, &mut result);
        Self::validate_tag_prefix(&config.tag_prefix, &mut result);
        Self::validate_wait(config, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(ConfigError::validation(first_error.message.clone(), first_error.field.clone()).into())
        }
    }

    fn validate_vpc(config: &NetworkConfig, result: &mut ValidationResult) {
        let prefix = config.vpc_cidr.prefix_len();
        if !(MAX_BLOCK_PREFIX..=MIN_SUBNET_PREFIX).contains(&prefix) {
            result.error(
                "VPC_CIDR",
                format!(
                    "VPC block {} must have a prefix between /{MAX_BLOCK_PREFIX} and /{MIN_SUBNET_PREFIX}",
                    config.vpc_cidr
                ),
            );
        }

        if let Some(subnet_prefix) = config.subnet_prefix {
            if !(MAX_BLOCK_PREFIX..=MIN_SUBNET_PREFIX).contains(&subnet_prefix) {
                result.error(
                    "SUBNET_PREFIX",
                    format!(
                        "Subnet prefix /{subnet_prefix} must be between /{MAX_BLOCK_PREFIX} and /{MIN_SUBNET_PREFIX}"
                    ),
                );
            }
        }
    }

    fn validate_region(region: &str, result: &mut ValidationResult) {
        if !is_valid_region(region) {
            result.error(
                "REGION",
                format!("Region '{region}' is invalid. Expected a name like 'us-east-1'."),
            );
        }
    }

    fn validate_zones(config: &NetworkConfig, result: &mut ValidationResult) {
        if config.availability_zones.is_empty() {
            result.error("AZ_LIST", "At least one availability zone is required");
            return;
        }

        let mut seen = HashSet::new();
        for zone in &config.availability_zones {
            if !seen.insert(zone.as_str()) {
                result.error("AZ_LIST", format!("Duplicate availability zone: {zone}"));
            }
            if !zone.starts_with(&config.region) {
                result.warnings.push(format!(
                    "Availability zone '{zone}' does not belong to region '{}'",
                    config.region
                ));
            }
        }

        if config.availability_zones.len() == 1 {
            result.warnings.push(String::from(
                "Only one availability zone configured; the network has no zone redundancy",
            ));
        }
    }

    fn validate_tag_prefix(prefix: &str, result: &mut ValidationResult) {
        if prefix.is_empty() {
            result.error("VPC_TAG_NAME", "Name-tag prefix cannot be empty");
        } else if prefix.chars().count() > MAX_TAG_PREFIX_LEN {
            result.error(
                "VPC_TAG_NAME",
                format!("Name-tag prefix exceeds {MAX_TAG_PREFIX_LEN} characters"),
            );
        }
    }

    fn validate_wait(config: &NetworkConfig, result: &mut ValidationResult) {
        if config.wait.poll_interval_secs == 0 {
            result.error("POLL_INTERVAL_SECS", "Poll interval must be greater than zero");
        }

        if config.wait.timeout_secs < config.wait.poll_interval_secs {
            result.warnings.push(format!(
                "Wait timeout ({}s) is shorter than the poll interval ({}s); resources are checked once",
                config.wait.timeout_secs, config.wait.poll_interval_secs
            ));
        }
    }
}

/// Checks that a region looks like `us-east-1` or `us-gov-west-1`.
#[must_use]
pub fn is_valid_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return false;
    }

    let (Some(geo), Some(number)) = (parts.first(), parts.last()) else {
        return false;
    };

    let geo_ok = geo.len() == 2 && geo.chars().all(|c| c.is_ascii_lowercase());
    let number_ok = !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    let names_ok = parts[1..parts.len() - 1]
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()));

    geo_ok && number_ok && names_ok
}

impl ValidationResult {
    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaitConfig;
    use crate::error::ProvisionerError;

    fn config() -> NetworkConfig {
        NetworkConfig {
            vpc_cidr: "10.0.0.0/16".parse().unwrap(),
            region: String::from("us-east-1"),
            availability_zones: vec![String::from("us-east-1a"), String::from("us-east-1b")],
            tag_prefix: String::from("lab"),
            subnet_prefix: None,
            wait: WaitConfig::default(),
        }
    }

    fn failing_field(config: &NetworkConfig) -> Option<String> {
        match ConfigValidator::new().validate(config) {
            Err(ProvisionerError::Config(ConfigError::ValidationError { field, .. })) => field,
            _ => None,
        }
    }

    #[test]
    fn test_valid_region() {
        assert!(is_valid_region("us-east-1"));
        assert!(is_valid_region("ap-southeast-2"));
        assert!(is_valid_region("us-gov-west-1"));
    }

    #[test]
    fn test_invalid_region() {
        assert!(!is_valid_region(""));
        assert!(!is_valid_region("us-east")); // no number
        assert!(!is_valid_region("US-EAST-1")); // uppercase
        assert!(!is_valid_region("usa-east-1")); // three-letter geo
        assert!(!is_valid_region("us--1")); // empty name
    }

    #[test]
    fn test_default_config_is_valid() {
        let result = ConfigValidator::new().validate(&config()).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_vpc_prefix_limits() {
        let mut cfg = config();
        cfg.vpc_cidr = "10.0.0.0/8".parse().unwrap();
        assert_eq!(failing_field(&cfg).as_deref(), Some("VPC_CIDR"));

        cfg.vpc_cidr = "10.0.0.0/28".parse().unwrap();
        assert_eq!(failing_field(&cfg), None);
    }

    #[test]
    fn test_subnet_prefix_limits() {
        let mut cfg = config();
        cfg.subnet_prefix = Some(29);
        assert_eq!(failing_field(&cfg).as_deref(), Some("SUBNET_PREFIX"));
    }

    #[test]
    fn test_duplicate_zones_rejected() {
        let mut cfg = config();
        cfg.availability_zones = vec![String::from("us-east-1a"), String::from("us-east-1a")];
        assert_eq!(failing_field(&cfg).as_deref(), Some("AZ_LIST"));
    }

    #[test]
    fn test_foreign_zone_warns() {
        let mut cfg = config();
        cfg.availability_zones.push(String::from("eu-west-1a"));
        let result = ConfigValidator::new().validate(&cfg).unwrap();
        assert_eq!(result.warning_count(), 1);
        assert!(result.warnings[0].contains("eu-west-1a"));
    }

    #[test]
    fn test_tag_prefix_limits() {
        let mut cfg = config();
        cfg.tag_prefix = String::new();
        assert_eq!(failing_field(&cfg).as_deref(), Some("VPC_TAG_NAME"));

        cfg.tag_prefix = "x".repeat(MAX_TAG_PREFIX_LEN + 1);
        assert_eq!(failing_field(&cfg).as_deref(), Some("VPC_TAG_NAME"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut cfg = config();
        cfg.wait.poll_interval_secs = 0;
        assert_eq!(failing_field(&cfg).as_deref(), Some("POLL_INTERVAL_SECS"));
    }
}
