//! Error types for the VPC provisioner.
//!
//! Errors fall into three families: configuration problems detected before
//! any API call, capacity problems detected while planning subnets, and
//! provider failures raised by the cloud API during provisioning.

use thiserror::Error;

use crate::cloud::{ProvisionStep, ProvisionedResource};

/// The main error type for the VPC provisioner.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The VPC CIDR cannot hold the requested subnets.
    #[error("Capacity error: {0}")]
    Capacity(#[from] CapacityError),

    /// A provisioning step failed; everything after it was skipped.
    #[error(
        "Provisioning aborted at step '{step}' (last completed: {}): {source}",
        .last_completed.as_ref().map_or_else(|| String::from("none"), ToString::to_string)
    )]
    StepFailed {
        /// Step that failed.
        step: ProvisionStep,
        /// Last step that completed successfully, if any.
        last_completed: Option<ProvisionStep>,
        /// Resources created before the failure. They are left in place.
        created: Vec<ProvisionedResource>,
        /// Underlying provider error.
        source: ProviderError,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable is set but holds no value.
    #[error("Missing value for environment variable: {name}")]
    MissingEnvVar {
        /// Name of the variable.
        name: String,
    },

    /// An environment variable could not be parsed.
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidEnvVar {
        /// Name of the variable.
        name: String,
        /// The raw value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A CIDR block could not be parsed.
    #[error("Invalid CIDR block '{value}': {reason}")]
    InvalidCidr {
        /// The raw CIDR text.
        value: String,
        /// Why the CIDR was rejected.
        reason: String,
    },

    /// The dotenv file could not be loaded.
    #[error("Failed to load environment file {location}: {message}")]
    EnvFile {
        /// Path to the file.
        location: String,
        /// Description of the failure.
        message: String,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Subnet planning capacity errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    /// The VPC is too small to hold the requested number of subnets.
    #[error(
        "VPC CIDR {vpc_cidr} cannot hold {requested} subnets (smallest allowed subnet is /{min_subnet_prefix})"
    )]
    InsufficientAddressSpace {
        /// The VPC CIDR.
        vpc_cidr: String,
        /// Number of subnets requested.
        requested: usize,
        /// Longest prefix a subnet may have.
        min_subnet_prefix: u8,
    },

    /// The explicit subnet prefix does not leave room for every subnet.
    #[error(
        "Subnet prefix /{subnet_prefix} yields only {available} blocks in {vpc_cidr}, {requested} required"
    )]
    SubnetPrefixTooShort {
        /// The VPC CIDR.
        vpc_cidr: String,
        /// The configured subnet prefix.
        subnet_prefix: u8,
        /// Blocks available at that prefix.
        available: u64,
        /// Number of subnets requested.
        requested: usize,
    },

    /// The explicit subnet prefix is outside the allowed range.
    #[error("Subnet prefix /{subnet_prefix} is invalid for VPC CIDR {vpc_cidr}")]
    InvalidSubnetPrefix {
        /// The VPC CIDR.
        vpc_cidr: String,
        /// The configured subnet prefix.
        subnet_prefix: u8,
    },

    /// No availability zones were supplied.
    #[error("At least one availability zone is required")]
    NoAvailabilityZones,
}

/// Cloud provider errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An API call was rejected by the provider.
    #[error("{operation} failed: {code} - {message}")]
    ApiRequestFailed {
        /// API operation name.
        operation: String,
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },

    /// The provider answered without the expected data.
    #[error("Invalid response from {operation}: {message}")]
    InvalidResponse {
        /// API operation name.
        operation: String,
        /// Description of the response issue.
        message: String,
    },

    /// The resource entered a terminal failure state.
    #[error("Resource {resource_id} entered state {state}: {message}")]
    ResourceFailed {
        /// Provider identifier of the resource.
        resource_id: String,
        /// Reported state.
        state: String,
        /// Failure reason reported by the provider.
        message: String,
    },

    /// Timeout waiting for a resource.
    #[error("Timeout after {waited_secs}s waiting for {resource_id} to become {expected_state}")]
    Timeout {
        /// Provider identifier of the resource.
        resource_id: String,
        /// Expected state that was not reached.
        expected_state: String,
        /// Seconds spent waiting.
        waited_secs: u64,
    },
}

/// Result type alias for provisioner operations.
pub type Result<T> = std::result::Result<T, ProvisionerError>;

impl ProvisionerError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Capacity(_) => 3,
            Self::StepFailed { .. } => 4,
            Self::Io(_) | Self::Internal(_) => 1,
        }
    }

    /// Returns the resources left behind by an aborted run.
    #[must_use]
    pub fn orphaned_resources(&self) -> &[ProvisionedResource] {
        match self {
            Self::StepFailed { created, .. } => created,
            _ => &[],
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates an invalid variable error.
    #[must_use]
    pub fn invalid_var(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl ProviderError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(
        operation: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ApiRequestFailed {
            operation: operation.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let config = ProvisionerError::from(ConfigError::MissingEnvVar {
            name: String::from("VPC_CIDR"),
        });
        assert_eq!(config.exit_code(), 2);

        let capacity = ProvisionerError::from(CapacityError::NoAvailabilityZones);
        assert_eq!(capacity.exit_code(), 3);

        let step = ProvisionerError::StepFailed {
            step: ProvisionStep::CreateNatGateway,
            last_completed: Some(ProvisionStep::AllocateElasticIp),
            created: vec![],
            source: ProviderError::api_error("CreateNatGateway", "Throttling", "slow down"),
        };
        assert_eq!(step.exit_code(), 4);
        assert_eq!(ProvisionerError::internal("boom").exit_code(), 1);
    }

    #[test]
    fn test_step_failed_names_steps() {
        let err = ProvisionerError::StepFailed {
            step: ProvisionStep::CreateNatGateway,
            last_completed: Some(ProvisionStep::AllocateElasticIp),
            created: vec![],
            source: ProviderError::api_error("CreateNatGateway", "InvalidSubnet", "no such subnet"),
        };
        let message = err.to_string();
        assert!(message.contains("create NAT gateway"));
        assert!(message.contains("allocate elastic IP"));
        assert!(message.contains("InvalidSubnet - no such subnet"));

        let first = ProvisionerError::StepFailed {
            step: ProvisionStep::CreateVpc,
            last_completed: None,
            created: vec![],
            source: ProviderError::api_error("CreateVpc", "VpcLimitExceeded", "limit"),
        };
        assert!(first.to_string().contains("last completed: none"));
    }
}
