//! Configuration module for the VPC provisioner.
//!
//! This module handles all configuration-related functionality:
//! - Reading settings from the environment and an optional `.env` file
//! - Validation of configuration values against AWS limits

mod network;
mod parser;
mod validator;

pub use parser::{
    AZ_LIST_VAR, ConfigParser, POLL_INTERVAL_VAR, REGION_VAR, SUBNET_PREFIX_VAR, TAG_PREFIX_VAR,
    VPC_CIDR_VAR, WAIT_TIMEOUT_VAR,
};
pub use network::{
    DEFAULT_AZ_LIST, DEFAULT_REGION, DEFAULT_TAG_PREFIX, DEFAULT_VPC_CIDR, NetworkConfig,
    WaitConfig,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, is_valid_region};
