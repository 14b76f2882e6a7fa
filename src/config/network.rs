//! Configuration types for the provisioner.
//!
//! A [`NetworkConfig`] fully describes the network to build. It is read from
//! the environment once at startup and never changes during a run.

use serde::Serialize;
use std::time::Duration;

use crate::planner::Ipv4Cidr;

/// Default VPC CIDR block.
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default availability zones.
pub const DEFAULT_AZ_LIST: &str = "us-east-1a,us-east-1b";

/// Default name-tag prefix.
pub const DEFAULT_TAG_PREFIX: &str = "MyVPC";

/// The network to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    /// VPC CIDR block.
    pub vpc_cidr: Ipv4Cidr,
    /// AWS region.
    pub region: String,
    /// Ordered availability zones; one public and one private subnet each.
    pub availability_zones: Vec<String>,
    /// Prefix for every name tag.
    pub tag_prefix: String,
    /// Explicit subnet prefix length.
    pub subnet_prefix: Option<u8>,
    /// Readiness polling settings.
    pub wait: WaitConfig,
}

/// Readiness polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaitConfig {
    /// Maximum time to wait for a resource, in seconds.
    pub timeout_secs: u64,
    /// Delay between status checks, in seconds.
    pub poll_interval_secs: u64,
}

impl WaitConfig {
    /// Default waiter timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

    /// Default poll interval in seconds.
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

    /// Returns the timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the poll interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            poll_interval_secs: Self::DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}
