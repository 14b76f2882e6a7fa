//! Planning module for network layouts.
//!
//! This module subdivides the VPC CIDR into public and private subnets,
//! fingerprints the resulting plan, and executes it against a cloud
//! provider in dependency order.

mod cidr;
mod executor;
mod hash;
mod plan;

pub use cidr::Ipv4Cidr;
pub use executor::{PLAN_TAG, PlanExecutor, ProvisionReport, RUN_ID_TAG};
pub use hash::{PlanHasher, SHORT_HASH_LEN};
pub use plan::{CidrPlanner, MIN_SUBNET_PREFIX, NetworkPlan, SubnetSpec, Visibility};
