//! Cloud provider integration.
//!
//! This module provides:
//! - The [`CloudProvider`] trait the executor drives
//! - An EC2 implementation backed by the AWS SDK
//! - Create, tag and readiness primitives on top of any provider

mod ec2;
mod provider;
mod provisioner;
mod types;

pub use ec2::Ec2Provider;
pub use provider::CloudProvider;
pub use provisioner::ResourceProvisioner;
pub use types::{
    CreateRequest, ProvisionStep, ProvisionedResource, ResourceId, ResourceKind, ResourceStatus,
    RouteTarget,
};
