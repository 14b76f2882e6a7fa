//! Cloud provider trait definition.
//!
//! This module defines the narrow interface the provisioner needs from a
//! cloud API: create a resource, tag it, and describe its status.

use async_trait::async_trait;

use crate::error::ProviderError;

use super::types::{CreateRequest, ResourceId, ResourceStatus};

/// Trait for cloud provider adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Creates a resource and returns its identifier.
    async fn create(&self, request: &CreateRequest) -> Result<ResourceId, ProviderError>;

    /// Applies a single tag to a resource.
    async fn tag(&self, id: &ResourceId, key: &str, value: &str) -> Result<(), ProviderError>;

    /// Reports the current status of a resource.
    async fn describe(&self, id: &ResourceId) -> Result<ResourceStatus, ProviderError>;
}
