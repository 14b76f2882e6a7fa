//! Resource provisioner.
//!
//! Wraps a [`CloudProvider`] with the create, tag and wait primitives the
//! plan executor composes into a full run.

use tracing::{debug, info, warn};

use crate::config::WaitConfig;
use crate::error::ProviderError;

use super::provider::CloudProvider;
use super::types::{CreateRequest, ResourceId, ResourceStatus};

/// Provisioner for individual cloud resources.
pub struct ResourceProvisioner<'a> {
    /// Cloud provider.
    provider: &'a dyn CloudProvider,
    /// Readiness polling settings.
    wait: WaitConfig,
}

impl<'a> ResourceProvisioner<'a> {
    /// Creates a new resource provisioner.
    #[must_use]
    pub fn new(provider: &'a dyn CloudProvider, wait: WaitConfig) -> Self {
        Self { provider, wait }
    }

    /// Creates a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the request.
    pub async fn create(&self, request: &CreateRequest) -> Result<ResourceId, ProviderError> {
        debug!("Creating {}", request.kind());
        let id = self.provider.create(request).await?;
        info!("Created {id}");
        Ok(id)
    }

    /// Applies tags to a resource, one call per tag.
    ///
    /// # Errors
    ///
    /// Returns the first tagging error.
    pub async fn apply_tags(
        &self,
        id: &ResourceId,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError> {
        for (key, value) in tags {
            debug!("Tagging {id}: {key}={value}");
            self.provider.tag(id, key, value).await?;
        }
        Ok(())
    }

    /// Polls a resource until it is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource enters a failure state, the timeout
    /// is reached, or a describe call fails.
    pub async fn wait_until_available(&self, id: &ResourceId) -> Result<(), ProviderError> {
        let start = std::time::Instant::now();
        let timeout = self.wait.timeout();

        info!("Waiting for {id} to become available");

        loop {
            match self.provider.describe(id).await? {
                ResourceStatus::Available => {
                    debug!("{id} available after {}s", start.elapsed().as_secs());
                    return Ok(());
                }
                ResourceStatus::Failed { state, reason } => {
                    warn!("{id} entered state {state}");
                    return Err(ProviderError::ResourceFailed {
                        resource_id: id.as_str().to_string(),
                        state,
                        message: reason,
                    });
                }
                status @ (ResourceStatus::Pending | ResourceStatus::NotFound) => {
                    debug!("{id} is {status}");
                }
            }

            if start.elapsed() >= timeout {
                return Err(ProviderError::Timeout {
                    resource_id: id.as_str().to_string(),
                    expected_state: String::from("available"),
                    waited_secs: start.elapsed().as_secs(),
                });
            }

            tokio::time::sleep(self.wait.poll_interval()).await;
        }
    }
}

impl std::fmt::Debug for ResourceProvisioner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceProvisioner")
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::provider::MockCloudProvider;
    use crate::cloud::types::ResourceKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_wait(timeout_secs: u64) -> WaitConfig {
        WaitConfig {
            timeout_secs,
            poll_interval_secs: 1,
        }
    }

    #[tokio::test]
    async fn test_wait_returns_when_available() {
        let mut mock = MockCloudProvider::new();
        let calls = AtomicUsize::new(0);
        mock.expect_describe().times(3).returning(move |_| {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(ResourceStatus::NotFound),
                1 => Ok(ResourceStatus::Pending),
                _ => Ok(ResourceStatus::Available),
            }
        });

        let provisioner = ResourceProvisioner::new(&mock, fast_wait(30));
        let id = ResourceId::new(ResourceKind::Vpc, "vpc-1");
        provisioner.wait_until_available(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let mut mock = MockCloudProvider::new();
        mock.expect_describe()
            .times(1)
            .returning(|_| Ok(ResourceStatus::Pending));

        let provisioner = ResourceProvisioner::new(&mock, fast_wait(0));
        let id = ResourceId::new(ResourceKind::NatGateway, "nat-1");
        let err = provisioner.wait_until_available(&id).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { ref resource_id, .. } if resource_id == "nat-1"));
    }

    #[tokio::test]
    async fn test_wait_fails_on_failed_state() {
        let mut mock = MockCloudProvider::new();
        mock.expect_describe().times(1).returning(|_| {
            Ok(ResourceStatus::Failed {
                state: String::from("failed"),
                reason: String::from("Elastic IP address is already associated"),
            })
        });

        let provisioner = ResourceProvisioner::new(&mock, fast_wait(30));
        let id = ResourceId::new(ResourceKind::NatGateway, "nat-1");
        let err = provisioner.wait_until_available(&id).await.unwrap_err();
        assert!(err.to_string().contains("already associated"));
    }

    #[tokio::test]
    async fn test_apply_tags_in_order() {
        let mut mock = MockCloudProvider::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_tag()
            .withf(|_, key, value| key == "Name" && value == "lab-igw")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        mock.expect_tag()
            .withf(|_, key, _| key == "provisioner:run-id")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let provisioner = ResourceProvisioner::new(&mock, WaitConfig::default());
        let id = ResourceId::new(ResourceKind::InternetGateway, "igw-1");
        let tags = vec![
            (String::from("Name"), String::from("lab-igw")),
            (String::from("provisioner:run-id"), String::from("run")),
        ];
        provisioner.apply_tags(&id, &tags).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_propagates_error() {
        let mut mock = MockCloudProvider::new();
        mock.expect_create().times(1).returning(|_| {
            Err(ProviderError::api_error(
                "CreateVpc",
                "VpcLimitExceeded",
                "The maximum number of VPCs has been reached.",
            ))
        });

        let provisioner = ResourceProvisioner::new(&mock, WaitConfig::default());
        let err = provisioner
            .create(&CreateRequest::Vpc {
                cidr: "10.0.0.0/16".parse().unwrap(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("VpcLimitExceeded"));
    }
}
