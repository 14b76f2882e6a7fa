//! AWS EC2 adapter.
//!
//! Implements [`CloudProvider`] on top of `aws-sdk-ec2`. Credentials and
//! retry behaviour come from the standard AWS configuration chain.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{DomainType, Tag};
use tracing::{debug, trace};

use crate::error::ProviderError;

use super::provider::CloudProvider;
use super::types::{CreateRequest, ResourceId, ResourceKind, ResourceStatus, RouteTarget};

/// EC2-backed cloud provider.
#[derive(Debug, Clone)]
pub struct Ec2Provider {
    /// EC2 client.
    client: Client,
    /// Region the client talks to.
    region: String,
}

impl Ec2Provider {
    /// Creates a provider for the given region using the default credential chain.
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_ec2::config::Region::new(region.to_string()))
            .load()
            .await;

        Self::with_client(Client::new(&config), region)
    }

    /// Creates a provider with an existing client.
    #[must_use]
    pub fn with_client(client: Client, region: &str) -> Self {
        Self {
            client,
            region: region.to_string(),
        }
    }

    async fn describe_vpc(&self, id: &str) -> Result<ResourceStatus, ProviderError> {
        let result = self.client.describe_vpcs().vpc_ids(id).send().await;
        let output = match result {
            Ok(output) => output,
            Err(e) => return not_found_or("DescribeVpcs", &e),
        };

        Ok(output.vpcs().first().map_or(ResourceStatus::NotFound, |vpc| {
            vpc.state().map_or(ResourceStatus::Pending, |s| {
                ResourceStatus::from_state(s.as_str(), None)
            })
        }))
    }

    async fn describe_nat_gateway(&self, id: &str) -> Result<ResourceStatus, ProviderError> {
        let result = self
            .client
            .describe_nat_gateways()
            .nat_gateway_ids(id)
            .send()
            .await;
        let output = match result {
            Ok(output) => output,
            Err(e) => return not_found_or("DescribeNatGateways", &e),
        };

        Ok(output.nat_gateways().first().map_or(ResourceStatus::NotFound, |nat| {
            nat.state().map_or(ResourceStatus::Pending, |s| {
                ResourceStatus::from_state(s.as_str(), nat.failure_message())
            })
        }))
    }
}

#[async_trait]
impl CloudProvider for Ec2Provider {
    #[allow(clippy::too_many_lines)]
    async fn create(&self, request: &CreateRequest) -> Result<ResourceId, ProviderError> {
        debug!("EC2 create {} in {}", request.kind(), self.region);

        match request {
            CreateRequest::Vpc { cidr } => {
                let output = self
                    .client
                    .create_vpc()
                    .cidr_block(cidr.to_string())
                    .send()
                    .await
                    .map_err(|e| api_error("CreateVpc", &e))?;
                let id = output
                    .vpc()
                    .and_then(|v| v.vpc_id())
                    .ok_or_else(|| missing_id("CreateVpc"))?;
                Ok(ResourceId::new(ResourceKind::Vpc, id))
            }
            CreateRequest::Subnet {
                vpc_id,
                cidr,
                availability_zone,
            } => {
                let output = self
                    .client
                    .create_subnet()
                    .vpc_id(vpc_id)
                    .cidr_block(cidr.to_string())
                    .availability_zone(availability_zone)
                    .send()
                    .await
                    .map_err(|e| api_error("CreateSubnet", &e))?;
                let id = output
                    .subnet()
                    .and_then(|s| s.subnet_id())
                    .ok_or_else(|| missing_id("CreateSubnet"))?;
                Ok(ResourceId::new(ResourceKind::Subnet, id))
            }
            CreateRequest::InternetGateway => {
                let output = self
                    .client
                    .create_internet_gateway()
                    .send()
                    .await
                    .map_err(|e| api_error("CreateInternetGateway", &e))?;
                let id = output
                    .internet_gateway()
                    .and_then(|g| g.internet_gateway_id())
                    .ok_or_else(|| missing_id("CreateInternetGateway"))?;
                Ok(ResourceId::new(ResourceKind::InternetGateway, id))
            }
            CreateRequest::InternetGatewayAttachment { gateway_id, vpc_id } => {
                self.client
                    .attach_internet_gateway()
                    .internet_gateway_id(gateway_id)
                    .vpc_id(vpc_id)
                    .send()
                    .await
                    .map_err(|e| api_error("AttachInternetGateway", &e))?;
                Ok(ResourceId::new(
                    ResourceKind::InternetGatewayAttachment,
                    gateway_id,
                ))
            }
            CreateRequest::ElasticIp => {
                let output = self
                    .client
                    .allocate_address()
                    .domain(DomainType::Vpc)
                    .send()
                    .await
                    .map_err(|e| api_error("AllocateAddress", &e))?;
                let id = output
                    .allocation_id()
                    .ok_or_else(|| missing_id("AllocateAddress"))?;
                Ok(ResourceId::new(ResourceKind::ElasticIp, id))
            }
            CreateRequest::NatGateway {
                subnet_id,
                allocation_id,
            } => {
                let output = self
                    .client
                    .create_nat_gateway()
                    .subnet_id(subnet_id)
                    .allocation_id(allocation_id)
                    .send()
                    .await
                    .map_err(|e| api_error("CreateNatGateway", &e))?;
                let id = output
                    .nat_gateway()
                    .and_then(|n| n.nat_gateway_id())
                    .ok_or_else(|| missing_id("CreateNatGateway"))?;
                Ok(ResourceId::new(ResourceKind::NatGateway, id))
            }
            CreateRequest::RouteTable { vpc_id } => {
                let output = self
                    .client
                    .create_route_table()
                    .vpc_id(vpc_id)
                    .send()
                    .await
                    .map_err(|e| api_error("CreateRouteTable", &e))?;
                let id = output
                    .route_table()
                    .and_then(|r| r.route_table_id())
                    .ok_or_else(|| missing_id("CreateRouteTable"))?;
                Ok(ResourceId::new(ResourceKind::RouteTable, id))
            }
            CreateRequest::Route {
                route_table_id,
                destination,
                target,
            } => {
                let builder = self
                    .client
                    .create_route()
                    .route_table_id(route_table_id)
                    .destination_cidr_block(destination.to_string());
                let builder = match target {
                    RouteTarget::InternetGateway(id) => builder.gateway_id(id),
                    RouteTarget::NatGateway(id) => builder.nat_gateway_id(id),
                };
                let output = builder
                    .send()
                    .await
                    .map_err(|e| api_error("CreateRoute", &e))?;
                if output.r#return() == Some(false) {
                    return Err(ProviderError::invalid_response(
                        "CreateRoute",
                        "route was not created",
                    ));
                }
                Ok(ResourceId::route(route_table_id, *destination))
            }
            CreateRequest::RouteTableAssociation {
                route_table_id,
                subnet_id,
            } => {
                let output = self
                    .client
                    .associate_route_table()
                    .route_table_id(route_table_id)
                    .subnet_id(subnet_id)
                    .send()
                    .await
                    .map_err(|e| api_error("AssociateRouteTable", &e))?;
                let id = output
                    .association_id()
                    .ok_or_else(|| missing_id("AssociateRouteTable"))?;
                Ok(ResourceId::new(ResourceKind::RouteTableAssociation, id))
            }
        }
    }

    async fn tag(&self, id: &ResourceId, key: &str, value: &str) -> Result<(), ProviderError> {
        trace!("EC2 tag {id}: {key}={value}");

        self.client
            .create_tags()
            .resources(id.as_str())
            .tags(Tag::builder().key(key).value(value).build())
            .send()
            .await
            .map_err(|e| api_error("CreateTags", &e))?;

        Ok(())
    }

    async fn describe(&self, id: &ResourceId) -> Result<ResourceStatus, ProviderError> {
        trace!("EC2 describe {id}");

        // Only VPCs and NAT gateways are ever waited on.
        match id.kind() {
            ResourceKind::Vpc => self.describe_vpc(id.as_str()).await,
            ResourceKind::NatGateway => self.describe_nat_gateway(id.as_str()).await,
            kind => Err(ProviderError::invalid_response(
                "Describe",
                format!("unsupported kind: {kind}"),
            )),
        }
    }
}

/// Converts an SDK error into a provider error carrying the AWS code and message.
fn api_error<E, R>(operation: &str, err: &SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => ProviderError::api_error(
            operation,
            service.code().unwrap_or("Unknown"),
            service.message().unwrap_or_default(),
        ),
        None => ProviderError::api_error(
            operation,
            "RequestFailed",
            DisplayErrorContext(err).to_string(),
        ),
    }
}

/// Freshly created resources can be invisible to describe calls for a short
/// while; EC2 reports them with an `*.NotFound` code.
fn not_found_or<E, R>(operation: &str, err: &SdkError<E, R>) -> Result<ResourceStatus, ProviderError>
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let not_found = err
        .as_service_error()
        .and_then(ProvideErrorMetadata::code)
        .is_some_and(|code| code.ends_with(".NotFound"));

    if not_found {
        Ok(ResourceStatus::NotFound)
    } else {
        Err(api_error(operation, err))
    }
}

fn missing_id(operation: &str) -> ProviderError {
    ProviderError::invalid_response(operation, "response did not include a resource id")
}
