//! Types exchanged with cloud providers.
//!
//! These types describe what to create, how a created resource is
//! identified, and what a provisioning run produced.

use serde::Serialize;

use crate::planner::{Ipv4Cidr, Visibility};

/// Kinds of resources the provisioner creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Virtual private cloud.
    Vpc,
    /// Subnet inside a VPC.
    Subnet,
    /// Internet gateway.
    InternetGateway,
    /// Attachment of an internet gateway to a VPC.
    InternetGatewayAttachment,
    /// Elastic IP allocation.
    ElasticIp,
    /// NAT gateway.
    NatGateway,
    /// Route table.
    RouteTable,
    /// Single route inside a route table.
    Route,
    /// Association of a route table with a subnet.
    RouteTableAssociation,
}

/// Identifier of a created resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceId {
    /// Resource kind.
    kind: ResourceKind,
    /// Opaque provider identifier.
    id: String,
}

/// Target of a default route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Route through an internet gateway.
    InternetGateway(String),
    /// Route through a NAT gateway.
    NatGateway(String),
}

/// Parameters for creating a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRequest {
    /// Create a VPC.
    Vpc {
        /// VPC CIDR block.
        cidr: Ipv4Cidr,
    },
    /// Create a subnet.
    Subnet {
        /// Owning VPC.
        vpc_id: String,
        /// Subnet CIDR block.
        cidr: Ipv4Cidr,
        /// Availability zone.
        availability_zone: String,
    },
    /// Create a detached internet gateway.
    InternetGateway,
    /// Attach an internet gateway to a VPC.
    InternetGatewayAttachment {
        /// Gateway to attach.
        gateway_id: String,
        /// Target VPC.
        vpc_id: String,
    },
    /// Allocate an elastic IP in the VPC domain.
    ElasticIp,
    /// Create a NAT gateway.
    NatGateway {
        /// Public subnet hosting the gateway.
        subnet_id: String,
        /// Elastic IP allocation.
        allocation_id: String,
    },
    /// Create a route table.
    RouteTable {
        /// Owning VPC.
        vpc_id: String,
    },
    /// Add a route to a route table.
    Route {
        /// Route table receiving the route.
        route_table_id: String,
        /// Destination block.
        destination: Ipv4Cidr,
        /// Gateway the traffic goes to.
        target: RouteTarget,
    },
    /// Associate a route table with a subnet.
    RouteTableAssociation {
        /// Route table.
        route_table_id: String,
        /// Subnet.
        subnet_id: String,
    },
}

/// Status reported by `describe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Still being created.
    Pending,
    /// Ready for dependent resources.
    Available,
    /// The provider does not (yet) know the resource.
    NotFound,
    /// Terminal failure state.
    Failed {
        /// Provider state name.
        state: String,
        /// Failure reason, if reported.
        reason: String,
    },
}

/// A single step of the provisioning sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProvisionStep {
    /// Create the VPC.
    CreateVpc,
    /// Create one subnet.
    CreateSubnet {
        /// Subnet name tag.
        name: String,
    },
    /// Create the internet gateway.
    CreateInternetGateway,
    /// Attach the internet gateway to the VPC.
    AttachInternetGateway,
    /// Allocate the NAT gateway's elastic IP.
    AllocateElasticIp,
    /// Create the NAT gateway.
    CreateNatGateway,
    /// Create a route table.
    CreateRouteTable {
        /// Public or private table.
        visibility: Visibility,
    },
    /// Add the `0.0.0.0/0` route to a route table.
    CreateDefaultRoute {
        /// Public or private table.
        visibility: Visibility,
    },
    /// Associate a route table with a subnet.
    AssociateRouteTable {
        /// Public or private table.
        visibility: Visibility,
        /// Subnet name tag.
        subnet: String,
    },
}

/// A resource created during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedResource {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Provider identifier.
    pub id: String,
    /// Applied name tag, for taggable kinds.
    pub name: Option<String>,
    /// Step that created the resource.
    pub step: ProvisionStep,
}

impl ResourceKind {
    /// Returns true if resources of this kind accept tags.
    #[must_use]
    pub const fn is_taggable(self) -> bool {
        !matches!(
            self,
            Self::InternetGatewayAttachment | Self::Route | Self::RouteTableAssociation
        )
    }
}

impl ResourceId {
    /// Separator between route table id and destination in route ids.
    const ROUTE_SEPARATOR: char = '|';

    /// Creates a resource identifier.
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Creates the identifier of a route.
    ///
    /// Routes have no provider id; they are addressed by table and destination.
    #[must_use]
    pub fn route(route_table_id: &str, destination: Ipv4Cidr) -> Self {
        Self::new(
            ResourceKind::Route,
            format!("{route_table_id}{}{destination}", Self::ROUTE_SEPARATOR),
        )
    }

    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the provider identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl CreateRequest {
    /// Returns the kind of resource this request creates.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Vpc { .. } => ResourceKind::Vpc,
            Self::Subnet { .. } => ResourceKind::Subnet,
            Self::InternetGateway => ResourceKind::InternetGateway,
            Self::InternetGatewayAttachment { .. } => ResourceKind::InternetGatewayAttachment,
            Self::ElasticIp => ResourceKind::ElasticIp,
            Self::NatGateway { .. } => ResourceKind::NatGateway,
            Self::RouteTable { .. } => ResourceKind::RouteTable,
            Self::Route { .. } => ResourceKind::Route,
            Self::RouteTableAssociation { .. } => ResourceKind::RouteTableAssociation,
        }
    }
}

impl ResourceStatus {
    /// Maps a provider state name onto a status.
    #[must_use]
    pub fn from_state(state: &str, reason: Option<&str>) -> Self {
        match state {
            "available" | "active" | "associated" | "attached" => Self::Available,
            "pending" | "associating" | "attaching" => Self::Pending,
            _ => Self::Failed {
                state: state.to_string(),
                reason: reason.unwrap_or_default().to_string(),
            },
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Vpc => "VPC",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet gateway",
            Self::InternetGatewayAttachment => "gateway attachment",
            Self::ElasticIp => "elastic IP",
            Self::NatGateway => "NAT gateway",
            Self::RouteTable => "route table",
            Self::Route => "route",
            Self::RouteTableAssociation => "route table association",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Available => write!(f, "available"),
            Self::NotFound => write!(f, "not found"),
            Self::Failed { state, .. } => write!(f, "{state}"),
        }
    }
}

impl std::fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateVpc => write!(f, "create VPC"),
            Self::CreateSubnet { name } => write!(f, "create subnet {name}"),
            Self::CreateInternetGateway => write!(f, "create internet gateway"),
            Self::AttachInternetGateway => write!(f, "attach internet gateway"),
            Self::AllocateElasticIp => write!(f, "allocate elastic IP"),
            Self::CreateNatGateway => write!(f, "create NAT gateway"),
            Self::CreateRouteTable { visibility } => write!(f, "create {visibility} route table"),
            Self::CreateDefaultRoute { visibility } => {
                write!(f, "add default route to {visibility} route table")
            }
            Self::AssociateRouteTable { visibility, subnet } => {
                write!(f, "associate {visibility} route table with {subnet}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_id_combines_table_and_destination() {
        let id = ResourceId::route("rtb-0abc", Ipv4Cidr::ANY);
        assert_eq!(id.kind(), ResourceKind::Route);
        assert_eq!(id.as_str(), "rtb-0abc|0.0.0.0/0");
    }

    #[test]
    fn test_status_from_state() {
        assert_eq!(ResourceStatus::from_state("available", None), ResourceStatus::Available);
        assert_eq!(ResourceStatus::from_state("associated", None), ResourceStatus::Available);
        assert_eq!(ResourceStatus::from_state("pending", None), ResourceStatus::Pending);
        assert_eq!(
            ResourceStatus::from_state("failed", Some("Subnet has insufficient free addresses")),
            ResourceStatus::Failed {
                state: String::from("failed"),
                reason: String::from("Subnet has insufficient free addresses"),
            }
        );
        assert!(matches!(
            ResourceStatus::from_state("blackhole", None),
            ResourceStatus::Failed { ref state, .. } if state == "blackhole"
        ));
    }

    #[test]
    fn test_taggable_kinds() {
        assert!(ResourceKind::Vpc.is_taggable());
        assert!(ResourceKind::ElasticIp.is_taggable());
        assert!(!ResourceKind::Route.is_taggable());
        assert!(!ResourceKind::RouteTableAssociation.is_taggable());
    }

    #[test]
    fn test_request_kind() {
        let request = CreateRequest::NatGateway {
            subnet_id: String::from("subnet-1"),
            allocation_id: String::from("eipalloc-1"),
        };
        assert_eq!(request.kind(), ResourceKind::NatGateway);
        assert_eq!(CreateRequest::ElasticIp.kind(), ResourceKind::ElasticIp);
    }

    #[test]
    fn test_step_display() {
        assert_eq!(ProvisionStep::CreateNatGateway.to_string(), "create NAT gateway");
        assert_eq!(
            ProvisionStep::AssociateRouteTable {
                visibility: Visibility::Private,
                subnet: String::from("lab-private-subnet-2"),
            }
            .to_string(),
            "associate private route table with lab-private-subnet-2"
        );
    }
}
