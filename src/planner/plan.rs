//! Network plan types and CIDR planning.
//!
//! This module turns a VPC CIDR and an availability-zone list into an ordered
//! set of disjoint public and private subnets, and derives the name tag of
//! every resource the provisioner will create.

use serde::Serialize;
use tracing::debug;

use crate::config::NetworkConfig;
use crate::error::CapacityError;

use super::cidr::Ipv4Cidr;

/// Longest subnet prefix AWS accepts (16 addresses).
pub const MIN_SUBNET_PREFIX: u8 = 28;

/// Minimum number of bits the default policy splits the VPC by.
///
/// A /16 VPC is cut into /20 blocks, leaving room for later subnets.
const DEFAULT_SPLIT_BITS: u8 = 4;

/// Whether a subnet routes through the internet gateway or the NAT gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Routed to the internet gateway.
    Public,
    /// Routed to the NAT gateway.
    Private,
}

/// A single planned subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetSpec {
    /// Availability zone.
    pub availability_zone: String,
    /// CIDR block.
    pub cidr: Ipv4Cidr,
    /// Public or private.
    pub visibility: Visibility,
    /// 1-based position within its visibility group.
    pub index: usize,
    /// Name tag.
    pub name: String,
}

/// A complete, immutable network plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkPlan {
    /// VPC CIDR block.
    pub vpc_cidr: Ipv4Cidr,
    /// Target region.
    pub region: String,
    /// Ordered availability zones.
    pub availability_zones: Vec<String>,
    /// Prefix applied to every name tag.
    pub tag_prefix: String,
    /// Subnet prefix length chosen by the planner.
    pub subnet_prefix: u8,
    /// Planned subnets: all public subnets first, then all private ones.
    pub subnets: Vec<SubnetSpec>,
}

/// Computes subnet layouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct CidrPlanner {
    /// Explicit subnet prefix, overriding the default sizing rule.
    subnet_prefix: Option<u8>,
}

impl CidrPlanner {
    /// Creates a planner using the default sizing rule.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subnet_prefix: None,
        }
    }

    /// Forces every subnet to the given prefix length.
    #[must_use]
    pub const fn with_subnet_prefix(mut self, prefix: Option<u8>) -> Self {
        self.subnet_prefix = prefix;
        self
    }

    /// Builds the plan for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the VPC cannot hold one public and one
    /// private subnet per availability zone.
    pub fn plan(&self, config: &NetworkConfig) -> Result<NetworkPlan, CapacityError> {
        let blocks = self.subdivide(config.vpc_cidr, config.availability_zones.len())?;
        let subnet_prefix = blocks.first().map_or(config.vpc_cidr.prefix_len(), Ipv4Cidr::prefix_len);

        let zone_count = config.availability_zones.len();
        let subnets = blocks
            .into_iter()
            .enumerate()
            .map(|(i, cidr)| {
                let (visibility, zone_idx) = if i < zone_count {
                    (Visibility::Public, i)
                } else {
                    (Visibility::Private, i - zone_count)
                };
                SubnetSpec {
                    availability_zone: config.availability_zones[zone_idx].clone(),
                    cidr,
                    visibility,
                    index: zone_idx + 1,
                    name: subnet_name(&config.tag_prefix, visibility, zone_idx + 1),
                }
            })
            .collect();

        Ok(NetworkPlan {
            vpc_cidr: config.vpc_cidr,
            region: config.region.clone(),
            availability_zones: config.availability_zones.clone(),
            tag_prefix: config.tag_prefix.clone(),
            subnet_prefix,
            subnets,
        })
    }

    /// Splits the VPC CIDR into `2 * zone_count` equal, disjoint blocks.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the blocks do not fit.
    pub fn subdivide(
        &self,
        vpc_cidr: Ipv4Cidr,
        zone_count: usize,
    ) -> Result<Vec<Ipv4Cidr>, CapacityError> {
        if zone_count == 0 {
            return Err(CapacityError::NoAvailabilityZones);
        }

        let requested = zone_count * 2;
        let split_bits = split_bits_for(requested);
        let needed_prefix = u32::from(vpc_cidr.prefix_len()) + u32::from(split_bits);

        let subnet_prefix = match self.subnet_prefix {
            Some(prefix) => {
                if prefix < vpc_cidr.prefix_len() || prefix > MIN_SUBNET_PREFIX {
                    return Err(CapacityError::InvalidSubnetPrefix {
                        vpc_cidr: vpc_cidr.to_string(),
                        subnet_prefix: prefix,
                    });
                }
                if u32::from(prefix) < needed_prefix {
                    return Err(CapacityError::SubnetPrefixTooShort {
                        vpc_cidr: vpc_cidr.to_string(),
                        subnet_prefix: prefix,
                        available: vpc_cidr.subnet_count(prefix).unwrap_or(0),
                        requested,
                    });
                }
                prefix
            }
            None => {
                if needed_prefix > u32::from(MIN_SUBNET_PREFIX) {
                    return Err(CapacityError::InsufficientAddressSpace {
                        vpc_cidr: vpc_cidr.to_string(),
                        requested,
                        min_subnet_prefix: MIN_SUBNET_PREFIX,
                    });
                }
                let with_headroom =
                    vpc_cidr.prefix_len() + split_bits.max(DEFAULT_SPLIT_BITS);
                with_headroom.min(MIN_SUBNET_PREFIX)
            }
        };

        debug!(
            "Splitting {} into /{} blocks for {} subnets",
            vpc_cidr, subnet_prefix, requested
        );

        let blocks: Vec<Ipv4Cidr> = vpc_cidr.subnets(subnet_prefix).take(requested).collect();
        if blocks.len() < requested {
            return Err(CapacityError::InsufficientAddressSpace {
                vpc_cidr: vpc_cidr.to_string(),
                requested,
                min_subnet_prefix: MIN_SUBNET_PREFIX,
            });
        }

        Ok(blocks)
    }
}

/// Number of bits needed to address `count` blocks (next power of two).
fn split_bits_for(count: usize) -> u8 {
    let rounded = count.max(1).next_power_of_two();
    u8::try_from(rounded.trailing_zeros()).unwrap_or(u8::MAX)
}

fn subnet_name(prefix: &str, visibility: Visibility, index: usize) -> String {
    format!("{prefix}-{visibility}-subnet-{index}")
}

impl NetworkPlan {
    /// Returns the public subnets in AZ order.
    pub fn public_subnets(&self) -> impl Iterator<Item = &SubnetSpec> {
        self.subnets_by(Visibility::Public)
    }

    /// Returns the private subnets in AZ order.
    pub fn private_subnets(&self) -> impl Iterator<Item = &SubnetSpec> {
        self.subnets_by(Visibility::Private)
    }

    /// Returns the subnets of one visibility in AZ order.
    pub fn subnets_by(&self, visibility: Visibility) -> impl Iterator<Item = &SubnetSpec> {
        self.subnets
            .iter()
            .filter(move |s| s.visibility == visibility)
    }

    /// Name tag of the VPC.
    #[must_use]
    pub fn vpc_name(&self) -> String {
        self.tag_prefix.clone()
    }

    /// Name tag of the internet gateway.
    #[must_use]
    pub fn internet_gateway_name(&self) -> String {
        format!("{}-igw", self.tag_prefix)
    }

    /// Name tag of the NAT gateway's elastic IP.
    #[must_use]
    pub fn elastic_ip_name(&self) -> String {
        format!("{}-nat-eip", self.tag_prefix)
    }

    /// Name tag of the NAT gateway.
    #[must_use]
    pub fn nat_gateway_name(&self) -> String {
        format!("{}-nat", self.tag_prefix)
    }

    /// Name tag of a route table.
    #[must_use]
    pub fn route_table_name(&self, visibility: Visibility) -> String {
        format!("{}-{visibility}-rt", self.tag_prefix)
    }

    /// Returns the number of subnets.
    #[must_use]
    pub const fn subnet_count(&self) -> usize {
        self.subnets.len()
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Public => "public",
            Self::Private => "private",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for SubnetSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} in {} ({})",
            self.name, self.cidr, self.availability_zone, self.visibility
        )
    }
}

impl std::fmt::Display for NetworkPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Network Plan for {} ({}) in {}:",
            self.vpc_name(),
            self.vpc_cidr,
            self.region
        )?;
        for (i, subnet) in self.subnets.iter().enumerate() {
            writeln!(f, "  {i}. {subnet}")?;
        }
        Ok(())
    }
}
