//! IPv4 CIDR block arithmetic.
//!
//! Provides the network/prefix type used for VPC and subnet ranges, with
//! containment, overlap and equal-size subdivision.

use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::ConfigError;

/// An IPv4 network in CIDR notation (`10.0.0.0/16`).
///
/// The network address never has host bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ipv4Cidr {
    /// Network address.
    network: Ipv4Addr,
    /// Prefix length (0-32).
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// Longest valid IPv4 prefix.
    pub const MAX_PREFIX_LEN: u8 = 32;

    /// The whole IPv4 address space, used as a default-route destination.
    pub const ANY: Self = Self {
        network: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };

    /// Creates a CIDR block from a network address and prefix length.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix exceeds 32 or the address has host bits set.
    pub fn new(network: Ipv4Addr, prefix_len: u8) -> Result<Self, ConfigError> {
        if prefix_len > Self::MAX_PREFIX_LEN {
            return Err(ConfigError::InvalidCidr {
                value: format!("{network}/{prefix_len}"),
                reason: format!("prefix length must be at most {}", Self::MAX_PREFIX_LEN),
            });
        }

        let bits = u32::from(network);
        if bits & !mask(prefix_len) != 0 {
            return Err(ConfigError::InvalidCidr {
                value: format!("{network}/{prefix_len}"),
                reason: format!(
                    "host bits are set (did you mean {}/{prefix_len}?)",
                    Ipv4Addr::from(bits & mask(prefix_len))
                ),
            });
        }

        Ok(Self {
            network,
            prefix_len,
        })
    }

    /// Returns the network address.
    #[must_use]
    pub const fn network(&self) -> Ipv4Addr {
        self.network
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns true if `other` lies entirely within this block.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.prefix_len >= self.prefix_len
            && u32::from(other.network) & mask(self.prefix_len) == self.first()
    }

    /// Returns true if `other` is contained in this block and is smaller.
    #[must_use]
    pub fn strictly_contains(&self, other: &Self) -> bool {
        self.contains(other) && other.prefix_len > self.prefix_len
    }

    /// Returns true if the two blocks share at least one address.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }

    /// Returns the number of blocks of `new_prefix` this block splits into.
    ///
    /// Returns `None` if `new_prefix` is shorter than this block's prefix or
    /// longer than 32.
    #[must_use]
    pub const fn subnet_count(&self, new_prefix: u8) -> Option<u64> {
        if new_prefix < self.prefix_len || new_prefix > Self::MAX_PREFIX_LEN {
            return None;
        }
        Some(1u64 << (new_prefix - self.prefix_len))
    }

    /// Returns the `index`-th block of `new_prefix` inside this block.
    #[must_use]
    pub fn nth_subnet(&self, new_prefix: u8, index: u64) -> Option<Self> {
        let count = self.subnet_count(new_prefix)?;
        if index >= count {
            return None;
        }

        let step = 1u64 << (Self::MAX_PREFIX_LEN - new_prefix);
        let start = u64::from(self.first()) + index * step;
        let network = Ipv4Addr::from(u32::try_from(start).ok()?);

        Some(Self {
            network,
            prefix_len: new_prefix,
        })
    }

    /// Iterates over every block of `new_prefix` inside this block, in address order.
    pub fn subnets(&self, new_prefix: u8) -> impl Iterator<Item = Self> + '_ {
        let count = self.subnet_count(new_prefix).unwrap_or(0);
        (0..count).filter_map(move |i| self.nth_subnet(new_prefix, i))
    }

    fn first(&self) -> u32 {
        u32::from(self.network)
    }

    fn last(&self) -> u32 {
        self.first() | !mask(self.prefix_len)
    }
}

/// Returns the netmask for a prefix length as an integer.
const fn mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (Ipv4Cidr::MAX_PREFIX_LEN - prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: &str| ConfigError::InvalidCidr {
            value: trimmed.to_string(),
            reason: reason.to_string(),
        };

        let (addr, prefix) = trimmed
            .split_once('/')
            .ok_or_else(|| invalid("expected <address>/<prefix>"))?;

        let network: Ipv4Addr = addr
            .parse()
            .map_err(|_| invalid("network address is not a valid IPv4 address"))?;
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| invalid("prefix length is not a number"))?;

        Self::new(network, prefix_len)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(s: &str) -> Ipv4Cidr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let block = cidr("10.0.0.0/16");
        assert_eq!(block.network(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(block.prefix_len(), 16);
        assert_eq!(block.to_string(), "10.0.0.0/16");
        assert_eq!(cidr(" 192.168.1.0/24 ").to_string(), "192.168.1.0/24");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("10.0.0.0".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0/16".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.0/33".parse::<Ipv4Cidr>().is_err());
        assert!("10.0.0.0/abc".parse::<Ipv4Cidr>().is_err());
        assert!("".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn test_parse_rejects_host_bits() {
        let err = "10.0.0.1/16".parse::<Ipv4Cidr>().unwrap_err();
        assert!(err.to_string().contains("10.0.0.0/16"));
    }

    #[test]
    fn test_contains_and_overlaps() {
        let vpc = cidr("10.0.0.0/16");
        let inner = cidr("10.0.16.0/20");
        let outside = cidr("10.1.0.0/20");

        assert!(vpc.contains(&inner));
        assert!(vpc.strictly_contains(&inner));
        assert!(vpc.contains(&vpc));
        assert!(!vpc.strictly_contains(&vpc));
        assert!(!vpc.contains(&outside));
        assert!(!inner.contains(&vpc));

        assert!(vpc.overlaps(&inner));
        assert!(!inner.overlaps(&cidr("10.0.32.0/20")));
        assert!(Ipv4Cidr::ANY.contains(&vpc));
    }

    #[test]
    fn test_subnets_in_address_order() {
        let blocks: Vec<String> = cidr("10.0.0.0/22")
            .subnets(24)
            .map(|b| b.to_string())
            .collect();
        assert_eq!(
            blocks,
            vec!["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"]
        );
    }

    #[test]
    fn test_subnet_bounds() {
        let block = cidr("10.0.0.0/16");
        assert_eq!(block.subnet_count(15), None);
        assert_eq!(block.subnet_count(33), None);
        assert_eq!(block.subnet_count(16), Some(1));
        assert_eq!(block.subnet_count(20), Some(16));
        assert_eq!(block.nth_subnet(20, 16), None);
        assert_eq!(block.nth_subnet(20, 15), Some(cidr("10.0.240.0/20")));
        assert_eq!(cidr("255.255.255.0/24").nth_subnet(32, 255), Some(cidr("255.255.255.255/32")));
    }
}
