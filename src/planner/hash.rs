//! Plan fingerprinting.
//!
//! A fingerprint identifies the exact layout a run was provisioned from. It
//! is written to every tagged resource so partially created networks can be
//! traced back to their plan.

use sha2::{Digest, Sha256};

use super::plan::NetworkPlan;

/// Length of the short fingerprint used in tags.
pub const SHORT_HASH_LEN: usize = 12;

/// Hasher for computing network plan fingerprints.
#[derive(Debug, Default)]
pub struct PlanHasher;

impl PlanHasher {
    /// Creates a new plan hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the full hex SHA-256 fingerprint of a plan.
    #[must_use]
    pub fn hash_plan(&self, plan: &NetworkPlan) -> String {
        let mut hasher = Sha256::new();

        hasher.update(plan.region.as_bytes());
        hasher.update(plan.vpc_cidr.to_string().as_bytes());
        hasher.update(plan.tag_prefix.as_bytes());

        for subnet in &plan.subnets {
            hasher.update(b"\0");
            hasher.update(subnet.availability_zone.as_bytes());
            hasher.update(subnet.cidr.to_string().as_bytes());
            hasher.update(subnet.visibility.to_string().as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes the short fingerprint used in resource tags.
    #[must_use]
    pub fn short_hash(&self, plan: &NetworkPlan) -> String {
        let mut hash = self.hash_plan(plan);
        hash.truncate(SHORT_HASH_LEN);
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkConfig, WaitConfig};
    use crate::planner::CidrPlanner;

    fn plan_for(cidr: &str, zones: &[&str]) -> NetworkPlan {
        let config = NetworkConfig {
            vpc_cidr: cidr.parse().unwrap(),
            region: String::from("us-east-1"),
            availability_zones: zones.iter().map(|z| (*z).to_string()).collect(),
            tag_prefix: String::from("lab"),
            subnet_prefix: None,
            wait: WaitConfig::default(),
        };
        CidrPlanner::new().plan(&config).unwrap()
    }

    #[test]
    fn test_hash_deterministic() {
        let hasher = PlanHasher::new();
        let a = plan_for("10.0.0.0/16", &["us-east-1a", "us-east-1b"]);
        let b = plan_for("10.0.0.0/16", &["us-east-1a", "us-east-1b"]);
        assert_eq!(hasher.hash_plan(&a), hasher.hash_plan(&b));
        assert_eq!(hasher.hash_plan(&a).len(), 64);
    }

    #[test]
    fn test_hash_changes_with_layout() {
        let hasher = PlanHasher::new();
        let a = plan_for("10.0.0.0/16", &["us-east-1a", "us-east-1b"]);
        let b = plan_for("10.0.0.0/16", &["us-east-1b", "us-east-1a"]);
        let c = plan_for("10.1.0.0/16", &["us-east-1a", "us-east-1b"]);
        assert_ne!(hasher.hash_plan(&a), hasher.hash_plan(&b));
        assert_ne!(hasher.hash_plan(&a), hasher.hash_plan(&c));
    }

    #[test]
    fn test_short_hash_is_prefix() {
        let hasher = PlanHasher::new();
        let plan = plan_for("10.0.0.0/16", &["us-east-1a"]);
        let short = hasher.short_hash(&plan);
        assert_eq!(short.len(), SHORT_HASH_LEN);
        assert!(hasher.hash_plan(&plan).starts_with(&short));
    }
}
