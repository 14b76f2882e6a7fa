// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # VPC Provisioner
//!
//! Deterministic CIDR planning and dependency-ordered provisioning of an AWS
//! VPC with public and private subnets.
//!
//! ## Overview
//!
//! Given a VPC CIDR, a region and an ordered list of availability zones, the
//! provisioner:
//!
//! - Splits the VPC block into one public and one private subnet per zone
//! - Creates the VPC, subnets, internet gateway and a NAT gateway
//! - Routes public subnets to the internet gateway and private subnets to
//!   the NAT gateway
//!
//! Every step waits for its predecessor. The first failure aborts the run
//! and reports the resources that were already created.
//!
//! ## Modules
//!
//! - [`config`]: Environment parsing and validation
//! - [`planner`]: CIDR math, subnet planning and plan execution
//! - [`cloud`]: Cloud provider trait and the EC2 adapter
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```text
//! VPC_CIDR=10.0.0.0/16 AZ_LIST=us-east-1a,us-east-1b vpc-provisioner --dry-run
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod cloud;
pub mod config;
pub mod error;
pub mod planner;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, OutputFormatter};
pub use cloud::{CloudProvider, Ec2Provider, ResourceProvisioner};
pub use config::{ConfigParser, ConfigValidator, NetworkConfig};
pub use error::{ProvisionerError, Result};
pub use planner::{CidrPlanner, Ipv4Cidr, NetworkPlan, PlanExecutor, ProvisionReport};
