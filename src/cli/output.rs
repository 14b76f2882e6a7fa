//! Output formatting for the CLI.
//!
//! Renders plans, reports and failures as colored text tables or JSON.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::cloud::ProvisionedResource;
use crate::error::ProvisionerError;
use crate::planner::{NetworkPlan, ProvisionReport, Visibility};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Planned subnet row for table display.
#[derive(Tabled)]
struct SubnetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    visibility: String,
    #[tabled(rename = "Zone")]
    zone: String,
    #[tabled(rename = "CIDR")]
    cidr: String,
}

/// Created resource row for table display.
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a network plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &NetworkPlan, plan_hash: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "plan_hash": plan_hash,
                "plan": plan,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan, plan_hash),
        }
    }

    fn format_plan_text(plan: &NetworkPlan, plan_hash: &str) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "\n{} {} ({}) in {}",
            "Network Plan:".bold(),
            plan.vpc_name(),
            plan.vpc_cidr,
            plan.region
        );
        let _ = writeln!(output, "   Plan hash: {plan_hash}");
        let _ = writeln!(output, "   Subnet size: /{}\n", plan.subnet_prefix);

        let rows: Vec<SubnetRow> = plan
            .subnets
            .iter()
            .map(|s| SubnetRow {
                name: s.name.clone(),
                visibility: s.visibility.to_string(),
                zone: s.availability_zone.clone(),
                cidr: s.cidr.to_string(),
            })
            .collect();
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = writeln!(output, "\nGateways and routing:");
        for name in [
            plan.internet_gateway_name(),
            plan.elastic_ip_name(),
            plan.nat_gateway_name(),
            plan.route_table_name(Visibility::Public),
            plan.route_table_name(Visibility::Private),
        ] {
            let _ = writeln!(output, "   {} {name}", "+".green());
        }

        output
    }

    /// Formats the report of a completed run.
    #[must_use]
    pub fn format_report(&self, report: &ProvisionReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "\n{} {report}", "✓".green());
                let _ = writeln!(output, "   Run ID: {}", report.run_id);
                let _ = writeln!(output, "   Plan hash: {}\n", report.plan_hash);
                output.push_str(&Self::resource_table(&report.resources));
                output.push('\n');
                output
            }
        }
    }

    /// Formats a fatal error, including any resources left behind.
    #[must_use]
    pub fn format_failure(&self, error: &ProvisionerError) -> String {
        match self.format {
            OutputFormat::Json => Self::format_failure_json(error),
            OutputFormat::Text => Self::format_failure_text(error),
        }
    }

    fn format_failure_text(error: &ProvisionerError) -> String {
        let mut output = String::new();

        match error {
            ProvisionerError::StepFailed {
                step,
                last_completed,
                created,
                source,
            } => {
                let _ = writeln!(output, "{} Provisioning aborted", "✗".red());
                let _ = writeln!(output, "   Failed step: {step}");
                let _ = writeln!(
                    output,
                    "   Last completed: {}",
                    last_completed
                        .as_ref()
                        .map_or_else(|| String::from("none"), ToString::to_string)
                );
                let _ = writeln!(output, "   Error: {source}");

                if !created.is_empty() {
                    let _ = writeln!(
                        output,
                        "\n{} {} resources were created and left in place:\n",
                        "⚠".yellow(),
                        created.len()
                    );
                    output.push_str(&Self::resource_table(created));
                    output.push('\n');
                }
            }
            other => {
                let _ = writeln!(output, "{} {other}", "✗".red());
            }
        }

        output
    }

    fn format_failure_json(error: &ProvisionerError) -> String {
        let mut json = serde_json::json!({
            "status": "error",
            "exit_code": error.exit_code(),
            "message": error.to_string(),
        });

        if let ProvisionerError::StepFailed {
            step,
            last_completed,
            created,
            ..
        } = error
        {
            json["step"] = serde_json::json!(step.to_string());
            json["last_completed"] = serde_json::json!(last_completed.as_ref().map(ToString::to_string));
            json["orphaned"] = serde_json::json!(created);
        }

        serde_json::to_string_pretty(&json).unwrap_or_default()
    }

    fn resource_table(resources: &[ProvisionedResource]) -> String {
        let rows: Vec<ResourceRow> = resources
            .iter()
            .map(|r| ResourceRow {
                kind: r.kind.to_string(),
                id: r.id.clone(),
                name: r.name.clone().unwrap_or_else(|| String::from("-")),
            })
            .collect();
        Table::new(rows).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{ProvisionStep, ResourceKind};
    use crate::config::{NetworkConfig, WaitConfig};
    use crate::error::ProviderError;
    use crate::planner::CidrPlanner;

    fn plan() -> NetworkPlan {
        let config = NetworkConfig {
            vpc_cidr: "10.0.0.0/16".parse().unwrap(),
            region: String::from("us-east-1"),
            availability_zones: vec![String::from("us-east-1a"), String::from("us-east-1b")],
            tag_prefix: String::from("lab"),
            subnet_prefix: None,
            wait: WaitConfig::default(),
        };
        CidrPlanner::new().plan(&config).unwrap()
    }

    fn step_failure() -> ProvisionerError {
        ProvisionerError::StepFailed {
            step: ProvisionStep::CreateNatGateway,
            last_completed: Some(ProvisionStep::AllocateElasticIp),
            created: vec![ProvisionedResource {
                kind: ResourceKind::Vpc,
                id: String::from("vpc-0abc"),
                name: Some(String::from("lab")),
                step: ProvisionStep::CreateVpc,
            }],
            source: ProviderError::api_error("CreateNatGateway", "InvalidSubnet", "bad subnet"),
        }
    }

    #[test]
    fn test_plan_text_lists_subnets() {
        let text = OutputFormatter::new(OutputFormat::Text).format_plan(&plan(), "abc123");
        assert!(text.contains("lab-public-subnet-1"));
        assert!(text.contains("10.0.48.0/20"));
        assert!(text.contains("lab-nat"));
        assert!(text.contains("abc123"));
    }

    #[test]
    fn test_plan_json() {
        let json = OutputFormatter::new(OutputFormat::Json).format_plan(&plan(), "abc123");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["plan_hash"], "abc123");
        assert_eq!(value["plan"]["subnets"][2]["cidr"], "10.0.32.0/20");
        assert_eq!(value["plan"]["subnets"][2]["visibility"], "private");
    }

    #[test]
    fn test_failure_text_lists_orphans() {
        let text = OutputFormatter::new(OutputFormat::Text).format_failure(&step_failure());
        assert!(text.contains("Failed step: create NAT gateway"));
        assert!(text.contains("Last completed: allocate elastic IP"));
        assert!(text.contains("vpc-0abc"));
    }

    #[test]
    fn test_failure_json() {
        let json = OutputFormatter::new(OutputFormat::Json).format_failure(&step_failure());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["exit_code"], 4);
        assert_eq!(value["last_completed"], "allocate elastic IP");
        assert_eq!(value["orphaned"][0]["id"], "vpc-0abc");
    }
}
