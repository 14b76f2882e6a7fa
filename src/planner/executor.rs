//! Plan executor for provisioning network plans.
//!
//! Resources are created strictly in dependency order: VPC, subnets,
//! internet gateway, NAT gateway, route tables, routes and associations.
//! The first failure aborts the run. Nothing is rolled back; the error
//! carries every resource created so far.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::cloud::{
    CreateRequest, ProvisionStep, ProvisionedResource, ResourceKind, ResourceProvisioner,
    RouteTarget,
};
use crate::error::{CapacityError, ProviderError, ProvisionerError, Result};

use super::cidr::Ipv4Cidr;
use super::hash::PlanHasher;
use super::plan::{NetworkPlan, Visibility};

/// Tag key carrying the run identifier.
pub const RUN_ID_TAG: &str = "provisioner:run-id";

/// Tag key carrying the short plan fingerprint.
pub const PLAN_TAG: &str = "provisioner:plan";

/// Executor for network plans.
#[derive(Debug)]
pub struct PlanExecutor<'a> {
    /// Resource provisioner.
    provisioner: &'a ResourceProvisioner<'a>,
    /// Identifier of this run, written to every tagged resource.
    run_id: Uuid,
}

/// Result of a completed provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Short plan fingerprint.
    pub plan_hash: String,
    /// Region the network was created in.
    pub region: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Completed steps in execution order.
    pub steps: Vec<ProvisionStep>,
    /// Created resources in creation order.
    pub resources: Vec<ProvisionedResource>,
}

/// Progress of a run in flight.
struct RunLog {
    tags: Vec<(String, String)>,
    completed: Vec<ProvisionStep>,
    created: Vec<ProvisionedResource>,
}

impl RunLog {
    fn new(run_id: Uuid, plan_hash: &str) -> Self {
        Self {
            tags: vec![
                (RUN_ID_TAG.to_string(), run_id.to_string()),
                (PLAN_TAG.to_string(), plan_hash.to_string()),
            ],
            completed: Vec::new(),
            created: Vec::new(),
        }
    }

    fn tags_for(&self, name: &str) -> Vec<(String, String)> {
        let mut tags = Vec::with_capacity(self.tags.len() + 1);
        tags.push((String::from("Name"), name.to_string()));
        tags.extend(self.tags.iter().cloned());
        tags
    }

    fn abort(&mut self, step: ProvisionStep, source: ProviderError) -> ProvisionerError {
        error!("Step '{step}' failed: {source}");
        ProvisionerError::StepFailed {
            step,
            last_completed: self.completed.last().cloned(),
            created: std::mem::take(&mut self.created),
            source,
        }
    }
}

impl<'a> PlanExecutor<'a> {
    /// Creates a new plan executor.
    #[must_use]
    pub const fn new(provisioner: &'a ResourceProvisioner<'a>, run_id: Uuid) -> Self {
        Self {
            provisioner,
            run_id,
        }
    }

    /// Provisions every resource of a plan.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionerError::StepFailed`] on the first failing step,
    /// carrying the resources created before it.
    pub async fn execute(&self, plan: &NetworkPlan) -> Result<ProvisionReport> {
        if plan.public_subnets().next().is_none() {
            return Err(CapacityError::NoAvailabilityZones.into());
        }

        let started_at = Utc::now();
        let plan_hash = PlanHasher::new().short_hash(plan);
        let mut run = RunLog::new(self.run_id, &plan_hash);

        info!(
            "Provisioning {} ({}) in {} [run {}, plan {}]",
            plan.vpc_name(),
            plan.vpc_cidr,
            plan.region,
            self.run_id,
            plan_hash
        );

        let vpc_id = self
            .run_step(
                &mut run,
                ProvisionStep::CreateVpc,
                &CreateRequest::Vpc {
                    cidr: plan.vpc_cidr,
                },
                Some(plan.vpc_name()),
                true,
            )
            .await?;

        let mut subnet_ids = Vec::with_capacity(plan.subnet_count());
        for subnet in &plan.subnets {
            let subnet_id = self
                .run_step(
                    &mut run,
                    ProvisionStep::CreateSubnet {
                        name: subnet.name.clone(),
                    },
                    &CreateRequest::Subnet {
                        vpc_id: vpc_id.clone(),
                        cidr: subnet.cidr,
                        availability_zone: subnet.availability_zone.clone(),
                    },
                    Some(subnet.name.clone()),
                    false,
                )
                .await?;
            subnet_ids.push((subnet, subnet_id));
        }

        let igw_id = self
            .run_step(
                &mut run,
                ProvisionStep::CreateInternetGateway,
                &CreateRequest::InternetGateway,
                Some(plan.internet_gateway_name()),
                false,
            )
            .await?;

        self.run_step(
            &mut run,
            ProvisionStep::AttachInternetGateway,
            &CreateRequest::InternetGatewayAttachment {
                gateway_id: igw_id.clone(),
                vpc_id: vpc_id.clone(),
            },
            None,
            false,
        )
        .await?;

        let allocation_id = self
            .run_step(
                &mut run,
                ProvisionStep::AllocateElasticIp,
                &CreateRequest::ElasticIp,
                Some(plan.elastic_ip_name()),
                false,
            )
            .await?;

        let nat_subnet_id = subnet_ids
            .iter()
            .find(|(subnet, _)| subnet.visibility == Visibility::Public)
            .map(|(_, id)| id.clone())
            .ok_or_else(|| ProvisionerError::internal("plan has no public subnet"))?;

        let nat_id = self
            .run_step(
                &mut run,
                ProvisionStep::CreateNatGateway,
                &CreateRequest::NatGateway {
                    subnet_id: nat_subnet_id,
                    allocation_id,
                },
                Some(plan.nat_gateway_name()),
                true,
            )
            .await?;

        let public_rt = self
            .route_table(
                &mut run,
                plan,
                &vpc_id,
                Visibility::Public,
                RouteTarget::InternetGateway(igw_id),
            )
            .await?;
        let private_rt = self
            .route_table(
                &mut run,
                plan,
                &vpc_id,
                Visibility::Private,
                RouteTarget::NatGateway(nat_id),
            )
            .await?;

        for (subnet, subnet_id) in &subnet_ids {
            let route_table_id = match subnet.visibility {
                Visibility::Public => &public_rt,
                Visibility::Private => &private_rt,
            };
            self.run_step(
                &mut run,
                ProvisionStep::AssociateRouteTable {
                    visibility: subnet.visibility,
                    subnet: subnet.name.clone(),
                },
                &CreateRequest::RouteTableAssociation {
                    route_table_id: route_table_id.clone(),
                    subnet_id: subnet_id.clone(),
                },
                None,
                false,
            )
            .await?;
        }

        let report = ProvisionReport {
            run_id: self.run_id,
            plan_hash,
            region: plan.region.clone(),
            started_at,
            finished_at: Utc::now(),
            steps: run.completed,
            resources: run.created,
        };

        info!("{report}");
        Ok(report)
    }

    /// Creates a route table and its default route.
    async fn route_table(
        &self,
        run: &mut RunLog,
        plan: &NetworkPlan,
        vpc_id: &str,
        visibility: Visibility,
        target: RouteTarget,
    ) -> Result<String> {
        let route_table_id = self
            .run_step(
                run,
                ProvisionStep::CreateRouteTable { visibility },
                &CreateRequest::RouteTable {
                    vpc_id: vpc_id.to_string(),
                },
                Some(plan.route_table_name(visibility)),
                false,
            )
            .await?;

        self.run_step(
            run,
            ProvisionStep::CreateDefaultRoute { visibility },
            &CreateRequest::Route {
                route_table_id: route_table_id.clone(),
                destination: Ipv4Cidr::ANY,
                target,
            },
            None,
            false,
        )
        .await?;

        Ok(route_table_id)
    }

    /// Runs one step: create, record, tag, optionally wait.
    ///
    /// The resource is recorded as soon as it exists so a later tagging or
    /// readiness failure still reports it.
    async fn run_step(
        &self,
        run: &mut RunLog,
        step: ProvisionStep,
        request: &CreateRequest,
        name: Option<String>,
        wait: bool,
    ) -> Result<String> {
        info!("Step: {step}");

        let id = match self.provisioner.create(request).await {
            Ok(id) => id,
            Err(e) => return Err(run.abort(step, e)),
        };

        run.created.push(ProvisionedResource {
            kind: id.kind(),
            id: id.as_str().to_string(),
            name: name.clone(),
            step: step.clone(),
        });

        if let Some(name) = name.filter(|_| id.kind().is_taggable()) {
            let tags = run.tags_for(&name);
            if let Err(e) = self.provisioner.apply_tags(&id, &tags).await {
                return Err(run.abort(step, e));
            }
        }

        if wait {
            if let Err(e) = self.provisioner.wait_until_available(&id).await {
                return Err(run.abort(step, e));
            }
        }

        run.completed.push(step);
        Ok(id.as_str().to_string())
    }
}

impl ProvisionReport {
    /// Returns the first created resource of a kind.
    #[must_use]
    pub fn resource(&self, kind: ResourceKind) -> Option<&ProvisionedResource> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Returns every created resource of a kind.
    pub fn resources_of(&self, kind: ResourceKind) -> impl Iterator<Item = &ProvisionedResource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    /// Returns the VPC identifier.
    #[must_use]
    pub fn vpc_id(&self) -> Option<&str> {
        self.resource(ResourceKind::Vpc).map(|r| r.id.as_str())
    }

    /// Returns the run duration in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

impl std::fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Provisioned {} resources in {} steps ({}s)",
            self.resources.len(),
            self.steps.len(),
            self.duration_secs()
        )
    }
}
