//! Cloud gateways: instance inventory, autoscaling groups, target groups
//!
//! The workflows only see the traits below. The AWS implementations live in
//! [`aws`] and are compiled with the `aws` feature; tests plug in fakes.

#[cfg(feature = "aws")]
pub mod aws;

use async_trait::async_trait;
use serde::Serialize;
use shardlift_common::{Error, Result, ScalingGroup, TargetGroupMember};
use std::sync::Arc;
use tracing::{info, warn};

/// Instance lookup by attribute
#[async_trait]
pub trait ComputeInventory: Send + Sync {
    /// Instance id whose private DNS name equals `dns_name`, if any
    async fn find_instance_by_private_dns(&self, dns_name: &str) -> Result<Option<String>>;
}

/// Autoscaling group operations
#[async_trait]
pub trait ScalingGroups: Send + Sync {
    async fn describe_group(&self, name: &str) -> Result<Option<ScalingGroup>>;

    async fn set_desired_capacity(&self, name: &str, capacity: i32) -> Result<()>;

    /// Detach the instance, optionally lowering the desired capacity by one
    async fn detach_instance(
        &self,
        name: &str,
        instance_id: &str,
        decrement_desired_capacity: bool,
    ) -> Result<()>;
}

/// Load-balancer target group operations
#[async_trait]
pub trait LoadBalancer: Send + Sync {
    async fn describe_target_health(&self, target_group_arn: &str) -> Result<Vec<TargetGroupMember>>;

    async fn deregister_target(&self, target_group_arn: &str, instance_id: &str) -> Result<()>;
}

/// Desired capacity before and after a scale-out request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityChange {
    pub previous: i32,
    pub target: i32,
}

/// Handles to every cloud gateway a workflow needs
#[derive(Clone)]
pub struct CloudContext {
    pub compute: Arc<dyn ComputeInventory>,
    pub scaling: Arc<dyn ScalingGroups>,
    pub load_balancer: Arc<dyn LoadBalancer>,
}

impl CloudContext {
    pub fn new(
        compute: Arc<dyn ComputeInventory>,
        scaling: Arc<dyn ScalingGroups>,
        load_balancer: Arc<dyn LoadBalancer>,
    ) -> Self {
        Self {
            compute,
            scaling,
            load_balancer,
        }
    }

    /// Build AWS-backed gateways from the ambient credential chain
    ///
    /// `region` overrides the region resolved from the environment.
    #[cfg(feature = "aws")]
    pub async fn from_aws(region: Option<String>) -> Self {
        let config = aws::load_config(region).await;

        Self::new(
            Arc::new(aws::AwsCompute::new(&config)),
            Arc::new(aws::AwsScalingGroups::new(&config)),
            Arc::new(aws::AwsLoadBalancer::new(&config)),
        )
    }

    /// Fetch the group, failing when it does not exist
    pub async fn require_group(&self, group: &str) -> Result<ScalingGroup> {
        self.scaling
            .describe_group(group)
            .await?
            .ok_or_else(|| Error::not_found("auto scaling group", group))
    }

    /// Raise the desired capacity of `group` by `delta`
    pub async fn increase_desired_capacity(&self, group: &str, delta: i32) -> Result<CapacityChange> {
        let current = self.require_group(group).await?;

        let target = current.desired_capacity.checked_add(delta).ok_or_else(|| {
            Error::Config(format!(
                "desired capacity {} + {} overflows",
                current.desired_capacity, delta
            ))
        })?;

        self.scaling.set_desired_capacity(group, target).await?;
        info!(
            "Desired capacity of {} changed from {} to {}",
            group, current.desired_capacity, target
        );

        Ok(CapacityChange {
            previous: current.desired_capacity,
            target,
        })
    }

    /// Map a cluster node name (its private DNS name) to an instance id
    pub async fn resolve_instance_id(&self, dns_name: &str) -> Result<String> {
        self.compute
            .find_instance_by_private_dns(dns_name)
            .await?
            .ok_or_else(|| Error::not_found("instance", dns_name))
    }

    /// The target group attached to `group`
    ///
    /// Only the first attached group is used when there are several.
    pub async fn resolve_target_group(&self, group: &str) -> Result<String> {
        let arns = self.require_group(group).await?.target_group_arns;

        if arns.len() > 1 {
            warn!(
                "{} target groups are attached to {}, using {}",
                arns.len(),
                group,
                arns[0]
            );
        }

        arns.into_iter()
            .next()
            .ok_or_else(|| Error::not_found("target group", group))
    }

    /// Instance ids currently registered in the target group, in any state
    pub async fn target_instance_ids(&self, target_group_arn: &str) -> Result<Vec<String>> {
        Ok(self
            .load_balancer
            .describe_target_health(target_group_arn)
            .await?
            .into_iter()
            .map(|member| member.instance_id)
            .collect())
    }
}

impl std::fmt::Debug for CloudContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudContext").finish_non_exhaustive()
    }
}
