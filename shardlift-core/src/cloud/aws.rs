//! AWS gateways: EC2, Auto Scaling and ELBv2
//!
//! Every call is a single SDK request. Pagination is not followed; the
//! filters used here select at most a handful of resources.

use super::{ComputeInventory, LoadBalancer, ScalingGroups};
use crate::log_cloud_call;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use shardlift_common::{Error, Result, ScalingGroup, TargetGroupMember, TargetHealthState};

/// Resolve credentials and region the way the AWS CLI does
pub async fn load_config(region: Option<String>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region));
    }
    loader.load().await
}

#[derive(Debug, Clone)]
pub struct AwsCompute {
    client: aws_sdk_ec2::Client,
}

impl AwsCompute {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ec2::Client::new(config),
        }
    }
}

#[async_trait]
impl ComputeInventory for AwsCompute {
    async fn find_instance_by_private_dns(&self, dns_name: &str) -> Result<Option<String>> {
        log_cloud_call!("DescribeInstances", private_dns_name = dns_name);

        let filter = aws_sdk_ec2::types::Filter::builder()
            .name("private-dns-name")
            .values(dns_name)
            .build();

        let output = self
            .client
            .describe_instances()
            .filters(filter)
            .send()
            .await
            .map_err(|e| Error::cloud("DescribeInstances", e))?;

        Ok(output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .find_map(|instance| instance.instance_id())
            .map(str::to_string))
    }
}

#[derive(Debug, Clone)]
pub struct AwsScalingGroups {
    client: aws_sdk_autoscaling::Client,
}

impl AwsScalingGroups {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_autoscaling::Client::new(config),
        }
    }
}

#[async_trait]
impl ScalingGroups for AwsScalingGroups {
    async fn describe_group(&self, name: &str) -> Result<Option<ScalingGroup>> {
        log_cloud_call!("DescribeAutoScalingGroups", group = name);

        let output = self
            .client
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(name)
            .send()
            .await
            .map_err(|e| Error::cloud("DescribeAutoScalingGroups", e))?;

        Ok(output.auto_scaling_groups().first().map(|group| ScalingGroup {
            name: group.auto_scaling_group_name().unwrap_or(name).to_string(),
            desired_capacity: group.desired_capacity().unwrap_or_default(),
            target_group_arns: group.target_group_arns().to_vec(),
        }))
    }

    async fn set_desired_capacity(&self, name: &str, capacity: i32) -> Result<()> {
        log_cloud_call!("SetDesiredCapacity", group = name, capacity = capacity);

        self.client
            .set_desired_capacity()
            .auto_scaling_group_name(name)
            .desired_capacity(capacity)
            .honor_cooldown(false)
            .send()
            .await
            .map_err(|e| Error::cloud("SetDesiredCapacity", e))?;

        Ok(())
    }

    async fn detach_instance(
        &self,
        name: &str,
        instance_id: &str,
        decrement_desired_capacity: bool,
    ) -> Result<()> {
        log_cloud_call!(
            "DetachInstances",
            group = name,
            instance_id = instance_id,
            decrement = decrement_desired_capacity
        );

        self.client
            .detach_instances()
            .auto_scaling_group_name(name)
            .instance_ids(instance_id)
            .should_decrement_desired_capacity(decrement_desired_capacity)
            .send()
            .await
            .map_err(|e| Error::cloud("DetachInstances", e))?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AwsLoadBalancer {
    client: aws_sdk_elasticloadbalancingv2::Client,
}

impl AwsLoadBalancer {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_elasticloadbalancingv2::Client::new(config),
        }
    }
}

#[async_trait]
impl LoadBalancer for AwsLoadBalancer {
    async fn describe_target_health(&self, target_group_arn: &str) -> Result<Vec<TargetGroupMember>> {
        log_cloud_call!("DescribeTargetHealth", target_group = target_group_arn);

        let output = self
            .client
            .describe_target_health()
            .target_group_arn(target_group_arn)
            .send()
            .await
            .map_err(|e| Error::cloud("DescribeTargetHealth", e))?;

        Ok(output
            .target_health_descriptions()
            .iter()
            .filter_map(|description| {
                let id = description.target().map(|target| target.id())?;
                let state = description
                    .target_health()
                    .and_then(|health| health.state())
                    .map(|state| TargetHealthState::parse(state.as_str()))
                    .unwrap_or(TargetHealthState::Unavailable);
                Some(TargetGroupMember::new(id, state))
            })
            .collect())
    }

    async fn deregister_target(&self, target_group_arn: &str, instance_id: &str) -> Result<()> {
        log_cloud_call!(
            "DeregisterTargets",
            target_group = target_group_arn,
            instance_id = instance_id
        );

        let target = aws_sdk_elasticloadbalancingv2::types::TargetDescription::builder()
            .id(instance_id)
            .build()
            .map_err(|e| Error::cloud("DeregisterTargets", e))?;

        self.client
            .deregister_targets()
            .target_group_arn(target_group_arn)
            .targets(target)
            .send()
            .await
            .map_err(|e| Error::cloud("DeregisterTargets", e))?;

        Ok(())
    }
}
