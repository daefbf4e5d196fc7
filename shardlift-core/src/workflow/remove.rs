//! Scale-in: take one node out of service and hand its instance back

use super::{NodeLifecycle, Step};
use crate::cluster::ClusterClient;
use serde::Serialize;
use shardlift_common::{Error, PollPolicy, Result};
use tracing::info;

#[derive(Debug, Clone)]
pub struct RemoveRequest {
    pub group: String,
    /// Cluster node name; must equal the instance's private DNS name
    pub node_name: String,
    /// Budget for each of the two wait points
    pub poll: PollPolicy,
}

impl RemoveRequest {
    pub fn new(group: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            node_name: node_name.into(),
            poll: PollPolicy::remove_default(),
        }
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.group.trim().is_empty() {
            return Err(Error::Config("auto scaling group name is required".to_string()));
        }
        if self.node_name.trim().is_empty() {
            return Err(Error::Config("node name is required".to_string()));
        }
        if self.poll.max_attempts == 0 {
            return Err(Error::Config(
                "remove poll max_attempts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveReport {
    pub instance_id: String,
    pub target_group_arn: String,
    pub drain_attempts: u32,
    pub evacuation_attempts: u32,
}

impl<C: ClusterClient + ?Sized> NodeLifecycle<'_, C> {
    /// Remove `request.node_name` from the load balancer, the cluster and the group
    ///
    /// Order matters: traffic is drained before shards are moved, and shards
    /// are gone before the node is stopped and its instance detached.
    pub async fn remove_node(&self, request: &RemoveRequest) -> Result<RemoveReport> {
        request.validate()?;
        let node = request.node_name.as_str();

        let instance_id = self
            .run_step(Step::ResolveInstance, self.cloud.resolve_instance_id(node))
            .await?;
        info!("Node {} is instance {}", node, instance_id);

        let target_group_arn = self
            .run_step(
                Step::ResolveTargetGroup,
                self.cloud.resolve_target_group(&request.group),
            )
            .await?;

        self.run_step(
            Step::DeregisterTarget,
            self.cloud
                .load_balancer
                .deregister_target(&target_group_arn, &instance_id),
        )
        .await?;

        let drained = format!("instance {} to leave target group", instance_id);
        let (arn, id) = (target_group_arn.as_str(), instance_id.as_str());
        let drain_attempts = self
            .wait_for(Step::WaitForDrain, &request.poll, &drained, || async move {
                let members = self.cloud.target_instance_ids(arn).await?;
                Ok(!members.iter().any(|member| member == id))
            })
            .await?;

        self.run_step(
            Step::ExcludeNode,
            self.cluster.exclude_node_from_allocation(node),
        )
        .await?;

        let evacuated = format!("shards to leave node {}", node);
        let evacuation_attempts = self
            .wait_for(Step::WaitForEvacuation, &request.poll, &evacuated, || async move {
                let shards = self.cluster.list_shards_on_node(node).await?;
                if !shards.is_empty() {
                    info!("{} shards remain on {}", shards.len(), node);
                }
                Ok(shards.is_empty())
            })
            .await?;

        self.run_step(Step::Shutdown, self.cluster.shutdown(node)).await?;

        self.run_step(
            Step::DetachInstance,
            self.cloud
                .scaling
                .detach_instance(&request.group, &instance_id, true),
        )
        .await?;

        info!("Removed node {} ({}) from {}", node, instance_id, request.group);

        Ok(RemoveReport {
            instance_id,
            target_group_arn,
            drain_attempts,
            evacuation_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(RemoveRequest::new("es-data", "ip-10-0-1-23").validate().is_ok());
        assert!(RemoveRequest::new("", "ip-10-0-1-23").validate().unwrap_err().is_config());
        assert!(RemoveRequest::new("es-data", "").validate().unwrap_err().is_config());
    }

    #[test]
    fn test_remove_default_budget() {
        let request = RemoveRequest::new("es-data", "node");
        assert_eq!(request.poll.max_attempts, 60);
        assert_eq!(request.poll.ceiling().as_secs(), 295);
    }
}
