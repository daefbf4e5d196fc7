//! Scale-out: grow the autoscaling group and wait for the nodes to join

use super::{NodeLifecycle, Step};
use crate::cluster::ClusterClient;
use serde::Serialize;
use shardlift_common::{Error, PollPolicy, Result};
use tracing::info;

const NODES_JOINED: &str = "added nodes to join the cluster";

#[derive(Debug, Clone)]
pub struct AddRequest {
    pub group: String,
    /// Number of nodes to add
    pub delta: i32,
    pub poll: PollPolicy,
}

impl AddRequest {
    pub fn new(group: impl Into<String>, delta: i32) -> Self {
        Self {
            group: group.into(),
            delta,
            poll: PollPolicy::add_default(),
        }
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Checks that need no network round trip
    pub fn validate(&self) -> Result<()> {
        if self.group.trim().is_empty() {
            return Err(Error::Config("auto scaling group name is required".to_string()));
        }
        if self.delta <= 0 {
            return Err(Error::Config(format!(
                "number of nodes to add must be greater than 0 (got {})",
                self.delta
            )));
        }
        if self.poll.max_attempts == 0 {
            return Err(Error::Config("add poll max_attempts must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddReport {
    pub previous_capacity: i32,
    pub desired_capacity: i32,
    /// Node-list probes it took for the cluster to reach the desired size
    pub poll_attempts: u32,
}

impl<C: ClusterClient + ?Sized> NodeLifecycle<'_, C> {
    /// Add `request.delta` nodes to the group and wait until the cluster sees them
    ///
    /// Reallocation stays disabled while the nodes join so the cluster does not
    /// rebalance once per node. It is not re-enabled when a later step fails.
    pub async fn add_nodes(&self, request: &AddRequest) -> Result<AddReport> {
        request.validate()?;

        self.run_step(Step::DisableReallocation, self.cluster.disable_reallocation())
            .await?;

        let change = self
            .run_step(
                Step::IncreaseCapacity,
                self.cloud.increase_desired_capacity(&request.group, request.delta),
            )
            .await?;

        let expected = usize::try_from(change.target).unwrap_or_default();
        let poll_attempts = self
            .wait_for(Step::WaitForNodes, &request.poll, NODES_JOINED, || async move {
                let nodes = self.cluster.list_nodes().await?;
                info!("Cluster has {} of {} nodes", nodes.len(), expected);
                Ok(nodes.len() == expected)
            })
            .await?;

        self.run_step(Step::EnableReallocation, self.cluster.enable_reallocation())
            .await?;

        info!(
            "Added {} nodes to {} (desired capacity {} -> {})",
            request.delta, request.group, change.previous, change.target
        );

        Ok(AddReport {
            previous_capacity: change.previous,
            desired_capacity: change.target,
            poll_attempts,
        })
    }
}
