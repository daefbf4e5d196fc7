//! Adapter for 1.x clusters
//!
//! The only dialect that still has the node shutdown API.
//! https://www.elastic.co/guide/en/elasticsearch/reference/1.5/cluster-nodes-shutdown.html

use super::endpoint::ClusterEndpoint;
use super::transport::{self, Transport, ALLOCATION_ENABLE, ALLOCATION_EXCLUDE_NAME};
use super::{ClusterClient, NodesInfo};
use async_trait::async_trait;
use shardlift_common::{ApiDialect, Result};

#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
}

impl Client {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn endpoint(&self) -> &ClusterEndpoint {
        self.transport.endpoint()
    }
}

#[async_trait]
impl ClusterClient for Client {
    fn dialect(&self) -> ApiDialect {
        ApiDialect::V1
    }

    async fn disable_reallocation(&self) -> Result<()> {
        self.transport
            .put_transient_setting("DisableReallocation", ALLOCATION_ENABLE, "none")
            .await
    }

    async fn enable_reallocation(&self) -> Result<()> {
        self.transport
            .put_transient_setting("EnableReallocation", ALLOCATION_ENABLE, "all")
            .await
    }

    async fn exclude_node_from_allocation(&self, node_name: &str) -> Result<()> {
        self.transport
            .put_transient_setting("ExcludeNodeFromAllocation", ALLOCATION_EXCLUDE_NAME, node_name)
            .await
    }

    async fn list_nodes(&self) -> Result<Vec<String>> {
        let info: NodesInfo = self.transport.get_json("NodesInfo", "/_nodes").await?;
        Ok(info.names())
    }

    async fn list_shards_on_node(&self, node_name: &str) -> Result<Vec<String>> {
        let body = self.transport.get_text("CatShards", "/_cat/shards").await?;
        Ok(transport::shards_on_node(&body, node_name))
    }

    async fn shutdown(&self, node_name: &str) -> Result<()> {
        self.transport
            .post_empty("Shutdown", &transport::shutdown_path(node_name))
            .await
    }
}
