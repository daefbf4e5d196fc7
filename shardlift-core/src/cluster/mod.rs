//! Search cluster client
//!
//! Three incompatible API generations sit behind one capability trait:
//! - v1: 1.x clusters (root answers `{"OK": ...}`)
//! - v2: 2.x clusters
//! - v5: 5.x clusters
//!
//! Adapters may be partial. A capability a dialect lacks returns
//! `Error::Unsupported` instead of issuing a request.

pub mod detect;
pub mod endpoint;
mod transport;
pub mod v1;
pub mod v2;
pub mod v5;

pub use detect::{
    connect, connect_with, detect_version, http_client, parse_version_body, DEFAULT_HTTP_TIMEOUT,
};
pub use endpoint::{ClusterEndpoint, Credentials};

use async_trait::async_trait;
use serde::Deserialize;
use shardlift_common::{ApiDialect, Result};
use std::collections::BTreeMap;
use transport::Transport;

/// Capabilities every protocol adapter exposes
///
/// Each call is a single request. Retry and polling policy belongs to the
/// workflows, never to the adapter.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// API generation this adapter speaks
    fn dialect(&self) -> ApiDialect;

    /// Set `cluster.routing.allocation.enable` to `none` (transient)
    async fn disable_reallocation(&self) -> Result<()>;

    /// Set `cluster.routing.allocation.enable` to `all` (transient)
    async fn enable_reallocation(&self) -> Result<()>;

    /// Stop the allocator from placing shards on `node_name`
    async fn exclude_node_from_allocation(&self, node_name: &str) -> Result<()>;

    /// Names of every node currently joined to the cluster
    async fn list_nodes(&self) -> Result<Vec<String>>;

    /// Raw shard placement lines that mention `node_name`
    async fn list_shards_on_node(&self, node_name: &str) -> Result<Vec<String>>;

    /// Ask the node to shut down gracefully
    async fn shutdown(&self, node_name: &str) -> Result<()>;
}

/// Concrete adapter enum returned by the factory
#[derive(Debug, Clone)]
pub enum ClusterAdapter {
    V1(v1::Client),
    V2(v2::Client),
    V5(v5::Client),
}

impl ClusterAdapter {
    /// Constructor lookup by dialect. New API generations are added here.
    pub(crate) fn new(dialect: ApiDialect, transport: Transport) -> Self {
        match dialect {
            ApiDialect::V1 => ClusterAdapter::V1(v1::Client::new(transport)),
            ApiDialect::V2 => ClusterAdapter::V2(v2::Client::new(transport)),
            ApiDialect::V5 => ClusterAdapter::V5(v5::Client::new(transport)),
        }
    }

    pub fn endpoint(&self) -> &ClusterEndpoint {
        match self {
            ClusterAdapter::V1(c) => c.endpoint(),
            ClusterAdapter::V2(c) => c.endpoint(),
            ClusterAdapter::V5(c) => c.endpoint(),
        }
    }

    /// Build the adapter for `dialect` without probing the cluster
    pub fn for_dialect(dialect: ApiDialect, endpoint: ClusterEndpoint, http: reqwest::Client) -> Self {
        Self::new(dialect, Transport::new(endpoint, http))
    }
}

#[async_trait]
impl ClusterClient for ClusterAdapter {
    fn dialect(&self) -> ApiDialect {
        match self {
            ClusterAdapter::V1(c) => c.dialect(),
            ClusterAdapter::V2(c) => c.dialect(),
            ClusterAdapter::V5(c) => c.dialect(),
        }
    }

    async fn disable_reallocation(&self) -> Result<()> {
        match self {
            ClusterAdapter::V1(c) => c.disable_reallocation().await,
            ClusterAdapter::V2(c) => c.disable_reallocation().await,
            ClusterAdapter::V5(c) => c.disable_reallocation().await,
        }
    }

    async fn enable_reallocation(&self) -> Result<()> {
        match self {
            ClusterAdapter::V1(c) => c.enable_reallocation().await,
            ClusterAdapter::V2(c) => c.enable_reallocation().await,
            ClusterAdapter::V5(c) => c.enable_reallocation().await,
        }
    }

    async fn exclude_node_from_allocation(&self, node_name: &str) -> Result<()> {
        match self {
            ClusterAdapter::V1(c) => c.exclude_node_from_allocation(node_name).await,
            ClusterAdapter::V2(c) => c.exclude_node_from_allocation(node_name).await,
            ClusterAdapter::V5(c) => c.exclude_node_from_allocation(node_name).await,
        }
    }

    async fn list_nodes(&self) -> Result<Vec<String>> {
        match self {
            ClusterAdapter::V1(c) => c.list_nodes().await,
            ClusterAdapter::V2(c) => c.list_nodes().await,
            ClusterAdapter::V5(c) => c.list_nodes().await,
        }
    }

    async fn list_shards_on_node(&self, node_name: &str) -> Result<Vec<String>> {
        match self {
            ClusterAdapter::V1(c) => c.list_shards_on_node(node_name).await,
            ClusterAdapter::V2(c) => c.list_shards_on_node(node_name).await,
            ClusterAdapter::V5(c) => c.list_shards_on_node(node_name).await,
        }
    }

    async fn shutdown(&self, node_name: &str) -> Result<()> {
        match self {
            ClusterAdapter::V1(c) => c.shutdown(node_name).await,
            ClusterAdapter::V2(c) => c.shutdown(node_name).await,
            ClusterAdapter::V5(c) => c.shutdown(node_name).await,
        }
    }
}

/// `GET /_nodes` body, keyed by node id
#[derive(Debug, Deserialize)]
pub(crate) struct NodesInfo {
    #[serde(default)]
    nodes: BTreeMap<String, NodeInfo>,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    name: String,
}

impl NodesInfo {
    /// Node names sorted for stable output
    pub(crate) fn names(self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.into_values().map(|n| n.name).collect();
        names.sort();
        names
    }
}
