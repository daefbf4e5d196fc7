//! Shardlift core library
//!
//! Adds and removes search-cluster nodes while keeping the cluster, the
//! load-balancer target group and the autoscaling group consistent.

// Cluster protocol adapters
pub mod cluster;
pub use cluster::{ClusterAdapter, ClusterClient, ClusterEndpoint};

// Cloud gateways
pub mod cloud;
pub use cloud::CloudContext;

// Workflows
pub mod poll;
pub mod workflow;
pub use workflow::{NodeLifecycle, Step, WorkflowObserver};

// Logging
pub mod logging;

pub use shardlift_common::{Error, Result};
