pub mod add;
pub mod list;
pub mod remove;

use crate::config::{self, Config};
use crate::output::OutputFormat;
use crate::progress::SpinnerObserver;
use anyhow::{Context as _, Result};
use shardlift_core::cluster::{self, ClusterAdapter, ClusterEndpoint};
use shardlift_core::CloudContext;
use std::sync::Arc;

/// Settings shared by every subcommand after flags and config are merged
pub struct Context {
    pub config: Config,
    pub region: Option<String>,
    pub format: OutputFormat,
}

impl Context {
    pub fn endpoint(&self, cluster_url: Option<String>) -> Result<ClusterEndpoint> {
        let raw = config::require(
            cluster_url,
            &self.config.cluster_url,
            "cluster URL",
            "--cluster-url or cluster_url in config",
        )?;
        Ok(ClusterEndpoint::parse(&raw)?)
    }

    pub fn group(&self, group: Option<String>) -> Result<String> {
        config::require(
            group,
            &self.config.group,
            "auto scaling group",
            "--group or group in config",
        )
    }

    /// Detect the cluster version and build the matching adapter
    pub async fn connect(&self, endpoint: ClusterEndpoint) -> Result<ClusterAdapter> {
        let http = cluster::http_client(self.config.http_timeout())?;
        let display = endpoint.to_string();
        cluster::connect_with(http, endpoint)
            .await
            .with_context(|| format!("failed to connect to cluster {}", display))
    }

    pub async fn cloud(&self) -> CloudContext {
        CloudContext::from_aws(self.region.clone()).await
    }

    pub fn observer(&self) -> Arc<SpinnerObserver> {
        let interactive = std::io::IsTerminal::is_terminal(&std::io::stderr());
        Arc::new(SpinnerObserver::new(
            interactive && self.format == OutputFormat::Table,
        ))
    }
}
