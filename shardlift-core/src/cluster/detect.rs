//! Version resolver and client factory

use super::endpoint::ClusterEndpoint;
use super::transport::Transport;
use super::{ClusterAdapter, ClusterClient};
use serde_json::Value;
use shardlift_common::{ApiDialect, Error, Result};
use std::time::Duration;
use tracing::info;

/// Per-request timeout applied to every cluster call
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client shared by the resolver and the adapter it builds
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))
}

/// Extract the version string from a cluster root body
///
/// `{"OK": ...}` is the oldest dialect and maps to a fixed sentinel version;
/// otherwise `version.number` is returned as-is.
pub fn parse_version_body(body: &Value) -> Result<String> {
    let root = body
        .as_object()
        .ok_or_else(|| Error::Detection("root response is not a JSON object".to_string()))?;

    if root.contains_key("OK") {
        return Ok(ApiDialect::LEGACY_SENTINEL_VERSION.to_string());
    }

    let version = root
        .get("version")
        .ok_or_else(|| Error::Detection("version field not found".to_string()))?
        .as_object()
        .ok_or_else(|| Error::Detection("invalid version field".to_string()))?;

    version
        .get("number")
        .ok_or_else(|| Error::Detection("version number field not found".to_string()))?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Detection("invalid version number field".to_string()))
}

/// `GET /` on the cluster and return its version string
pub async fn detect_version(http: &reqwest::Client, endpoint: &ClusterEndpoint) -> Result<String> {
    let transport = Transport::new(endpoint.clone(), http.clone());
    let body: Value = transport.get_json("DetectVersion", "/").await?;
    parse_version_body(&body)
}

/// Probe the cluster and build the matching adapter
pub async fn connect(endpoint: ClusterEndpoint) -> Result<ClusterAdapter> {
    connect_with(http_client(DEFAULT_HTTP_TIMEOUT)?, endpoint).await
}

/// Same as [`connect`] with a caller-supplied HTTP client
pub async fn connect_with(http: reqwest::Client, endpoint: ClusterEndpoint) -> Result<ClusterAdapter> {
    let version = detect_version(&http, &endpoint).await?;
    let dialect = ApiDialect::from_version(&version)?;

    let adapter = ClusterAdapter::new(dialect, Transport::new(endpoint, http));

    info!(
        "Connected to cluster {} (version {}, API {})",
        adapter.endpoint(),
        version,
        adapter.dialect()
    );

    Ok(adapter)
}
