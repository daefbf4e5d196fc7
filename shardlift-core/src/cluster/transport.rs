//! HTTP plumbing shared by every protocol adapter
//!
//! One call, one request: nothing here retries.

use super::endpoint::ClusterEndpoint;
use crate::log_cluster_request;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use shardlift_common::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    endpoint: ClusterEndpoint,
    http: reqwest::Client,
}

impl Transport {
    pub(crate) fn new(endpoint: ClusterEndpoint, http: reqwest::Client) -> Self {
        Self { endpoint, http }
    }

    pub(crate) fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    /// Build request with basic auth when the endpoint carries credentials
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.request(method, self.endpoint.url(path));

        if let Some(creds) = self.endpoint.credentials() {
            request = request.basic_auth(&creds.username, creds.password.as_ref());
        }

        request
    }

    /// Send a request and return the body of a 2xx response
    async fn execute(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<String> {
        log_cluster_request!(operation, method.as_str(), path);

        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(operation, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(operation, e))?;

        if !status.is_success() {
            return Err(Error::Api {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }

    pub(crate) async fn get_text(&self, operation: &'static str, path: &str) -> Result<String> {
        self.execute(operation, Method::GET, path, None).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T> {
        let text = self.get_text(operation, path).await?;
        serde_json::from_str(&text).map_err(|source| Error::Decode { operation, source })
    }

    pub(crate) async fn post_empty(&self, operation: &'static str, path: &str) -> Result<()> {
        self.execute(operation, Method::POST, path, None).await?;
        Ok(())
    }

    /// `PUT /_cluster/settings` in the transient scope, so a full cluster
    /// restart discards the change
    pub(crate) async fn put_transient_setting(
        &self,
        operation: &'static str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let mut settings = Map::new();
        settings.insert(key.to_string(), Value::String(value.to_string()));
        let body = json!({ "transient": settings });

        self.execute(operation, Method::PUT, "/_cluster/settings", Some(&body))
            .await?;
        Ok(())
    }
}

/// Setting toggled by disable/enable reallocation
pub(crate) const ALLOCATION_ENABLE: &str = "cluster.routing.allocation.enable";

/// Per-node exclusion filter that drains shards off a node
pub(crate) const ALLOCATION_EXCLUDE_NAME: &str = "cluster.routing.allocation.exclude._name";

/// Keep the `_cat/shards` lines mentioning `node_name`, in order
pub(crate) fn shards_on_node(cat_output: &str, node_name: &str) -> Vec<String> {
    cat_output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| line.contains(node_name))
        .map(str::to_string)
        .collect()
}

/// Path of the node shutdown endpoint with the node name escaped
pub(crate) fn shutdown_path(node_name: &str) -> String {
    format!(
        "/_cluster/nodes/{}/_shutdown",
        urlencoding::encode(node_name)
    )
}
