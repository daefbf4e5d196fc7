//! Cluster endpoint parsed from the operator-supplied URL

use shardlift_common::{Error, Result};
use url::Url;

/// Basic-auth credentials embedded in the cluster URL
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// Scheme, host and optional credentials of a search cluster
///
/// Any path or query on the source URL is dropped; every request is built
/// from the root. Credentials travel as a basic-auth header, never inside
/// the request URL.
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterEndpoint {
    scheme: String,
    host: String,
    port: Option<u16>,
    credentials: Option<Credentials>,
}

impl ClusterEndpoint {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| Error::Config(format!("cluster URL {:?} is invalid: {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "cluster URL must use http or https, got {:?}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Config(format!("cluster URL {:?} has no host", raw)))?
            .to_string();

        let credentials = if url.username().is_empty() {
            None
        } else {
            Some(Credentials {
                username: decode(url.username())?,
                password: url.password().map(decode).transpose()?,
            })
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port: url.port(),
            credentials,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// `scheme://host[:port]` without credentials or trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.authority())
    }

    /// Absolute URL for an API path starting with `/`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

fn decode(component: &str) -> Result<String> {
    urlencoding::decode(component)
        .map(|s| s.into_owned())
        .map_err(|e| Error::Config(format!("cluster URL credentials are not valid UTF-8: {}", e)))
}

impl std::fmt::Display for ClusterEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.credentials {
            Some(creds) => {
                let mask = if creds.password.is_some() { ":***" } else { "" };
                write!(f, "{}://{}{}@{}", self.scheme, creds.username, mask, self.authority())
            }
            None => write!(f, "{}", self.base_url()),
        }
    }
}

impl std::fmt::Debug for ClusterEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClusterEndpoint").field(&self.to_string()).finish()
    }
}

impl std::str::FromStr for ClusterEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
