//! Common types shared between shardlift-core and shardlift-cli

pub mod error;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

/// Cluster API major-version family spoken by a protocol adapter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApiDialect {
    V1, // 1.x, root endpoint answers {"OK": ...}
    V2,
    V5,
}

impl ApiDialect {
    /// Version reported by the oldest dialect, whose root body has no version field
    pub const LEGACY_SENTINEL_VERSION: &'static str = "1.0.0";

    /// Map a dotted version string onto its dialect by the leading component
    pub fn from_version(version: &str) -> Result<Self> {
        let major = version.split('.').next().unwrap_or_default();

        match major {
            "1" => Ok(ApiDialect::V1),
            "2" => Ok(ApiDialect::V2),
            "5" => Ok(ApiDialect::V5),
            _ => Err(Error::UnsupportedVersion(version.to_string())),
        }
    }

    pub fn major(&self) -> u32 {
        match self {
            ApiDialect::V1 => 1,
            ApiDialect::V2 => 2,
            ApiDialect::V5 => 5,
        }
    }
}

impl std::fmt::Display for ApiDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.major())
    }
}

/// Snapshot of an autoscaling group, fetched fresh on every read
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScalingGroup {
    pub name: String,
    pub desired_capacity: i32,
    #[serde(default)]
    pub target_group_arns: Vec<String>,
}

/// Lifecycle state of a target-group member as reported by the load balancer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetHealthState {
    Initial,
    Healthy,
    Unhealthy,
    Unused,
    Draining,
    Unavailable,
    #[serde(untagged)]
    Other(String),
}

impl TargetHealthState {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "initial" => Self::Initial,
            "healthy" => Self::Healthy,
            "unhealthy" => Self::Unhealthy,
            "unused" => Self::Unused,
            "draining" => Self::Draining,
            "unavailable" => Self::Unavailable,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl std::fmt::Display for TargetHealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Unused => write!(f, "unused"),
            Self::Draining => write!(f, "draining"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Instance registered in a load-balancer target group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetGroupMember {
    pub instance_id: String,
    pub state: TargetHealthState,
}

impl TargetGroupMember {
    pub fn new(instance_id: impl Into<String>, state: TargetHealthState) -> Self {
        Self {
            instance_id: instance_id.into(),
            state,
        }
    }
}

/// Polling budget for one synchronization point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    #[serde(rename = "interval_secs", with = "secs")]
    pub interval: std::time::Duration,
}

impl PollPolicy {
    pub const fn new(max_attempts: u32, interval: std::time::Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Waiting for new nodes to join: 120 x 5s
    pub const fn add_default() -> Self {
        Self::new(120, std::time::Duration::from_secs(5))
    }

    /// Waiting for drain or shard evacuation: 60 x 5s per wait point
    pub const fn remove_default() -> Self {
        Self::new(60, std::time::Duration::from_secs(5))
    }

    /// Upper bound on wall-clock time spent sleeping
    pub fn ceiling(&self) -> std::time::Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_version() {
        assert_eq!(ApiDialect::from_version("1.0.0").unwrap(), ApiDialect::V1);
        assert_eq!(ApiDialect::from_version("2.3.0").unwrap(), ApiDialect::V2);
        assert_eq!(ApiDialect::from_version("5.2.2").unwrap(), ApiDialect::V5);
    }

    #[test]
    fn test_unsupported_versions() {
        for version in ["6.8.0", "7.17.1", "0.90.13", "", "five"] {
            match ApiDialect::from_version(version) {
                Err(Error::UnsupportedVersion(v)) => assert_eq!(v, version),
                other => panic!("expected unsupported version for {:?}, got {:?}", version, other),
            }
        }
    }

    #[test]
    fn test_health_state_parse() {
        assert_eq!(TargetHealthState::parse("healthy"), TargetHealthState::Healthy);
        assert_eq!(TargetHealthState::parse("draining"), TargetHealthState::Draining);
        assert_eq!(
            TargetHealthState::parse("warming"),
            TargetHealthState::Other("warming".to_string())
        );
        assert_eq!(TargetHealthState::Draining.to_string(), "draining");
    }

    #[test]
    fn test_poll_policy_ceiling() {
        assert_eq!(PollPolicy::add_default().ceiling().as_secs(), 595);
        assert_eq!(PollPolicy::remove_default().ceiling().as_secs(), 295);
        assert_eq!(PollPolicy::new(0, std::time::Duration::from_secs(5)).ceiling().as_secs(), 0);
    }

    #[test]
    fn test_poll_policy_serde() {
        let policy: PollPolicy =
            serde_json::from_str(r#"{"max_attempts": 3, "interval_secs": 2}"#).unwrap();
        assert_eq!(policy, PollPolicy::new(3, std::time::Duration::from_secs(2)));
    }
}
