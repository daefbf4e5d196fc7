//! Common test utilities and helpers
//!
//! In-memory fakes for the cluster and the cloud gateways. Every fake appends
//! to one shared call log so tests can assert the order of side effects.

#![allow(dead_code)]

use async_trait::async_trait;
use shardlift_common::{ApiDialect, Error, Result, ScalingGroup, TargetGroupMember};
use shardlift_core::cloud::{CloudContext, ComputeInventory, LoadBalancer, ScalingGroups};
use shardlift_core::poll::Sleeper;
use shardlift_core::ClusterClient;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const GROUP: &str = "es-data";
pub const TARGET_GROUP_ARN: &str =
    "arn:aws:elasticloadbalancing:ap-northeast-1:123456789012:targetgroup/es/abc";
pub const NODE: &str = "ip-10-0-1-23.ap-northeast-1.compute.internal";
pub const INSTANCE: &str = "i-bbb";

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Calls without the repeated poll probes and sleeps
    pub fn side_effects(&self) -> Vec<String> {
        let mut calls = self.calls();
        calls.retain(|c| c != "sleep");
        calls.dedup();
        calls
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// Pops scripted responses; the last one repeats forever
pub struct Script<T>(Mutex<VecDeque<T>>);

impl<T: Clone> Script<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self(Mutex::new(items.into_iter().collect()))
    }

    fn next(&self) -> Option<T> {
        let mut queue = self.0.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn injected(operation: &'static str) -> Error {
    Error::Api {
        operation,
        status: 500,
        body: "injected failure".to_string(),
    }
}

pub struct FakeCluster {
    log: CallLog,
    dialect: ApiDialect,
    nodes: Script<usize>,
    shards: Script<Vec<String>>,
    failing: Mutex<Option<&'static str>>,
}

impl FakeCluster {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            dialect: ApiDialect::V1,
            nodes: Script::new([0]),
            shards: Script::new([Vec::new()]),
            failing: Mutex::new(None),
        }
    }

    pub fn with_dialect(mut self, dialect: ApiDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Node counts returned by successive `list_nodes` calls
    pub fn with_node_counts(mut self, counts: impl IntoIterator<Item = usize>) -> Self {
        self.nodes = Script::new(counts);
        self
    }

    /// Shard lines returned by successive `list_shards_on_node` calls
    pub fn with_shards(mut self, responses: impl IntoIterator<Item = Vec<String>>) -> Self {
        self.shards = Script::new(responses);
        self
    }

    pub fn fail_on(self, call: &'static str) -> Self {
        *self.failing.lock().unwrap() = Some(call);
        self
    }

    fn call(&self, name: &'static str, entry: String) -> Result<()> {
        self.log.record(entry);
        if *self.failing.lock().unwrap() == Some(name) {
            return Err(injected(name));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    fn dialect(&self) -> ApiDialect {
        self.dialect
    }

    async fn disable_reallocation(&self) -> Result<()> {
        self.call("disable_reallocation", "disable_reallocation".to_string())
    }

    async fn enable_reallocation(&self) -> Result<()> {
        self.call("enable_reallocation", "enable_reallocation".to_string())
    }

    async fn exclude_node_from_allocation(&self, node_name: &str) -> Result<()> {
        self.call("exclude_node", format!("exclude_node {}", node_name))
    }

    async fn list_nodes(&self) -> Result<Vec<String>> {
        self.call("list_nodes", "list_nodes".to_string())?;
        let count = self.nodes.next().unwrap_or_default();
        Ok((0..count).map(|i| format!("node-{}", i)).collect())
    }

    async fn list_shards_on_node(&self, node_name: &str) -> Result<Vec<String>> {
        self.call("list_shards", format!("list_shards {}", node_name))?;
        Ok(self.shards.next().unwrap_or_default())
    }

    async fn shutdown(&self, node_name: &str) -> Result<()> {
        if self.dialect != ApiDialect::V1 {
            return Err(Error::Unsupported {
                capability: "shutdown",
                dialect: self.dialect,
            });
        }
        self.call("shutdown", format!("shutdown {}", node_name))
    }
}

pub struct FakeScaling {
    log: CallLog,
    groups: Mutex<HashMap<String, ScalingGroup>>,
}

impl FakeScaling {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            groups: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_group(self, name: &str, desired_capacity: i32, target_group_arns: &[&str]) -> Self {
        self.groups.lock().unwrap().insert(
            name.to_string(),
            ScalingGroup {
                name: name.to_string(),
                desired_capacity,
                target_group_arns: target_group_arns.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn desired_capacity(&self, name: &str) -> Option<i32> {
        self.groups
            .lock()
            .unwrap()
            .get(name)
            .map(|g| g.desired_capacity)
    }
}

#[async_trait]
impl ScalingGroups for FakeScaling {
    async fn describe_group(&self, name: &str) -> Result<Option<ScalingGroup>> {
        self.log.record(format!("describe_group {}", name));
        Ok(self.groups.lock().unwrap().get(name).cloned())
    }

    async fn set_desired_capacity(&self, name: &str, capacity: i32) -> Result<()> {
        self.log.record(format!("set_desired_capacity {} {}", name, capacity));
        match self.groups.lock().unwrap().get_mut(name) {
            Some(group) => {
                group.desired_capacity = capacity;
                Ok(())
            }
            None => Err(Error::not_found("auto scaling group", name)),
        }
    }

    async fn detach_instance(
        &self,
        name: &str,
        instance_id: &str,
        decrement_desired_capacity: bool,
    ) -> Result<()> {
        self.log.record(format!(
            "detach_instance {} {} {}",
            name, instance_id, decrement_desired_capacity
        ));
        Ok(())
    }
}

pub struct FakeLoadBalancer {
    log: CallLog,
    members: Script<Vec<TargetGroupMember>>,
}

impl FakeLoadBalancer {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            members: Script::new([Vec::new()]),
        }
    }

    /// Instance ids returned by successive health checks, all reported healthy
    pub fn with_members(mut self, responses: &[&[&str]]) -> Self {
        self.members = Script::new(responses.iter().map(|ids| {
            ids.iter()
                .map(|id| TargetGroupMember::new(*id, shardlift_common::TargetHealthState::Healthy))
                .collect::<Vec<_>>()
        }));
        self
    }
}

#[async_trait]
impl LoadBalancer for FakeLoadBalancer {
    async fn describe_target_health(&self, target_group_arn: &str) -> Result<Vec<TargetGroupMember>> {
        self.log.record(format!("describe_target_health {}", target_group_arn));
        Ok(self.members.next().unwrap_or_default())
    }

    async fn deregister_target(&self, target_group_arn: &str, instance_id: &str) -> Result<()> {
        self.log
            .record(format!("deregister_target {} {}", target_group_arn, instance_id));
        Ok(())
    }
}

pub struct FakeCompute {
    log: CallLog,
    instances: HashMap<String, String>,
}

impl FakeCompute {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            instances: HashMap::new(),
        }
    }

    pub fn with_instance(mut self, dns_name: &str, instance_id: &str) -> Self {
        self.instances
            .insert(dns_name.to_string(), instance_id.to_string());
        self
    }
}

#[async_trait]
impl ComputeInventory for FakeCompute {
    async fn find_instance_by_private_dns(&self, dns_name: &str) -> Result<Option<String>> {
        self.log.record(format!("find_instance {}", dns_name));
        Ok(self.instances.get(dns_name).cloned())
    }
}

pub struct RecordingSleeper {
    log: CallLog,
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.log.record("sleep");
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Cloud side of a test: fakes plus the context built from them
pub struct TestCloud {
    pub scaling: Arc<FakeScaling>,
    pub load_balancer: Arc<FakeLoadBalancer>,
    pub compute: Arc<FakeCompute>,
    pub context: CloudContext,
}

impl TestCloud {
    pub fn new(scaling: FakeScaling, load_balancer: FakeLoadBalancer, compute: FakeCompute) -> Self {
        let scaling = Arc::new(scaling);
        let load_balancer = Arc::new(load_balancer);
        let compute = Arc::new(compute);
        let context = CloudContext::new(compute.clone(), scaling.clone(), load_balancer.clone());

        Self {
            scaling,
            load_balancer,
            compute,
            context,
        }
    }
}
