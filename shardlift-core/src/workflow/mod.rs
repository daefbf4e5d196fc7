//! Node lifecycle workflows
//!
//! Strictly ordered sequences of cluster and cloud calls with bounded waits in
//! between. Any failure aborts the run and is wrapped with the step that
//! failed; nothing is rolled back.

pub mod add;
pub mod remove;

pub use add::{AddReport, AddRequest};
pub use remove::{RemoveReport, RemoveRequest};

use crate::cloud::CloudContext;
use crate::cluster::ClusterClient;
use crate::poll::{poll_until, Sleeper, TokioSleeper};
use shardlift_common::error::StepContext;
use shardlift_common::{PollPolicy, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Every step either workflow can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    // add
    DisableReallocation,
    IncreaseCapacity,
    WaitForNodes,
    EnableReallocation,
    // remove
    ResolveInstance,
    ResolveTargetGroup,
    DeregisterTarget,
    WaitForDrain,
    ExcludeNode,
    WaitForEvacuation,
    Shutdown,
    DetachInstance,
}

impl Step {
    pub const ADD: [Step; 4] = [
        Step::DisableReallocation,
        Step::IncreaseCapacity,
        Step::WaitForNodes,
        Step::EnableReallocation,
    ];

    pub const REMOVE: [Step; 8] = [
        Step::ResolveInstance,
        Step::ResolveTargetGroup,
        Step::DeregisterTarget,
        Step::WaitForDrain,
        Step::ExcludeNode,
        Step::WaitForEvacuation,
        Step::Shutdown,
        Step::DetachInstance,
    ];

    /// Imperative phrase, read as "failed to ..."
    pub fn describe(&self) -> &'static str {
        match self {
            Step::DisableReallocation => "disable shard reallocation",
            Step::IncreaseCapacity => "increase desired capacity",
            Step::WaitForNodes => "wait for new nodes to join the cluster",
            Step::EnableReallocation => "enable shard reallocation",
            Step::ResolveInstance => "resolve instance id",
            Step::ResolveTargetGroup => "resolve target group",
            Step::DeregisterTarget => "deregister instance from target group",
            Step::WaitForDrain => "wait for instance to leave target group",
            Step::ExcludeNode => "exclude node from shard allocation",
            Step::WaitForEvacuation => "wait for shards to leave node",
            Step::Shutdown => "shut down node",
            Step::DetachInstance => "detach instance from auto scaling group",
        }
    }

    /// Position within its workflow and the workflow length, both 1-based
    pub fn position(&self) -> (usize, usize) {
        let sequence: &[Step] = if Step::ADD.contains(self) {
            &Step::ADD
        } else {
            &Step::REMOVE
        };
        let index = sequence.iter().position(|s| s == self).unwrap_or(0);
        (index + 1, sequence.len())
    }

    /// `[n/total] phrase`, used for step banners
    pub fn banner(&self) -> String {
        let (n, total) = self.position();
        format!("[{}/{}] {}", n, total, self.describe())
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Progress hook for interactive front ends
pub trait WorkflowObserver: Send + Sync {
    /// A step is about to start
    fn on_step(&self, _step: Step) {}

    /// A poll probe came back negative and the next one is scheduled
    fn on_poll(&self, _condition: &str, _attempt: u32) {}
}

impl WorkflowObserver for () {}

/// Runs the add and remove workflows against one cluster and one cloud account
pub struct NodeLifecycle<'a, C: ClusterClient + ?Sized> {
    cluster: &'a C,
    cloud: &'a CloudContext,
    sleeper: Arc<dyn Sleeper>,
    observer: Arc<dyn WorkflowObserver>,
}

impl<'a, C: ClusterClient + ?Sized> NodeLifecycle<'a, C> {
    pub fn new(cluster: &'a C, cloud: &'a CloudContext) -> Self {
        Self {
            cluster,
            cloud,
            sleeper: Arc::new(TokioSleeper),
            observer: Arc::new(()),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observer = observer;
        self
    }

    async fn run_step<T, Fut>(&self, step: Step, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.observer.on_step(step);
        info!("{}", step.banner());
        fut.await.step(step.describe())
    }

    async fn wait_for<F, Fut>(
        &self,
        step: Step,
        policy: &PollPolicy,
        condition: &str,
        probe: F,
    ) -> Result<u32>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let observer = &self.observer;
        let on_retry = |attempt: u32| {
            debug!(attempt, condition, "Condition not met yet");
            observer.on_poll(condition, attempt);
        };

        self.run_step(
            step,
            poll_until(policy, self.sleeper.as_ref(), condition, on_retry, probe),
        )
        .await
    }
}
