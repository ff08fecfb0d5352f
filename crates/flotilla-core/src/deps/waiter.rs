use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use flotilla_model::{DependencyCondition, Project, ServiceSpec};

use crate::{
    config::ReconcileConfig,
    error::CoreError,
    naming::dependency_container_name,
    runtime::{ContainerState, ContainerStatus, HealthStatus, RuntimeClient},
};

/// How a single readiness wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
    Cancelled,
}

/// Returns `true` if `state` satisfies `condition`.
pub fn is_satisfied(condition: DependencyCondition, state: &ContainerState) -> bool {
    match condition {
        DependencyCondition::Started => state.status == ContainerStatus::Running,
        DependencyCondition::ServiceHealthy => state.health == Some(HealthStatus::Healthy),
        DependencyCondition::ServiceCompletedSuccessfully => {
            state.status == ContainerStatus::Exited && state.exit_code == 0
        }
    }
}

/// Polls dependency containers until they reach their declared condition.
pub struct ReadinessWaiter<'a> {
    runtime: &'a dyn RuntimeClient,
    timeout: Duration,
    poll: Duration,
}

impl<'a> ReadinessWaiter<'a> {
    pub fn new(runtime: &'a dyn RuntimeClient, cfg: &ReconcileConfig) -> Self {
        Self {
            runtime,
            timeout: cfg.dependency_timeout(),
            poll: cfg.dependency_poll(),
        }
    }

    /// Wait until container `target` satisfies `condition`.
    ///
    /// The first inspection happens one poll interval after the call; inspection errors
    /// (container not created yet, transient API failures) count as "not ready".
    pub async fn wait_for(
        &self,
        target: &str,
        condition: DependencyCondition,
        cancel: &CancellationToken,
    ) -> WaitOutcome {
        let deadline = sleep(self.timeout);
        tokio::pin!(deadline);

        let mut ticker = interval_at(Instant::now() + self.poll, self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return WaitOutcome::Cancelled,
                _ = &mut deadline => return WaitOutcome::TimedOut,
                _ = ticker.tick() => {
                    match self.runtime.inspect_container(target).await {
                        Ok(inspect) if is_satisfied(condition, &inspect.state) => {
                            return WaitOutcome::Ready;
                        }
                        Ok(inspect) => {
                            trace!(container = target, status = %inspect.state.status, "dependency not ready");
                        }
                        Err(e) => trace!(container = target, error = %e, "dependency inspect failed"),
                    }
                }
            }
        }
    }

    /// Wait for every dependency of `service`, one after another in declared order.
    ///
    /// Edges that close a cycle are awaited like any other, so services on a cycle time out.
    #[instrument(level = "debug", skip(self, project, service, cancel), fields(service = %service.name))]
    pub async fn wait_dependencies(
        &self,
        stack: &str,
        project: &Project,
        service: &ServiceSpec,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        for dep in &service.depends_on {
            let Some(dep_spec) = project.service(&dep.service) else {
                return Err(CoreError::DependencyNotFound(dep.service.clone()));
            };
            let target = dependency_container_name(stack, dep_spec);
            info!(dependency = %dep.service, container = %target, condition = %dep.condition, "waiting for dependency");

            match self.wait_for(&target, dep.condition, cancel).await {
                WaitOutcome::Ready => debug!(dependency = %dep.service, "dependency ready"),
                WaitOutcome::TimedOut => {
                    warn!(dependency = %dep.service, "timed out waiting for dependency");
                    return Err(CoreError::DependencyTimeout {
                        dependency: dep.service.clone(),
                        waited_ms: self.timeout.as_millis() as u64,
                    });
                }
                WaitOutcome::Cancelled => return Err(CoreError::Cancelled),
            }
        }
        Ok(())
    }
}
