//! Stack reconciler: turns a project into running containers and tears stacks down.
//! - Services are processed one at a time, dependencies first.
//! - A failing service is logged and skipped; the pass always continues.
//! - No container registry is kept; state is re-queried through stack labels.
mod plan;
pub use plan::{NetworkPlan, bind_mounts, network_plan, port_config};

mod report;
pub use report::{
    ReconcileMode, ReconcileReport, SkippedService, StackStatus, StopReport, TeardownFailure,
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use flotilla_model::{Env, Labels, Project, ServiceSpec};

use crate::{
    config::ReconcileConfig,
    context::RuntimeContext,
    deps::{DependencyGraph, ReadinessWaiter},
    error::CoreError,
    metrics::SkipReason,
    naming::container_name,
    network::NetworkResolver,
    runtime::{
        ContainerConfig, ContainerFilter, ContainerSummary, CreateContainerRequest, HostConfig,
        NetworkingConfig, RuntimeClient, short_id,
    },
};

/// Applies stack definitions against the runtime.
#[derive(Debug, Clone)]
pub struct StackReconciler {
    ctx: RuntimeContext,
    cfg: ReconcileConfig,
}

impl StackReconciler {
    pub fn new(ctx: RuntimeContext) -> Self {
        Self {
            ctx,
            cfg: ReconcileConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: ReconcileConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.cfg
    }

    fn runtime(&self) -> &dyn RuntimeClient {
        self.ctx.runtime()
    }

    /// Create and start every service of `project` under `stack`.
    pub async fn start(
        &self,
        stack: &str,
        project: &Project,
        cancel: &CancellationToken,
    ) -> ReconcileReport {
        self.reconcile(stack, project, ReconcileMode::Start, cancel).await
    }

    /// Like [`StackReconciler::start`], pulling images first and pruning dangling images after.
    pub async fn update(
        &self,
        stack: &str,
        project: &Project,
        cancel: &CancellationToken,
    ) -> ReconcileReport {
        self.reconcile(stack, project, ReconcileMode::Update, cancel).await
    }

    /// Run one reconciliation pass.
    ///
    /// Same-named containers are force-removed before creation, so repeating a pass over an
    /// unchanged project replaces containers instead of duplicating them.
    #[instrument(level = "info", skip(self, project, cancel), fields(services = project.len()))]
    pub async fn reconcile(
        &self,
        stack: &str,
        project: &Project,
        mode: ReconcileMode,
        cancel: &CancellationToken,
    ) -> ReconcileReport {
        let order = DependencyGraph::from_project(project).order();
        let waiter = ReadinessWaiter::new(self.runtime(), &self.cfg);
        let mut report = ReconcileReport::default();

        for name in &order.services {
            let Some(service) = project.service(name) else {
                continue;
            };
            match self
                .reconcile_service(stack, project, service, mode, &waiter, cancel)
                .await
            {
                Ok(()) => {
                    self.ctx.metrics().record_service_started();
                    report.started.push(name.clone());
                }
                Err((reason, error)) => {
                    warn!(service = %name, %reason, %error, "service skipped");
                    self.ctx.metrics().record_service_skipped(reason);
                    report.skipped.push(SkippedService {
                        service: name.clone(),
                        reason,
                        error,
                    });
                }
            }
        }

        if mode == ReconcileMode::Update {
            match self.runtime().prune_dangling_images().await {
                Ok(pruned) => debug!(reclaimed = pruned.space_reclaimed, "dangling images pruned"),
                Err(e) => {
                    warn!(error = %e, "failed to prune dangling images");
                    self.ctx.metrics().record_runtime_error("prune");
                }
            }
        }

        info!(
            started = report.started.len(),
            skipped = report.skipped.len(),
            "reconciliation finished"
        );
        report
    }

    async fn reconcile_service(
        &self,
        stack: &str,
        project: &Project,
        service: &ServiceSpec,
        mode: ReconcileMode,
        waiter: &ReadinessWaiter<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), (SkipReason, String)> {
        let rt = self.runtime();

        if mode == ReconcileMode::Update {
            if let Err(e) = rt.pull_image(&service.image).await {
                warn!(service = %service.name, image = %service.image, error = %e, "image pull failed");
                self.ctx.metrics().record_runtime_error("pull");
            }
        }

        waiter
            .wait_dependencies(stack, project, service, cancel)
            .await
            .map_err(|e| (SkipReason::Dependency, e.to_string()))?;

        let name = container_name(rt, stack, service).await;
        let (exposed_ports, port_bindings) = port_config(&service.ports);

        let (network_mode, networking) = match network_plan(stack, project, service) {
            NetworkPlan::Default => (None, None),
            NetworkPlan::Mode(mode) => (Some(mode), None),
            NetworkPlan::Named(token) => {
                let network = NetworkResolver::new(rt)
                    .resolve(&token)
                    .await
                    .map_err(|e| (SkipReason::Network, e.to_string()))?;
                (None, Some(NetworkingConfig::single(network)))
            }
        };

        let request = CreateContainerRequest {
            name: name.clone(),
            config: ContainerConfig {
                image: service.image.clone(),
                cmd: service.command.clone(),
                env: Env::from_service(&service.environment),
                exposed_ports,
                labels: Labels::managed(stack, &service.name),
            },
            host: HostConfig {
                binds: bind_mounts(&service.volumes),
                port_bindings,
                restart_policy: service.restart,
                cap_add: service.cap_add.clone(),
                network_mode,
            },
            networking,
        };

        match rt.remove_container(&name, true).await {
            Ok(()) => debug!(container = %name, "removed previous container"),
            Err(e) if e.is_not_found() => {}
            Err(e) => debug!(container = %name, error = %e, "stale container removal failed"),
        }

        let id = rt
            .create_container(request)
            .await
            .map_err(|e| (SkipReason::Create, e.to_string()))?;
        rt.start_container(&id)
            .await
            .map_err(|e| (SkipReason::Start, e.to_string()))?;

        info!(service = %service.name, container = %name, id = short_id(&id), "container started");
        Ok(())
    }

    /// Stop and force-remove every container of `stack`, stopped ones included.
    ///
    /// Never fails: per-container errors are logged and listed in the report.
    #[instrument(level = "info", skip(self))]
    pub async fn stop(&self, stack: &str) -> StopReport {
        let mut report = StopReport::default();
        let containers = match self
            .runtime()
            .list_containers(&ContainerFilter::stack(stack), true)
            .await
        {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "failed to list stack containers");
                return report;
            }
        };

        for container in containers {
            let name = container.display_name().to_string();
            if let Err(e) = self
                .runtime()
                .stop_container(&container.id, self.cfg.stop_grace())
                .await
            {
                warn!(container = %name, error = %e, "failed to stop container");
                self.ctx.metrics().record_runtime_error("stop");
                report.failures.push(TeardownFailure {
                    container: name.clone(),
                    operation: "stop",
                    error: e.to_string(),
                });
            }
            match self.runtime().remove_container(&container.id, true).await {
                Ok(()) => {
                    debug!(container = %name, "container removed");
                    report.removed.push(name);
                }
                Err(e) => {
                    warn!(container = %name, error = %e, "failed to remove container");
                    self.ctx.metrics().record_runtime_error("remove");
                    report.failures.push(TeardownFailure {
                        container: name,
                        operation: "remove",
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            removed = report.removed.len(),
            failed = report.failures.len(),
            "stack stopped"
        );
        report
    }

    /// `Operational` when at least one container of the stack is running.
    pub async fn status(&self, stack: &str) -> Result<StackStatus, CoreError> {
        let running = self
            .runtime()
            .list_containers(&ContainerFilter::stack(stack), false)
            .await?;
        Ok(if running.is_empty() {
            StackStatus::Stopped
        } else {
            StackStatus::Operational
        })
    }

    /// Running containers of the stack with the leading `/` stripped from names.
    pub async fn list_containers(&self, stack: &str) -> Result<Vec<ContainerSummary>, CoreError> {
        let running = self
            .runtime()
            .list_containers(&ContainerFilter::stack(stack), false)
            .await?;
        Ok(running
            .into_iter()
            .map(|c| ContainerSummary {
                name: c.display_name().to_string(),
                ..c
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        metrics::{MetricsBackend, SessionOutcome},
        runtime::{ContainerStatus, HealthStatus},
        testing::{FakeContainer, FakeOp, FakeRuntime},
    };
    use flotilla_model::{
        DependencyCondition, LABEL_MANAGED, NetworkPlacement, PortMapping, RestartPolicy,
        VolumeBinding,
    };

    #[derive(Default)]
    struct CountingMetrics {
        started: AtomicUsize,
        skipped: Mutex<Vec<SkipReason>>,
        errors: Mutex<Vec<String>>,
    }

    impl MetricsBackend for CountingMetrics {
        fn record_service_started(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn record_service_skipped(&self, reason: SkipReason) {
            self.skipped.lock().unwrap().push(reason);
        }
        fn record_runtime_error(&self, operation: &str) {
            self.errors.lock().unwrap().push(operation.to_string());
        }
        fn record_session_started(&self, _: &str) {}
        fn record_session_completed(&self, _: &str, _: SessionOutcome, _: u64) {}
    }

    fn mk_reconciler() -> (Arc<FakeRuntime>, StackReconciler) {
        let rt = Arc::new(FakeRuntime::new());
        let reconciler = StackReconciler::new(RuntimeContext::new(rt.clone()));
        (rt, reconciler)
    }

    fn short_waits() -> ReconcileConfig {
        ReconcileConfig {
            dependency_timeout_ms: 3_000,
            dependency_poll_ms: 100,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_creates_labeled_containers() {
        let (rt, reconciler) = mk_reconciler();
        let mut web = ServiceSpec::new("web", "nginx:1.27");
        web.ports.push(PortMapping::published(80, 8080));
        web.volumes.push(VolumeBinding::bind("./html", "/usr/share/nginx/html"));
        web.environment.insert("MODE".into(), Some("prod".into()));
        web.environment.insert("UNSET".into(), None);
        web.restart = RestartPolicy::UnlessStopped;
        let project = Project::new("shop").with_service(web);

        let report = reconciler
            .start("shop", &project, &CancellationToken::new())
            .await;

        assert_eq!(report.started, vec!["web"]);
        assert!(report.is_complete());
        let c = rt.container("shop_web_1").expect("container created");
        assert_eq!(c.status, ContainerStatus::Running);
        assert_eq!(c.labels, Labels::managed("shop", "web"));
        assert_eq!(c.labels.get(LABEL_MANAGED), Some("true"));

        let req = c.request.expect("create request recorded");
        assert_eq!(req.config.env.render(), vec!["MODE=prod"]);
        assert!(req.config.exposed_ports.contains("80/tcp"));
        assert_eq!(req.host.port_bindings["80/tcp"][0].host_port, 8080);
        assert_eq!(req.host.binds, vec!["./html:/usr/share/nginx/html"]);
        assert_eq!(req.host.restart_policy, RestartPolicy::UnlessStopped);
        assert!(req.host.network_mode.is_none());
        assert!(req.networking.is_none());
    }

    #[tokio::test]
    async fn start_twice_keeps_one_container_per_service() {
        let (rt, reconciler) = mk_reconciler();
        let project = Project::new("s")
            .with_service(ServiceSpec::new("web", "nginx").with_container_name("s-web"))
            .with_service(ServiceSpec::new("db", "postgres").with_container_name("s-db"));
        let cancel = CancellationToken::new();

        reconciler.start("s", &project, &cancel).await;
        let second = reconciler.start("s", &project, &cancel).await;

        assert!(second.is_complete());
        assert_eq!(rt.running_names(), vec!["s-db", "s-web"]);
        assert_eq!(rt.containers().len(), 2);
    }

    #[tokio::test]
    async fn start_twice_with_generated_names_adds_an_instance() {
        let (rt, reconciler) = mk_reconciler();
        let project = Project::new("s").with_service(ServiceSpec::new("web", "nginx"));
        let cancel = CancellationToken::new();

        reconciler.start("s", &project, &cancel).await;
        let second = reconciler.start("s", &project, &cancel).await;

        assert!(second.is_complete());
        assert_eq!(rt.running_names(), vec!["s_web_1", "s_web_2"]);
    }

    #[tokio::test]
    async fn dependency_is_created_before_dependent() {
        let (rt, reconciler) = mk_reconciler();
        let reconciler = reconciler.with_config(short_waits());
        let project = Project::new("s")
            .with_service(
                ServiceSpec::new("api", "api").with_dependency("db", DependencyCondition::Started),
            )
            .with_service(ServiceSpec::new("db", "postgres"));

        let report = reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        assert_eq!(report.started, vec!["db", "api"]);
        let creates: Vec<_> = rt
            .calls()
            .into_iter()
            .filter(|c| c.op == FakeOp::Create)
            .map(|c| c.target)
            .collect();
        assert_eq!(creates, vec!["s_db_1", "s_api_1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unready_dependency_skips_dependent() {
        let rt = Arc::new(FakeRuntime::new());
        let metrics = Arc::new(CountingMetrics::default());
        let reconciler = StackReconciler::new(
            RuntimeContext::new(rt.clone()).with_metrics(metrics.clone()),
        )
        .with_config(short_waits());
        let project = Project::new("s")
            .with_service(
                ServiceSpec::new("api", "api")
                    .with_dependency("db", DependencyCondition::ServiceHealthy),
            )
            .with_service(ServiceSpec::new("db", "postgres"))
            .with_service(ServiceSpec::new("web", "nginx"));

        let report = reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        assert_eq!(report.started, vec!["db", "web"]);
        assert_eq!(report.skipped_reason("api"), Some(SkipReason::Dependency));
        assert!(rt.container("s_api_1").is_none());
        assert_eq!(metrics.started.load(Ordering::SeqCst), 2);
        assert_eq!(*metrics.skipped.lock().unwrap(), vec![SkipReason::Dependency]);
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_dependency_unblocks_dependent() {
        let (rt, reconciler) = mk_reconciler();
        let reconciler = reconciler.with_config(short_waits());
        let project = Project::new("s")
            .with_service(
                ServiceSpec::new("api", "api")
                    .with_dependency("db", DependencyCondition::ServiceHealthy),
            )
            .with_service(ServiceSpec::new("db", "postgres").with_container_name("pg"));
        let flip = rt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            flip.set_health("pg", Some(HealthStatus::Healthy));
        });

        let report = reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        assert_eq!(report.started, vec!["db", "api"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cyclic_services_are_both_skipped() {
        let (rt, reconciler) = mk_reconciler();
        let project = Project::new("s")
            .with_service(
                ServiceSpec::new("a", "img").with_dependency("b", DependencyCondition::Started),
            )
            .with_service(
                ServiceSpec::new("b", "img").with_dependency("a", DependencyCondition::Started),
            );
        let reconciler = reconciler.with_config(short_waits());

        let report = reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        assert!(report.started.is_empty());
        assert_eq!(report.skipped_reason("a"), Some(SkipReason::Dependency));
        assert_eq!(report.skipped_reason("b"), Some(SkipReason::Dependency));
        assert_eq!(rt.count(FakeOp::Create, None), 0);
        assert!(rt.count(FakeOp::Inspect, Some("s_a_1")) > 0);
        assert!(rt.count(FakeOp::Inspect, Some("s_b_1")) > 0);
    }

    #[tokio::test]
    async fn unresolvable_network_skips_only_that_service() {
        let (rt, reconciler) = mk_reconciler();
        rt.add_network("n1", "bridge");
        let project = Project::new("s")
            .with_service(
                ServiceSpec::new("api", "api")
                    .with_network(NetworkPlacement::Networks(vec!["ghost".into()])),
            )
            .with_service(ServiceSpec::new("web", "nginx"));

        let report = reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        assert_eq!(report.started, vec!["web"]);
        assert_eq!(report.skipped_reason("api"), Some(SkipReason::Network));
        assert!(report.skipped[0].error.contains("ghost"));
    }

    #[tokio::test]
    async fn named_network_is_attached_by_resolved_name() {
        let (rt, reconciler) = mk_reconciler();
        rt.add_network("9f3c", "backend");
        let project = Project::new("s").with_service(
            ServiceSpec::new("api", "api").with_network(NetworkPlacement::Networks(vec!["9f3c".into()])),
        );

        reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        let c = rt.container("s_api_1").unwrap();
        assert_eq!(c.networks, vec!["backend"]);
    }

    #[tokio::test]
    async fn service_network_mode_joins_peer_container() {
        let (rt, reconciler) = mk_reconciler();
        let project = Project::new("s")
            .with_service(ServiceSpec::new("vpn", "wg"))
            .with_service(
                ServiceSpec::new("app", "img")
                    .with_network(NetworkPlacement::Mode("service:vpn".into())),
            );

        reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        let req = rt.container("s_app_1").unwrap().request.unwrap();
        assert_eq!(req.host.network_mode.as_deref(), Some("container:s_vpn_1"));
        assert!(req.networking.is_none());
    }

    #[tokio::test]
    async fn create_and_start_failures_are_contained() {
        let (rt, reconciler) = mk_reconciler();
        rt.fail_on(FakeOp::Create, Some("bad-create"));
        let project = Project::new("s")
            .with_service(ServiceSpec::new("a", "img").with_container_name("bad-create"))
            .with_service(ServiceSpec::new("b", "img"));

        let report = reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        assert_eq!(report.started, vec!["b"]);
        assert_eq!(report.skipped_reason("a"), Some(SkipReason::Create));
    }

    #[tokio::test]
    async fn update_pulls_images_and_prunes() {
        let (rt, reconciler) = mk_reconciler();
        rt.fail_on(FakeOp::Pull, Some("broken:latest"));
        let project = Project::new("s")
            .with_service(ServiceSpec::new("a", "broken:latest"))
            .with_service(ServiceSpec::new("b", "ok:1"));

        let report = reconciler
            .update("s", &project, &CancellationToken::new())
            .await;

        assert_eq!(report.started, vec!["a", "b"]);
        assert_eq!(rt.count(FakeOp::Pull, None), 2);
        assert_eq!(rt.count(FakeOp::Prune, None), 1);
    }

    #[tokio::test]
    async fn start_does_not_pull_or_prune() {
        let (rt, reconciler) = mk_reconciler();
        let project = Project::new("s").with_service(ServiceSpec::new("a", "img"));

        reconciler
            .start("s", &project, &CancellationToken::new())
            .await;

        assert_eq!(rt.count(FakeOp::Pull, None), 0);
        assert_eq!(rt.count(FakeOp::Prune, None), 0);
    }

    #[tokio::test]
    async fn stop_removes_all_stack_containers() {
        let (rt, reconciler) = mk_reconciler();
        rt.insert_container(FakeContainer::running("c1", "s_web_1", Labels::managed("s", "web")));
        rt.insert_container(
            FakeContainer::running("c2", "s_job_1", Labels::managed("s", "job"))
                .with_status(ContainerStatus::Exited),
        );
        rt.insert_container(FakeContainer::running("c3", "t_web_1", Labels::managed("t", "web")));

        let report = reconciler.stop("s").await;

        assert_eq!(report.removed, vec!["s_web_1", "s_job_1"]);
        assert!(report.failures.is_empty());
        assert_eq!(rt.running_names(), vec!["t_web_1"]);
        assert_eq!(rt.containers().len(), 1);
    }

    #[tokio::test]
    async fn stop_on_empty_stack_succeeds() {
        let (_rt, reconciler) = mk_reconciler();

        let report = reconciler.stop("nothing").await;

        assert_eq!(report, StopReport::default());
    }

    #[tokio::test]
    async fn stop_failures_are_reported_not_raised() {
        let (rt, reconciler) = mk_reconciler();
        rt.insert_container(FakeContainer::running("c1", "s_web_1", Labels::managed("s", "web")));
        rt.fail_on(FakeOp::Stop, None);

        let report = reconciler.stop("s").await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].operation, "stop");
        assert_eq!(report.removed, vec!["s_web_1"]);
    }

    #[tokio::test]
    async fn status_reflects_running_containers() {
        let (rt, reconciler) = mk_reconciler();
        assert_eq!(reconciler.status("s").await.unwrap(), StackStatus::Stopped);

        rt.insert_container(
            FakeContainer::running("c1", "s_web_1", Labels::managed("s", "web"))
                .with_status(ContainerStatus::Exited),
        );
        assert_eq!(reconciler.status("s").await.unwrap(), StackStatus::Stopped);

        rt.set_status("c1", ContainerStatus::Running, 0);
        assert_eq!(reconciler.status("s").await.unwrap(), StackStatus::Operational);
    }

    #[tokio::test]
    async fn status_propagates_listing_errors() {
        let (rt, reconciler) = mk_reconciler();
        rt.fail_on(FakeOp::List, None);

        assert!(matches!(
            reconciler.status("s").await,
            Err(CoreError::Runtime(_))
        ));
    }

    #[tokio::test]
    async fn list_containers_strips_leading_slash() {
        let (rt, reconciler) = mk_reconciler();
        rt.insert_container(FakeContainer::running("c1", "s_web_1", Labels::managed("s", "web")));

        let list = reconciler.list_containers("s").await.unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "s_web_1");
    }
}
