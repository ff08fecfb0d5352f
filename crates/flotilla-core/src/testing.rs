//! In-memory [`RuntimeClient`] for tests.
//!
//! `FakeRuntime` keeps containers and networks in a mutex-guarded table, records every call,
//! and lets tests drive container state (status, health, exit code) and inject failures.
use std::{
    collections::{HashMap, VecDeque},
    io::Cursor,
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;

use flotilla_model::Labels;

use crate::runtime::{
    ContainerFilter, ContainerInspect, ContainerState, ContainerStatus, ContainerSummary,
    CreateContainerRequest, ExecConfig, ExecStream, HealthStatus, LogOptions, LogStream,
    NetworkSummary, PruneReport, RuntimeClient, RuntimeError, RuntimeResult,
};

/// Runtime operation, used to inject failures and inspect the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    List,
    Inspect,
    Create,
    Start,
    Stop,
    Remove,
    ListNetworks,
    Pull,
    Prune,
    ExecCreate,
    ExecAttach,
    Logs,
}

/// One recorded call: the operation and its main argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCall {
    pub op: FakeOp,
    pub target: String,
}

/// Container held by [`FakeRuntime`].
#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub labels: Labels,
    pub status: ContainerStatus,
    pub exit_code: i64,
    pub health: Option<HealthStatus>,
    pub networks: Vec<String>,
    pub request: Option<CreateContainerRequest>,
}

impl FakeContainer {
    /// Running container with the given id, name and labels.
    pub fn running(id: impl Into<String>, name: impl Into<String>, labels: Labels) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            labels,
            status: ContainerStatus::Running,
            exit_code: 0,
            health: None,
            networks: Vec::new(),
            request: None,
        }
    }

    pub fn with_networks(mut self, networks: &[&str]) -> Self {
        self.networks = networks.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_status(mut self, status: ContainerStatus) -> Self {
        self.status = status;
        self
    }

    fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            id: self.id.clone(),
            name: format!("/{}", self.name),
            labels: self.labels.clone(),
            status: self.status,
        }
    }
}

#[derive(Default)]
struct FakeState {
    containers: Vec<FakeContainer>,
    networks: Vec<NetworkSummary>,
    calls: Vec<FakeCall>,
    failures: Vec<(FakeOp, Option<String>)>,
    logs: HashMap<String, Vec<u8>>,
    exec_streams: VecDeque<ExecStream>,
    execs: Vec<(String, String, ExecConfig)>,
    log_requests: Vec<(String, LogOptions)>,
    seq: u64,
}

impl FakeState {
    fn find(&self, id_or_name: &str) -> Option<usize> {
        self.containers
            .iter()
            .position(|c| c.id == id_or_name || c.name == id_or_name)
    }

    fn check(&mut self, op: FakeOp, target: &str) -> RuntimeResult<()> {
        self.calls.push(FakeCall {
            op,
            target: target.to_string(),
        });
        let failing = self.failures.iter().any(|(f, t)| {
            *f == op && t.as_deref().map(|t| t == target).unwrap_or(true)
        });
        if failing {
            return Err(RuntimeError::Api(format!("injected {op:?} failure for '{target}'")));
        }
        Ok(())
    }

    fn next_id(&mut self) -> String {
        self.seq += 1;
        format!("{:016x}", self.seq.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

/// In-memory runtime double.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a pre-existing container.
    pub fn insert_container(&self, container: FakeContainer) {
        self.lock().containers.push(container);
    }

    /// Add a network to the listing.
    pub fn add_network(&self, id: &str, name: &str) {
        self.lock().networks.push(NetworkSummary {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    /// Make every call of `op` fail, or only calls targeting `target` when given.
    pub fn fail_on(&self, op: FakeOp, target: Option<&str>) {
        self.lock().failures.push((op, target.map(str::to_string)));
    }

    /// Clear all injected failures.
    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn set_status(&self, id_or_name: &str, status: ContainerStatus, exit_code: i64) {
        let mut state = self.lock();
        if let Some(idx) = state.find(id_or_name) {
            state.containers[idx].status = status;
            state.containers[idx].exit_code = exit_code;
        }
    }

    pub fn set_health(&self, id_or_name: &str, health: Option<HealthStatus>) {
        let mut state = self.lock();
        if let Some(idx) = state.find(id_or_name) {
            state.containers[idx].health = health;
        }
    }

    /// Raw framed bytes returned by `follow_logs` for a container id.
    pub fn set_logs(&self, container_id: &str, bytes: Vec<u8>) {
        self.lock().logs.insert(container_id.to_string(), bytes);
    }

    /// Queue the stream handed out by the next `exec_attach`.
    pub fn push_exec_stream(&self, stream: ExecStream) {
        self.lock().exec_streams.push_back(stream);
    }

    /// Snapshot of all containers.
    pub fn containers(&self) -> Vec<FakeContainer> {
        self.lock().containers.clone()
    }

    pub fn container(&self, id_or_name: &str) -> Option<FakeContainer> {
        let state = self.lock();
        state.find(id_or_name).map(|idx| state.containers[idx].clone())
    }

    /// Names of running containers, sorted.
    pub fn running_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .lock()
            .containers
            .iter()
            .filter(|c| c.status == ContainerStatus::Running)
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls of `op`, optionally restricted to `target`.
    pub fn count(&self, op: FakeOp, target: Option<&str>) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op && target.map(|t| c.target == t).unwrap_or(true))
            .count()
    }

    /// Exec instances created so far as `(exec id, container id, config)`.
    pub fn execs(&self) -> Vec<(String, String, ExecConfig)> {
        self.lock().execs.clone()
    }

    /// Log streams opened so far as `(container id, options)`.
    pub fn log_requests(&self) -> Vec<(String, LogOptions)> {
        self.lock().log_requests.clone()
    }
}

#[async_trait]
impl RuntimeClient for FakeRuntime {
    async fn list_containers(
        &self,
        filter: &ContainerFilter,
        include_stopped: bool,
    ) -> RuntimeResult<Vec<ContainerSummary>> {
        let mut state = self.lock();
        state.check(FakeOp::List, filter.name.as_deref().unwrap_or(""))?;
        Ok(state
            .containers
            .iter()
            .filter(|c| include_stopped || c.status == ContainerStatus::Running)
            .map(FakeContainer::summary)
            .filter(|s| filter.matches(s))
            .collect())
    }

    async fn inspect_container(&self, id_or_name: &str) -> RuntimeResult<ContainerInspect> {
        let mut state = self.lock();
        state.check(FakeOp::Inspect, id_or_name)?;
        let idx = state
            .find(id_or_name)
            .ok_or_else(|| RuntimeError::NotFound(id_or_name.to_string()))?;
        let c = &state.containers[idx];
        Ok(ContainerInspect {
            id: c.id.clone(),
            name: format!("/{}", c.name),
            state: ContainerState {
                status: c.status,
                exit_code: c.exit_code,
                health: c.health,
            },
            networks: c.networks.clone(),
        })
    }

    async fn create_container(&self, request: CreateContainerRequest) -> RuntimeResult<String> {
        let mut state = self.lock();
        state.check(FakeOp::Create, &request.name)?;
        if state.find(&request.name).is_some() {
            return Err(RuntimeError::Conflict(format!(
                "container name '{}' is already in use",
                request.name
            )));
        }
        let networks = match (&request.networking, &request.host.network_mode) {
            (Some(net), _) => net.endpoints.iter().cloned().collect(),
            (None, None) => vec!["bridge".to_string()],
            (None, Some(_)) => Vec::new(),
        };
        let id = state.next_id();
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: request.name.clone(),
            labels: request.config.labels.clone(),
            status: ContainerStatus::Created,
            exit_code: 0,
            health: None,
            networks,
            request: Some(request),
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.check(FakeOp::Start, id)?;
        let idx = state
            .find(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        state.containers[idx].status = ContainerStatus::Running;
        Ok(())
    }

    async fn stop_container(&self, id: &str, _grace: Duration) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.check(FakeOp::Stop, id)?;
        let idx = state
            .find(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        state.containers[idx].status = ContainerStatus::Exited;
        Ok(())
    }

    async fn remove_container(&self, id_or_name: &str, force: bool) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.check(FakeOp::Remove, id_or_name)?;
        let idx = state
            .find(id_or_name)
            .ok_or_else(|| RuntimeError::NotFound(id_or_name.to_string()))?;
        if state.containers[idx].status == ContainerStatus::Running && !force {
            return Err(RuntimeError::Conflict(format!(
                "container '{id_or_name}' is running"
            )));
        }
        state.containers.remove(idx);
        Ok(())
    }

    async fn list_networks(&self) -> RuntimeResult<Vec<NetworkSummary>> {
        let mut state = self.lock();
        state.check(FakeOp::ListNetworks, "")?;
        Ok(state.networks.clone())
    }

    async fn pull_image(&self, reference: &str) -> RuntimeResult<()> {
        self.lock().check(FakeOp::Pull, reference)
    }

    async fn prune_dangling_images(&self) -> RuntimeResult<PruneReport> {
        self.lock().check(FakeOp::Prune, "")?;
        Ok(PruneReport::default())
    }

    async fn exec_create(&self, container_id: &str, config: ExecConfig) -> RuntimeResult<String> {
        let mut state = self.lock();
        state.check(FakeOp::ExecCreate, container_id)?;
        if state.find(container_id).is_none() {
            return Err(RuntimeError::NotFound(container_id.to_string()));
        }
        let exec_id = format!("exec-{}", state.execs.len() + 1);
        state
            .execs
            .push((exec_id.clone(), container_id.to_string(), config));
        Ok(exec_id)
    }

    async fn exec_attach(&self, exec_id: &str) -> RuntimeResult<ExecStream> {
        let mut state = self.lock();
        state.check(FakeOp::ExecAttach, exec_id)?;
        state
            .exec_streams
            .pop_front()
            .ok_or_else(|| RuntimeError::Api(format!("no exec stream queued for '{exec_id}'")))
    }

    async fn follow_logs(
        &self,
        container_id: &str,
        options: LogOptions,
    ) -> RuntimeResult<LogStream> {
        let mut state = self.lock();
        state.check(FakeOp::Logs, container_id)?;
        state
            .log_requests
            .push((container_id.to_string(), options));
        let bytes = state.logs.get(container_id).cloned().unwrap_or_default();
        Ok(Box::new(Cursor::new(bytes)))
    }
}
