//! Container runtime client abstraction consumed by the core.
//!
//! The core never talks to an engine directly: every list/inspect/create/start/stop/remove,
//! exec and log call goes through [`RuntimeClient`]. Implementations must be safe to share
//! between concurrent reconciliations and streaming sessions.
mod error;
pub use error::{RuntimeError, RuntimeResult};

mod types;
pub use types::{
    BoxedReader, BoxedWriter, ContainerConfig, ContainerFilter, ContainerInspect, ContainerState,
    ContainerStatus, ContainerSummary, CreateContainerRequest, ExecConfig, ExecStream,
    HealthStatus, HostConfig, LogOptions, LogStream, NetworkSummary, NetworkingConfig,
    PortBinding, PruneReport, short_id,
};

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

/// Operations the core needs from a container runtime.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// List containers matching `filter`; stopped ones only when `include_stopped` is set.
    async fn list_containers(
        &self,
        filter: &ContainerFilter,
        include_stopped: bool,
    ) -> RuntimeResult<Vec<ContainerSummary>>;

    /// Inspect a container by id or name.
    async fn inspect_container(&self, id_or_name: &str) -> RuntimeResult<ContainerInspect>;

    /// Create a container and return its id.
    async fn create_container(&self, request: CreateContainerRequest) -> RuntimeResult<String>;

    async fn start_container(&self, id: &str) -> RuntimeResult<()>;

    /// Stop a container, killing it once `grace` has elapsed.
    async fn stop_container(&self, id: &str, grace: Duration) -> RuntimeResult<()>;

    async fn remove_container(&self, id_or_name: &str, force: bool) -> RuntimeResult<()>;

    async fn list_networks(&self) -> RuntimeResult<Vec<NetworkSummary>>;

    /// Pull an image, draining the progress stream.
    async fn pull_image(&self, reference: &str) -> RuntimeResult<()>;

    async fn prune_dangling_images(&self) -> RuntimeResult<PruneReport>;

    /// Create an exec instance in a running container and return its id.
    async fn exec_create(&self, container_id: &str, config: ExecConfig) -> RuntimeResult<String>;

    /// Attach to an exec instance, starting it.
    async fn exec_attach(&self, exec_id: &str) -> RuntimeResult<ExecStream>;

    /// Open the framed log stream of a container.
    async fn follow_logs(&self, container_id: &str, options: LogOptions)
    -> RuntimeResult<LogStream>;
}

/// Shared handle to a runtime client.
pub type RuntimeHandle = Arc<dyn RuntimeClient>;
