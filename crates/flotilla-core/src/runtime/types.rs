use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    net::IpAddr,
    str::FromStr,
};

use tokio::io::{AsyncRead, AsyncWrite};

use flotilla_model::{Env, Flag, Labels, RestartPolicy};

use crate::runtime::RuntimeError;

/// Query used to select containers.
///
/// Every label must match exactly; `name`, when set, matches any container
/// whose name contains it (the runtime's own name filter semantics).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFilter {
    pub labels: Labels,
    pub name: Option<String>,
}

impl ContainerFilter {
    /// Every container of a stack.
    pub fn stack(stack: &str) -> Self {
        Self {
            labels: Labels::stack(stack),
            name: None,
        }
    }

    /// Every container of one service of a stack.
    pub fn service(stack: &str, service: &str) -> Self {
        Self {
            labels: Labels::service(stack, service),
            name: None,
        }
    }

    /// Containers whose name contains `name`.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            labels: Labels::new(),
            name: Some(name.into()),
        }
    }

    /// Evaluate the filter against a container summary.
    pub fn matches(&self, container: &ContainerSummary) -> bool {
        let name_ok = match &self.name {
            Some(n) => container.display_name().contains(n.as_str()),
            None => true,
        };
        name_ok && container.labels.matches(&self.labels)
    }
}

/// Container lifecycle state as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerStatus {
    type Err = RuntimeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(ContainerStatus::Created),
            "running" => Ok(ContainerStatus::Running),
            "paused" => Ok(ContainerStatus::Paused),
            "restarting" => Ok(ContainerStatus::Restarting),
            "removing" => Ok(ContainerStatus::Removing),
            "exited" => Ok(ContainerStatus::Exited),
            "dead" => Ok(ContainerStatus::Dead),
            other => Err(RuntimeError::Api(format!("unknown container status: {other}"))),
        }
    }
}

/// Health check status of a container with a health check configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Starting,
    Healthy,
    Unhealthy,
}

/// Entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    /// Name as reported by the runtime, possibly with a leading `/`.
    pub name: String,
    pub labels: Labels,
    pub status: ContainerStatus,
}

impl ContainerSummary {
    /// Name without the runtime's leading `/`.
    pub fn display_name(&self) -> &str {
        self.name.trim_start_matches('/')
    }

    /// First 12 characters of the id, the conventional short form.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// Shorten a container id for log output.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Runtime state of a single container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    pub status: ContainerStatus,
    pub exit_code: i64,
    /// `None` when the container has no health check.
    pub health: Option<HealthStatus>,
}

/// Result of inspecting a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInspect {
    pub id: String,
    pub name: String,
    pub state: ContainerState,
    /// Names of the networks the container is attached to.
    pub networks: Vec<String>,
}

/// Entry of a network listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSummary {
    pub id: String,
    pub name: String,
}

/// Host side of a published port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host_ip: IpAddr,
    pub host_port: u16,
}

/// Container-level settings of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerConfig {
    pub image: String,
    /// Empty keeps the image default command.
    pub cmd: Vec<String>,
    pub env: Env,
    /// Port keys such as `80/tcp`.
    pub exposed_ports: BTreeSet<String>,
    pub labels: Labels,
}

/// Host-level settings of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostConfig {
    /// Bind strings `src:dst[:ro]`.
    pub binds: Vec<String>,
    pub port_bindings: BTreeMap<String, Vec<PortBinding>>,
    pub restart_policy: RestartPolicy,
    pub cap_add: Vec<String>,
    /// Engine network mode (`host`, `none`, `container:<id>`, ...); `None` keeps the default bridge.
    pub network_mode: Option<String>,
}

/// Networks to connect at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkingConfig {
    pub endpoints: BTreeSet<String>,
}

impl NetworkingConfig {
    pub fn single(network: impl Into<String>) -> Self {
        Self {
            endpoints: BTreeSet::from([network.into()]),
        }
    }
}

/// Everything needed to create one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateContainerRequest {
    pub name: String,
    pub config: ContainerConfig,
    pub host: HostConfig,
    pub networking: Option<NetworkingConfig>,
}

/// Outcome of pruning dangling images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub space_reclaimed: u64,
}

/// Exec session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecConfig {
    pub cmd: Vec<String>,
    pub tty: bool,
    pub attach_stdin: bool,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
}

impl ExecConfig {
    /// Interactive pseudo-terminal exec with all standard streams attached.
    pub fn interactive(cmd: Vec<String>) -> Self {
        Self {
            cmd,
            tty: true,
            attach_stdin: true,
            attach_stdout: true,
            attach_stderr: true,
        }
    }
}

/// Log retrieval settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Number of trailing lines, or `all`.
    pub tail: String,
    pub stdout: Flag,
    pub stderr: Flag,
    pub follow: Flag,
}

impl LogOptions {
    /// Follow both output streams starting from the last `tail` lines.
    pub fn follow(tail: impl Into<String>) -> Self {
        Self {
            tail: tail.into(),
            stdout: Flag::enabled(),
            stderr: Flag::enabled(),
            follow: Flag::enabled(),
        }
    }
}

/// Boxed byte source produced by the runtime.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed byte sink produced by the runtime.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Framed, multiplexed stdout/stderr stream of a container.
pub type LogStream = BoxedReader;

/// Duplex byte stream of an attached exec session.
pub struct ExecStream {
    /// Bytes written here reach the exec's stdin.
    pub input: BoxedWriter,
    /// Raw terminal output of the exec.
    pub output: BoxedReader,
}

impl fmt::Debug for ExecStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecStream").finish_non_exhaustive()
    }
}
