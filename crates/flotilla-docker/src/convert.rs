//! Pure conversions between runtime value types and Docker Engine API models.
use std::collections::HashMap;

use bollard::{
    container::{
        Config, CreateContainerOptions, ListContainersOptions, LogOutput, LogsOptions,
        NetworkingConfig as EngineNetworking,
    },
    exec::CreateExecOptions,
    models::{
        ContainerInspectResponse, ContainerStateStatusEnum, ContainerSummary as EngineSummary,
        EndpointSettings, HealthStatusEnum, HostConfig as EngineHostConfig,
        PortBinding as EnginePortBinding, RestartPolicy as EngineRestartPolicy,
        RestartPolicyNameEnum,
    },
};
use bytes::Bytes;

use flotilla_core::runtime::{
    ContainerFilter, ContainerInspect, ContainerState, ContainerStatus, ContainerSummary,
    CreateContainerRequest, ExecConfig, HealthStatus, LogOptions, RuntimeError, RuntimeResult,
};
use flotilla_model::{Labels, RestartPolicy};
use flotilla_stream::logs::{FRAME_HEADER_LEN, FrameHeader, StreamKind};

// ============================================================================
// Listing and inspection
// ============================================================================

/// Listing options for `filter`: one `label=k=v` entry per selector label, plus `name`.
pub fn list_options(filter: &ContainerFilter, include_stopped: bool) -> ListContainersOptions<String> {
    let mut filters: HashMap<String, Vec<String>> = HashMap::new();
    if !filter.labels.is_empty() {
        filters.insert(
            "label".to_string(),
            filter.labels.iter().map(|(k, v)| format!("{k}={v}")).collect(),
        );
    }
    if let Some(name) = &filter.name {
        filters.insert("name".to_string(), vec![name.clone()]);
    }
    ListContainersOptions {
        all: include_stopped,
        filters,
        ..Default::default()
    }
}

/// `None` for entries without an id or with a state the core does not know.
pub fn container_summary(raw: EngineSummary) -> Option<ContainerSummary> {
    let status = raw.state.as_deref()?.parse::<ContainerStatus>().ok()?;
    Some(ContainerSummary {
        id: raw.id?,
        name: raw
            .names
            .and_then(|names| names.into_iter().next())
            .unwrap_or_default(),
        labels: Labels(raw.labels.unwrap_or_default().into_iter().collect()),
        status,
    })
}

fn container_status(status: ContainerStateStatusEnum) -> Option<ContainerStatus> {
    match status {
        ContainerStateStatusEnum::CREATED => Some(ContainerStatus::Created),
        ContainerStateStatusEnum::RUNNING => Some(ContainerStatus::Running),
        ContainerStateStatusEnum::PAUSED => Some(ContainerStatus::Paused),
        ContainerStateStatusEnum::RESTARTING => Some(ContainerStatus::Restarting),
        ContainerStateStatusEnum::REMOVING => Some(ContainerStatus::Removing),
        ContainerStateStatusEnum::EXITED => Some(ContainerStatus::Exited),
        ContainerStateStatusEnum::DEAD => Some(ContainerStatus::Dead),
        ContainerStateStatusEnum::EMPTY => None,
    }
}

fn health_status(status: HealthStatusEnum) -> Option<HealthStatus> {
    match status {
        HealthStatusEnum::STARTING => Some(HealthStatus::Starting),
        HealthStatusEnum::HEALTHY => Some(HealthStatus::Healthy),
        HealthStatusEnum::UNHEALTHY => Some(HealthStatus::Unhealthy),
        HealthStatusEnum::NONE | HealthStatusEnum::EMPTY => None,
    }
}

/// Inspect result without a lifecycle state is reported as an API error.
pub fn container_inspect(raw: ContainerInspectResponse) -> RuntimeResult<ContainerInspect> {
    let id = raw.id.unwrap_or_default();
    let state = raw.state.unwrap_or_default();
    let status = state
        .status
        .and_then(container_status)
        .ok_or_else(|| RuntimeError::Api(format!("container '{id}' reported no state")))?;

    let mut networks: Vec<String> = raw
        .network_settings
        .and_then(|settings| settings.networks)
        .map(|attached| attached.into_keys().collect())
        .unwrap_or_default();
    networks.sort();

    Ok(ContainerInspect {
        id,
        name: raw.name.unwrap_or_default(),
        state: ContainerState {
            status,
            exit_code: state.exit_code.unwrap_or_default(),
            health: state
                .health
                .and_then(|health| health.status)
                .and_then(health_status),
        },
        networks,
    })
}

// ============================================================================
// Container creation
// ============================================================================

pub fn create_options(request: &CreateContainerRequest) -> CreateContainerOptions<String> {
    CreateContainerOptions {
        name: request.name.clone(),
        platform: None,
    }
}

pub fn restart_policy(policy: RestartPolicy) -> EngineRestartPolicy {
    let name = match policy {
        RestartPolicy::No => RestartPolicyNameEnum::NO,
        RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
        RestartPolicy::OnFailure { .. } => RestartPolicyNameEnum::ON_FAILURE,
        RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
    };
    EngineRestartPolicy {
        name: Some(name),
        maximum_retry_count: policy.max_retries().map(i64::from),
    }
}

/// Container config for a create call.
///
/// An empty command keeps the image default; no networking config means the default bridge.
pub fn create_config(request: &CreateContainerRequest) -> Config<String> {
    let cfg = &request.config;
    let host = &request.host;

    let exposed_ports: HashMap<String, HashMap<(), ()>> = cfg
        .exposed_ports
        .iter()
        .map(|port| (port.clone(), HashMap::new()))
        .collect();

    let port_bindings: HashMap<String, Option<Vec<EnginePortBinding>>> = host
        .port_bindings
        .iter()
        .map(|(port, bindings)| {
            let bindings = bindings
                .iter()
                .map(|b| EnginePortBinding {
                    host_ip: Some(b.host_ip.to_string()),
                    host_port: Some(b.host_port.to_string()),
                })
                .collect();
            (port.clone(), Some(bindings))
        })
        .collect();

    let host_config = EngineHostConfig {
        binds: Some(host.binds.clone()),
        port_bindings: Some(port_bindings),
        restart_policy: Some(restart_policy(host.restart_policy)),
        cap_add: (!host.cap_add.is_empty()).then(|| host.cap_add.clone()),
        network_mode: host.network_mode.clone(),
        ..Default::default()
    };

    let networking_config = request.networking.as_ref().map(|net| EngineNetworking {
        endpoints_config: net
            .endpoints
            .iter()
            .map(|name| (name.clone(), EndpointSettings::default()))
            .collect(),
    });

    Config {
        image: Some(cfg.image.clone()),
        cmd: (!cfg.cmd.is_empty()).then(|| cfg.cmd.clone()),
        env: Some(cfg.env.render()),
        labels: Some(
            cfg.labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        exposed_ports: Some(exposed_ports),
        host_config: Some(host_config),
        networking_config,
        ..Default::default()
    }
}

// ============================================================================
// Images
// ============================================================================

/// Split an image reference into the `fromImage` and `tag` pull parameters.
///
/// A reference without tag or digest is pulled as `latest`; the engine would otherwise pull
/// every tag of the repository.
pub fn split_reference(reference: &str) -> (&str, &str) {
    if reference.contains('@') {
        return (reference, "");
    }
    let name_start = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
    match reference[name_start..].rfind(':') {
        Some(i) => {
            let at = name_start + i;
            (&reference[..at], &reference[at + 1..])
        }
        None => (reference, "latest"),
    }
}

// ============================================================================
// Exec and logs
// ============================================================================

pub fn exec_options(config: &ExecConfig) -> CreateExecOptions<String> {
    CreateExecOptions {
        cmd: Some(config.cmd.clone()),
        tty: Some(config.tty),
        attach_stdin: Some(config.attach_stdin),
        attach_stdout: Some(config.attach_stdout),
        attach_stderr: Some(config.attach_stderr),
        ..Default::default()
    }
}

pub fn logs_options(options: &LogOptions) -> LogsOptions<String> {
    LogsOptions {
        follow: options.follow.is_enabled(),
        stdout: options.stdout.is_enabled(),
        stderr: options.stderr.is_enabled(),
        tail: options.tail.clone(),
        ..Default::default()
    }
}

fn split_output(output: LogOutput) -> (StreamKind, Bytes) {
    match output {
        LogOutput::StdIn { message } => (StreamKind::Stdin, message),
        LogOutput::StdOut { message } => (StreamKind::Stdout, message),
        LogOutput::StdErr { message } => (StreamKind::Stderr, message),
        // TTY containers are not multiplexed
        LogOutput::Console { message } => (StreamKind::Stdout, message),
    }
}

/// Raw bytes of one output chunk, whatever stream it came from.
pub fn output_payload(output: LogOutput) -> Bytes {
    split_output(output).1
}

/// Re-frame one demultiplexed chunk with the 8-byte log header.
pub fn frame_log_output(output: LogOutput) -> Bytes {
    let (kind, message) = split_output(output);
    let mut framed = Vec::with_capacity(FRAME_HEADER_LEN + message.len());
    framed.extend_from_slice(&FrameHeader::new(kind, message.len() as u32).encode());
    framed.extend_from_slice(&message);
    Bytes::from(framed)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use bollard::models::{ContainerState as EngineState, Health, NetworkSettings};
    use flotilla_core::runtime::{ContainerConfig, HostConfig, NetworkingConfig, PortBinding};
    use flotilla_model::{Env, Flag};

    use super::*;

    #[test]
    fn filter_becomes_label_and_name_entries() {
        let opts = list_options(&ContainerFilter::service("shop", "web"), true);
        let mut labels = opts.filters["label"].clone();
        labels.sort();

        assert!(opts.all);
        assert_eq!(labels, vec!["service=web", "stack=shop"]);
        assert!(!opts.filters.contains_key("name"));

        let opts = list_options(&ContainerFilter::name("vpn"), false);
        assert!(!opts.all);
        assert_eq!(opts.filters["name"], vec!["vpn"]);
        assert!(!opts.filters.contains_key("label"));
    }

    #[test]
    fn summary_keeps_first_name_and_labels() {
        let raw = EngineSummary {
            id: Some("abc".into()),
            names: Some(vec!["/shop_web_1".into(), "/alias".into()]),
            labels: Some(HashMap::from([("stack".into(), "shop".into())])),
            state: Some("running".into()),
            ..Default::default()
        };

        let summary = container_summary(raw).unwrap();

        assert_eq!(summary.id, "abc");
        assert_eq!(summary.display_name(), "shop_web_1");
        assert_eq!(summary.labels.get("stack"), Some("shop"));
        assert_eq!(summary.status, ContainerStatus::Running);
    }

    #[test]
    fn summary_with_unknown_state_is_dropped() {
        let raw = EngineSummary {
            id: Some("abc".into()),
            state: Some("zombie".into()),
            ..Default::default()
        };
        assert!(container_summary(raw).is_none());
    }

    #[test]
    fn inspect_maps_state_health_and_sorted_networks() {
        let raw = ContainerInspectResponse {
            id: Some("abc".into()),
            name: Some("/s_db_1".into()),
            state: Some(EngineState {
                status: Some(ContainerStateStatusEnum::EXITED),
                exit_code: Some(3),
                health: Some(Health {
                    status: Some(HealthStatusEnum::UNHEALTHY),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            network_settings: Some(NetworkSettings {
                networks: Some(HashMap::from([
                    ("zeta".to_string(), EndpointSettings::default()),
                    ("appnet".to_string(), EndpointSettings::default()),
                ])),
                ..Default::default()
            }),
            ..Default::default()
        };

        let inspect = container_inspect(raw).unwrap();

        assert_eq!(inspect.state.status, ContainerStatus::Exited);
        assert_eq!(inspect.state.exit_code, 3);
        assert_eq!(inspect.state.health, Some(HealthStatus::Unhealthy));
        assert_eq!(inspect.networks, vec!["appnet", "zeta"]);
    }

    #[test]
    fn inspect_without_health_check_has_no_health() {
        let raw = ContainerInspectResponse {
            state: Some(EngineState {
                status: Some(ContainerStateStatusEnum::RUNNING),
                health: Some(Health {
                    status: Some(HealthStatusEnum::NONE),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let inspect = container_inspect(raw).unwrap();

        assert_eq!(inspect.state.health, None);
        assert!(inspect.networks.is_empty());
    }

    #[test]
    fn inspect_without_state_is_an_error() {
        let raw = ContainerInspectResponse {
            id: Some("abc".into()),
            ..Default::default()
        };
        assert!(matches!(container_inspect(raw), Err(RuntimeError::Api(_))));
    }

    fn request() -> CreateContainerRequest {
        let mut env = Env::new();
        env.push("MODE", "prod");
        CreateContainerRequest {
            name: "shop_web_1".into(),
            config: ContainerConfig {
                image: "nginx:1.27".into(),
                cmd: Vec::new(),
                env,
                exposed_ports: BTreeSet::from(["80/tcp".to_string()]),
                labels: Labels::managed("shop", "web"),
            },
            host: HostConfig {
                binds: vec!["./html:/usr/share/nginx/html:ro".into()],
                port_bindings: BTreeMap::from([(
                    "80/tcp".to_string(),
                    vec![PortBinding {
                        host_ip: "0.0.0.0".parse().unwrap(),
                        host_port: 8080,
                    }],
                )]),
                restart_policy: RestartPolicy::OnFailure {
                    max_retries: Some(5),
                },
                cap_add: vec!["NET_ADMIN".into()],
                network_mode: None,
            },
            networking: Some(NetworkingConfig::single("backend")),
        }
    }

    #[test]
    fn create_config_carries_every_setting() {
        let req = request();
        let config = create_config(&req);

        assert_eq!(create_options(&req).name, "shop_web_1");
        assert_eq!(config.image.as_deref(), Some("nginx:1.27"));
        assert!(config.cmd.is_none());
        assert_eq!(config.env, Some(vec!["MODE=prod".to_string()]));
        assert_eq!(config.labels.as_ref().unwrap()["managed"], "true");
        assert!(config.exposed_ports.as_ref().unwrap().contains_key("80/tcp"));

        let host = config.host_config.unwrap();
        assert_eq!(host.binds, Some(vec!["./html:/usr/share/nginx/html:ro".to_string()]));
        let bindings = host.port_bindings.unwrap();
        let binding = bindings["80/tcp"].as_ref().unwrap()[0].clone();
        assert_eq!(binding.host_ip.as_deref(), Some("0.0.0.0"));
        assert_eq!(binding.host_port.as_deref(), Some("8080"));
        let restart = host.restart_policy.unwrap();
        assert_eq!(restart.name, Some(RestartPolicyNameEnum::ON_FAILURE));
        assert_eq!(restart.maximum_retry_count, Some(5));
        assert_eq!(host.cap_add, Some(vec!["NET_ADMIN".to_string()]));
        assert!(host.network_mode.is_none());

        let endpoints = config.networking_config.unwrap().endpoints_config;
        assert_eq!(endpoints.keys().collect::<Vec<_>>(), vec!["backend"]);
    }

    #[test]
    fn create_config_with_mode_and_command() {
        let mut req = request();
        req.config.cmd = vec!["nginx".into(), "-g".into(), "daemon off;".into()];
        req.host.network_mode = Some("container:s_vpn_1".into());
        req.host.cap_add.clear();
        req.host.restart_policy = RestartPolicy::UnlessStopped;
        req.networking = None;

        let config = create_config(&req);
        let host = config.host_config.unwrap();

        assert_eq!(config.cmd.unwrap().len(), 3);
        assert_eq!(host.network_mode.as_deref(), Some("container:s_vpn_1"));
        assert!(host.cap_add.is_none());
        assert_eq!(
            host.restart_policy.unwrap().name,
            Some(RestartPolicyNameEnum::UNLESS_STOPPED)
        );
        assert!(config.networking_config.is_none());
    }

    #[test]
    fn references_default_to_latest() {
        assert_eq!(split_reference("nginx"), ("nginx", "latest"));
        assert_eq!(split_reference("nginx:1.27"), ("nginx", "1.27"));
        assert_eq!(
            split_reference("registry.local:5000/team/api"),
            ("registry.local:5000/team/api", "latest")
        );
        assert_eq!(
            split_reference("registry.local:5000/team/api:v2"),
            ("registry.local:5000/team/api", "v2")
        );
        assert_eq!(split_reference("alpine@sha256:abcd"), ("alpine@sha256:abcd", ""));
    }

    #[test]
    fn exec_and_log_options_follow_settings() {
        let exec = exec_options(&ExecConfig::interactive(vec!["/bin/sh".into()]));
        assert_eq!(exec.cmd, Some(vec!["/bin/sh".to_string()]));
        assert_eq!(exec.tty, Some(true));
        assert_eq!(exec.attach_stdin, Some(true));

        let mut options = LogOptions::follow("200");
        options.stderr = Flag::disabled();
        let logs = logs_options(&options);
        assert!(logs.follow && logs.stdout && !logs.stderr);
        assert_eq!(logs.tail, "200");
    }

    #[test]
    fn log_chunks_are_reframed() {
        let framed = frame_log_output(LogOutput::StdErr {
            message: Bytes::from_static(b"oops"),
        });
        assert_eq!(&framed[..], &[2, 0, 0, 0, 0, 0, 0, 4, b'o', b'o', b'p', b's']);

        let console = frame_log_output(LogOutput::Console {
            message: Bytes::from_static(b"$ "),
        });
        assert_eq!(console[0], 1);
        assert_eq!(
            output_payload(LogOutput::Console {
                message: Bytes::from_static(b"$ "),
            }),
            Bytes::from_static(b"$ ")
        );
    }
}
