use std::collections::{BTreeMap, BTreeSet};

use flotilla_model::{
    NetworkPlacement, NetworkReference, PortMapping, Project, ServiceSpec, VolumeBinding,
};

use crate::{
    naming::{default_container_name, dependency_container_name},
    runtime::PortBinding,
};

/// Exposed port keys and host bindings for a service's port mappings.
///
/// Every mapping is exposed; only mappings with a published host port get a binding.
pub fn port_config(
    ports: &[PortMapping],
) -> (BTreeSet<String>, BTreeMap<String, Vec<PortBinding>>) {
    let mut exposed = BTreeSet::new();
    let mut bindings: BTreeMap<String, Vec<PortBinding>> = BTreeMap::new();
    for port in ports {
        let key = port.port_key();
        exposed.insert(key.clone());
        if let Some(host_port) = port.published {
            bindings.entry(key).or_default().push(PortBinding {
                host_ip: port.host_ip_or_default(),
                host_port,
            });
        }
    }
    (exposed, bindings)
}

/// Bind strings for bind-type volumes; other kinds are not realized.
pub fn bind_mounts(volumes: &[VolumeBinding]) -> Vec<String> {
    volumes.iter().filter_map(VolumeBinding::bind_spec).collect()
}

/// Where a new container will be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkPlan {
    /// Runtime default bridge.
    Default,
    /// Engine network mode, passed as-is.
    Mode(String),
    /// Named network still to be resolved.
    Named(String),
}

/// Derive the network plan of `service`.
///
/// `network_mode` wins over the networks list; of the list only the first entry is used.
/// `service:<x>` joins the namespace of `x`'s container.
pub fn network_plan(stack: &str, project: &Project, service: &ServiceSpec) -> NetworkPlan {
    match &service.network {
        NetworkPlacement::Default => NetworkPlan::Default,
        NetworkPlacement::Networks(networks) => match networks.first() {
            Some(first) => NetworkPlan::Named(first.clone()),
            None => NetworkPlan::Default,
        },
        NetworkPlacement::Mode(mode) => match mode.parse::<NetworkReference>() {
            Ok(reference) if reference.is_passthrough() => NetworkPlan::Mode(mode.clone()),
            Ok(NetworkReference::Service(peer)) => {
                let container = match project.service(&peer) {
                    Some(peer_service) => dependency_container_name(stack, peer_service),
                    None => default_container_name(stack, &peer, 1),
                };
                NetworkPlan::Mode(format!("container:{container}"))
            }
            Ok(_) => NetworkPlan::Named(mode.clone()),
            Err(_) => NetworkPlan::Default,
        },
    }
}
