use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::service::{
    Dependency, DependencyCondition, NetworkPlacement, PortMapping, RestartPolicy, VolumeBinding,
};

/// One service of a stack, as produced by the project loader.
///
/// Environment substitution is already applied; the reconciler only reads it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSpec {
    /// Service key within the project.
    pub name: String,
    /// Image reference (e.g. `postgres:16`).
    pub image: String,
    /// Command override; empty keeps the image default.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Environment; `None` means "inherit, do not set".
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortMapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeBinding>,
    pub network: NetworkPlacement,
    /// Dependencies in declared order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Dependency>,
    pub restart: RestartPolicy,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,
    /// Explicit container name, used verbatim when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
}

impl ServiceSpec {
    /// Minimal service running `image`.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper adding a `depends_on` entry.
    pub fn with_dependency(
        mut self,
        service: impl Into<String>,
        condition: DependencyCondition,
    ) -> Self {
        self.depends_on.push(Dependency::new(service, condition));
        self
    }

    /// Builder-style helper setting an explicit container name.
    pub fn with_container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = Some(name.into());
        self
    }

    /// Builder-style helper setting the network placement.
    pub fn with_network(mut self, network: NetworkPlacement) -> Self {
        self.network = network;
        self
    }
}
