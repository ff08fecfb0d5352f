use tracing::{debug, instrument, trace};

use flotilla_model::NetworkReference;

use crate::{
    error::CoreError,
    runtime::{ContainerFilter, RuntimeClient},
};

/// Translates symbolic network references into concrete network names.
///
/// Special modes and `container:` references are accepted by the runtime as-is and pass through.
/// `service:<name>` is turned into a network the named container is already attached to; any
/// other token must match a network by exact name or id.
pub struct NetworkResolver<'a> {
    runtime: &'a dyn RuntimeClient,
}

impl<'a> NetworkResolver<'a> {
    pub fn new(runtime: &'a dyn RuntimeClient) -> Self {
        Self { runtime }
    }

    /// Resolve a raw network token.
    ///
    /// Never mutates runtime state. Fails with [`CoreError::NetworkNotFound`] listing every known
    /// network when nothing matches.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, token: &str) -> Result<String, CoreError> {
        let candidate = match token.parse::<NetworkReference>() {
            Ok(reference) if reference.is_passthrough() => return Ok(token.to_string()),
            Ok(NetworkReference::Service(service)) => self.service_network(&service).await,
            _ => token.to_string(),
        };
        self.lookup(&candidate).await
    }

    /// Pick a network attached to the container backing `service`, falling back to the name itself.
    async fn service_network(&self, service: &str) -> String {
        let filter = ContainerFilter::name(service);
        let containers = match self.runtime.list_containers(&filter, true).await {
            Ok(list) => list,
            Err(e) => {
                debug!(service, error = %e, "container lookup for service network failed");
                return service.to_string();
            }
        };
        let Some(first) = containers.first() else {
            return service.to_string();
        };
        match self.runtime.inspect_container(&first.id).await {
            Ok(inspect) => match inspect.networks.into_iter().next() {
                Some(network) => {
                    trace!(service, container = first.display_name(), %network, "service network found");
                    network
                }
                None => service.to_string(),
            },
            Err(e) => {
                debug!(service, error = %e, "inspect for service network failed");
                service.to_string()
            }
        }
    }

    async fn lookup(&self, candidate: &str) -> Result<String, CoreError> {
        let networks = self.runtime.list_networks().await?;
        if let Some(found) = networks
            .iter()
            .find(|n| n.name == candidate || n.id == candidate)
        {
            return Ok(found.name.clone());
        }
        Err(CoreError::NetworkNotFound {
            name: candidate.to_string(),
            known: networks.into_iter().map(|n| n.name).collect(),
        })
    }
}
