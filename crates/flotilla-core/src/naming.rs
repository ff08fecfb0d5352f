//! Container naming for stack services.
//!
//! A service with an explicit `container_name` keeps it. Otherwise containers are named
//! `<stack>_<service>_<n>` where `n` is one more than the number of containers already labeled
//! with the stack and service, stopped ones included. Two reconciliations running at the same
//! time may compute the same ordinal; the second create then fails with a name conflict.
use tracing::warn;

use flotilla_model::ServiceSpec;

use crate::runtime::{ContainerFilter, RuntimeClient};

/// `<stack>_<service>_<ordinal>`.
pub fn default_container_name(stack: &str, service: &str, ordinal: usize) -> String {
    format!("{stack}_{service}_{ordinal}")
}

/// Container a dependent waits on: the explicit name, else the first instance.
pub fn dependency_container_name(stack: &str, service: &ServiceSpec) -> String {
    match &service.container_name {
        Some(name) => name.clone(),
        None => default_container_name(stack, &service.name, 1),
    }
}

/// Next free ordinal for `service` in `stack`.
///
/// A failed listing counts as no existing containers.
pub async fn next_ordinal(runtime: &dyn RuntimeClient, stack: &str, service: &str) -> usize {
    let filter = ContainerFilter::service(stack, service);
    match runtime.list_containers(&filter, true).await {
        Ok(existing) => existing.len() + 1,
        Err(e) => {
            warn!(stack, service, error = %e, "failed to count existing containers");
            1
        }
    }
}

/// Name for the container about to be created for `service`.
pub async fn container_name(runtime: &dyn RuntimeClient, stack: &str, service: &ServiceSpec) -> String {
    if let Some(name) = &service.container_name {
        return name.clone();
    }
    let ordinal = next_ordinal(runtime, stack, &service.name).await;
    default_container_name(stack, &service.name, ordinal)
}
