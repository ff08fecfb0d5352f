use tracing::debug;

use flotilla_core::runtime::{ContainerFilter, ContainerSummary, RuntimeClient};

use crate::StreamError;

/// Pick the container a session attaches to.
///
/// Among the running containers of `stack`, the first whose id equals or starts with `requested`
/// wins; otherwise the first listed container is used.
pub async fn select_target(
    runtime: &dyn RuntimeClient,
    stack: &str,
    requested: Option<&str>,
) -> Result<ContainerSummary, StreamError> {
    let mut running = runtime
        .list_containers(&ContainerFilter::stack(stack), false)
        .await?;
    if running.is_empty() {
        return Err(StreamError::NoContainers(stack.to_string()));
    }

    let idx = requested
        .filter(|r| !r.is_empty())
        .and_then(|r| running.iter().position(|c| c.id.starts_with(r)))
        .unwrap_or(0);
    let target = running.swap_remove(idx);
    debug!(stack, container = target.display_name(), id = target.short_id(), "session target selected");
    Ok(target)
}
