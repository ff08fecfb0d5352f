use std::{
    collections::HashMap,
    io,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use bollard::{
    Docker,
    container::{RemoveContainerOptions, StartContainerOptions, StopContainerOptions},
    exec::{StartExecOptions, StartExecResults},
    image::{CreateImageOptions, PruneImagesOptions},
    network::ListNetworksOptions,
};
use futures::{StreamExt, TryStreamExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info, instrument, trace};

use flotilla_core::runtime::{
    ContainerFilter, ContainerInspect, ContainerSummary, CreateContainerRequest, ExecConfig,
    ExecStream, LogOptions, LogStream, NetworkSummary, PruneReport, RuntimeClient, RuntimeError,
    RuntimeResult,
};

use crate::{convert, error::runtime_error};

/// [`RuntimeClient`] backed by the Docker Engine API.
pub struct DockerRuntime {
    docker: Docker,
    /// TTY flag of created, not yet attached exec instances.
    exec_tty: Mutex<HashMap<String, bool>>,
}

impl DockerRuntime {
    /// Wrap an already configured engine client.
    pub fn new(docker: Docker) -> Self {
        Self {
            docker,
            exec_tty: Mutex::new(HashMap::new()),
        }
    }

    /// Connect through the local socket (or `DOCKER_HOST`) and check the daemon answers.
    pub async fn connect_local() -> RuntimeResult<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(runtime_error)?;
        docker.ping().await.map_err(runtime_error)?;
        info!("connected to docker daemon");
        Ok(Self::new(docker))
    }

    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    fn pending_tty(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.exec_tty
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    async fn list_containers(
        &self,
        filter: &ContainerFilter,
        include_stopped: bool,
    ) -> RuntimeResult<Vec<ContainerSummary>> {
        let raw = self
            .docker
            .list_containers(Some(convert::list_options(filter, include_stopped)))
            .await
            .map_err(runtime_error)?;
        let total = raw.len();
        let list: Vec<_> = raw
            .into_iter()
            .filter_map(convert::container_summary)
            .collect();
        if list.len() < total {
            debug!(dropped = total - list.len(), "containers with unknown state skipped");
        }
        Ok(list)
    }

    async fn inspect_container(&self, id_or_name: &str) -> RuntimeResult<ContainerInspect> {
        let raw = self
            .docker
            .inspect_container(id_or_name, None)
            .await
            .map_err(runtime_error)?;
        convert::container_inspect(raw)
    }

    #[instrument(level = "debug", skip(self, request), fields(container = %request.name))]
    async fn create_container(&self, request: CreateContainerRequest) -> RuntimeResult<String> {
        let created = self
            .docker
            .create_container(
                Some(convert::create_options(&request)),
                convert::create_config(&request),
            )
            .await
            .map_err(runtime_error)?;
        for warning in &created.warnings {
            debug!(%warning, "engine warning on create");
        }
        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> RuntimeResult<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(runtime_error)
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> RuntimeResult<()> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };
        self.docker
            .stop_container(id, Some(options))
            .await
            .map_err(runtime_error)
    }

    async fn remove_container(&self, id_or_name: &str, force: bool) -> RuntimeResult<()> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.docker
            .remove_container(id_or_name, Some(options))
            .await
            .map_err(runtime_error)
    }

    async fn list_networks(&self) -> RuntimeResult<Vec<NetworkSummary>> {
        let raw = self
            .docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await
            .map_err(runtime_error)?;
        Ok(raw
            .into_iter()
            .filter_map(|n| {
                Some(NetworkSummary {
                    id: n.id?,
                    name: n.name?,
                })
            })
            .collect())
    }

    #[instrument(level = "debug", skip(self))]
    async fn pull_image(&self, reference: &str) -> RuntimeResult<()> {
        let (from_image, tag) = convert::split_reference(reference);
        let options = CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };
        let mut progress = self.docker.create_image(Some(options), None, None);
        while let Some(item) = progress.next().await {
            let info = item.map_err(runtime_error)?;
            if let Some(status) = info.status {
                trace!(%status, "pull progress");
            }
        }
        Ok(())
    }

    async fn prune_dangling_images(&self) -> RuntimeResult<PruneReport> {
        let options = PruneImagesOptions {
            filters: HashMap::from([("dangling", vec!["true"])]),
        };
        let pruned = self
            .docker
            .prune_images(Some(options))
            .await
            .map_err(runtime_error)?;
        Ok(PruneReport {
            space_reclaimed: pruned.space_reclaimed.unwrap_or_default().max(0) as u64,
        })
    }

    async fn exec_create(&self, container_id: &str, config: ExecConfig) -> RuntimeResult<String> {
        let created = self
            .docker
            .create_exec(container_id, convert::exec_options(&config))
            .await
            .map_err(runtime_error)?;
        self.pending_tty().insert(created.id.clone(), config.tty);
        Ok(created.id)
    }

    async fn exec_attach(&self, exec_id: &str) -> RuntimeResult<ExecStream> {
        let tty = self.pending_tty().remove(exec_id).unwrap_or(false);
        let options = StartExecOptions {
            detach: false,
            tty,
            output_capacity: None,
        };
        match self
            .docker
            .start_exec(exec_id, Some(options))
            .await
            .map_err(runtime_error)?
        {
            StartExecResults::Attached { output, input } => {
                let chunks = output
                    .map_ok(convert::output_payload)
                    .map_err(io::Error::other);
                Ok(ExecStream {
                    input: Box::new(input),
                    output: Box::new(StreamReader::new(chunks)),
                })
            }
            StartExecResults::Detached => Err(RuntimeError::Api(format!(
                "exec '{exec_id}' started detached"
            ))),
        }
    }

    async fn follow_logs(
        &self,
        container_id: &str,
        options: LogOptions,
    ) -> RuntimeResult<LogStream> {
        let frames = self
            .docker
            .logs(container_id, Some(convert::logs_options(&options)))
            .map_ok(convert::frame_log_output)
            .map_err(io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(frames))))
    }
}
