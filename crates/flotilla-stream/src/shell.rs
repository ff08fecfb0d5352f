//! Interactive exec proxy.
//!
//! Opens a TTY exec in a stack container and relays bytes both ways: client messages are written
//! to the exec's stdin by an inbound task, exec output is read in chunks and sent to the client.
//! The session ends with the outbound direction; the inbound task is then cancelled, the exec
//! input shut down and the task joined.
use std::time::{Duration, Instant};

use tokio::{
    io::{AsyncReadExt, AsyncWrite, AsyncWriteExt},
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use flotilla_core::{
    context::RuntimeContext,
    metrics::SessionOutcome,
    runtime::{ContainerSummary, ExecConfig, ExecStream},
};
use flotilla_model::StackName;

use crate::{
    ClientSink, ClientSource, SESSION_KIND_SHELL, SessionConfig, StreamError, error_outcome,
    select_target,
};

/// Upper bound on shutting down the exec input once the session is over.
const INPUT_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Byte counts and end reason of a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    /// Bytes written to the exec input.
    pub bytes_in: u64,
    /// Bytes delivered to the client.
    pub bytes_out: u64,
    pub outcome: SessionOutcome,
}

/// Relay between a client and an attached exec until the exec output ends or the client is gone.
pub async fn relay<S>(
    stream: ExecStream,
    sink: &dyn ClientSink,
    mut source: S,
    read_buffer: usize,
) -> RelaySummary
where
    S: ClientSource + 'static,
{
    let ExecStream {
        mut input,
        mut output,
    } = stream;
    let cancel = CancellationToken::new();

    let inbound_cancel = cancel.clone();
    let inbound = tokio::spawn(async move {
        let mut forwarded = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = inbound_cancel.cancelled() => break,
                msg = source.recv() => {
                    let Some(bytes) = msg else {
                        debug!("client input closed");
                        break;
                    };
                    // An exec that stops reading its stdin must not pin the task.
                    let written = tokio::select! {
                        biased;
                        _ = inbound_cancel.cancelled() => break,
                        r = write_message(&mut input, &bytes) => r,
                    };
                    if let Err(e) = written {
                        debug!(error = %e, "exec input write failed");
                        break;
                    }
                    forwarded += bytes.len() as u64;
                }
            }
        }
        match timeout(INPUT_SHUTDOWN_GRACE, input.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "exec input shutdown failed"),
            Err(_) => debug!("exec input shutdown timed out"),
        }
        forwarded
    });

    let mut buf = vec![0u8; read_buffer.max(1)];
    let mut bytes_out = 0u64;
    let outcome = loop {
        match output.read(&mut buf).await {
            Ok(0) => break SessionOutcome::StreamEnded,
            Ok(n) => {
                if sink.send(buf[..n].to_vec()).await.is_err() {
                    break SessionOutcome::ClientGone;
                }
                bytes_out += n as u64;
            }
            Err(e) => {
                debug!(error = %e, "exec output read failed");
                break SessionOutcome::StreamEnded;
            }
        }
    };

    cancel.cancel();
    let bytes_in = match inbound.await {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "inbound relay task failed");
            0
        }
    };

    RelaySummary {
        bytes_in,
        bytes_out,
        outcome,
    }
}

async fn write_message<W>(input: &mut W, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    input.write_all(bytes).await?;
    input.flush().await
}

/// Interactive shell into one stack container.
#[derive(Debug, Clone)]
pub struct ShellSession {
    ctx: RuntimeContext,
    cfg: SessionConfig,
}

impl ShellSession {
    pub fn new(ctx: RuntimeContext, cfg: SessionConfig) -> Self {
        Self { ctx, cfg }
    }

    /// Create and attach a TTY exec running the configured shell.
    pub async fn open(
        &self,
        stack: &str,
        requested: Option<&str>,
    ) -> Result<(ContainerSummary, ExecStream), StreamError> {
        let rt = self.ctx.runtime();
        let target = select_target(rt, stack, requested).await?;
        let exec_id = rt
            .exec_create(&target.id, ExecConfig::interactive(self.cfg.shell_command.clone()))
            .await?;
        let stream = rt.exec_attach(&exec_id).await?;
        info!(container = target.display_name(), exec = %exec_id, "shell attached");
        Ok((target, stream))
    }

    /// Open a shell and relay until it ends.
    #[instrument(level = "info", skip(self, sink, source))]
    pub async fn run<S>(
        &self,
        stack: &str,
        requested: Option<&str>,
        sink: &dyn ClientSink,
        source: S,
    ) -> Result<RelaySummary, StreamError>
    where
        S: ClientSource + 'static,
    {
        let metrics = self.ctx.metrics();
        metrics.record_session_started(SESSION_KIND_SHELL);
        let started = Instant::now();

        let result = match self.open(stack, requested).await {
            Ok((_, stream)) => Ok(relay(stream, sink, source, self.cfg.read_buffer).await),
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(summary) => {
                info!(
                    bytes_in = summary.bytes_in,
                    bytes_out = summary.bytes_out,
                    "shell session finished"
                );
                summary.outcome
            }
            Err(e) => error_outcome(e),
        };
        metrics.record_session_completed(
            SESSION_KIND_SHELL,
            outcome,
            started.elapsed().as_millis() as u64,
        );
        result
    }
}

/// Run a shell session on its own task.
pub fn spawn_shell_session<K, S>(
    session: ShellSession,
    stack: StackName,
    requested: Option<String>,
    sink: K,
    source: S,
) -> JoinHandle<Result<RelaySummary, StreamError>>
where
    K: ClientSink + 'static,
    S: ClientSource + 'static,
{
    tokio::spawn(async move {
        session
            .run(&stack, requested.as_deref(), &sink, source)
            .await
    })
}
