//! Log stream demultiplexer.
//!
//! Container logs arrive as a sequence of frames: an 8-byte header followed by `len` bytes of
//! payload. Header byte 0 names the stream (0 stdin, 1 stdout, 2 stderr), bytes 1..3 are
//! reserved and bytes 4..7 hold the payload length as a big-endian `u32`. Each payload is
//! delivered to the client verbatim as one message.
use std::time::Instant;

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    task::JoinHandle,
};
use tracing::{debug, info, instrument};

use flotilla_core::{context::RuntimeContext, metrics::SessionOutcome, runtime::LogOptions};
use flotilla_model::StackName;

use crate::{
    ClientSink, SESSION_KIND_LOGS, SessionConfig, StreamError, error_outcome, select_target,
};

/// Size of a frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 8;

/// Stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
    /// Any other type byte; still forwarded.
    Other(u8),
}

impl From<u8> for StreamKind {
    fn from(b: u8) -> Self {
        match b {
            0 => StreamKind::Stdin,
            1 => StreamKind::Stdout,
            2 => StreamKind::Stderr,
            other => StreamKind::Other(other),
        }
    }
}

impl From<StreamKind> for u8 {
    fn from(kind: StreamKind) -> Self {
        match kind {
            StreamKind::Stdin => 0,
            StreamKind::Stdout => 1,
            StreamKind::Stderr => 2,
            StreamKind::Other(b) => b,
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: StreamKind,
    pub len: u32,
}

impl FrameHeader {
    pub fn new(kind: StreamKind, len: u32) -> Self {
        Self { kind, len }
    }

    /// Reserved bytes are ignored.
    pub fn decode(buf: &[u8; FRAME_HEADER_LEN]) -> Self {
        Self {
            kind: StreamKind::from(buf[0]),
            len: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }

    pub fn encode(&self) -> [u8; FRAME_HEADER_LEN] {
        let mut buf = [0u8; FRAME_HEADER_LEN];
        buf[0] = self.kind.into();
        buf[4..].copy_from_slice(&self.len.to_be_bytes());
        buf
    }
}

/// What a demultiplexing run delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxSummary {
    pub frames: u64,
    pub bytes: u64,
    pub outcome: SessionOutcome,
}

/// Forward every complete frame payload from `reader` to `sink`.
///
/// A short read, EOF or read error on the header or payload ends the run cleanly, as does a
/// failed send.
pub async fn forward_frames<R>(reader: &mut R, sink: &dyn ClientSink) -> DemuxSummary
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut frames = 0u64;
    let mut bytes = 0u64;
    let mut header = [0u8; FRAME_HEADER_LEN];

    let outcome = loop {
        if let Err(e) = reader.read_exact(&mut header).await {
            debug!(error = %e, "log stream ended");
            break SessionOutcome::StreamEnded;
        }
        let frame = FrameHeader::decode(&header);

        // The buffer grows with what actually arrives, not with the untrusted length.
        let mut payload = Vec::new();
        match (&mut *reader)
            .take(u64::from(frame.len))
            .read_to_end(&mut payload)
            .await
        {
            Ok(n) if n as u64 == u64::from(frame.len) => {}
            Ok(n) => {
                debug!(expected = frame.len, got = n, "log stream ended inside a frame");
                break SessionOutcome::StreamEnded;
            }
            Err(e) => {
                debug!(error = %e, expected = frame.len, "log stream ended inside a frame");
                break SessionOutcome::StreamEnded;
            }
        }
        if sink.send(payload).await.is_err() {
            debug!("client went away");
            break SessionOutcome::ClientGone;
        }
        frames += 1;
        bytes += u64::from(frame.len);
    };

    DemuxSummary {
        frames,
        bytes,
        outcome,
    }
}

/// Follows the logs of one stack container into a client.
#[derive(Debug, Clone)]
pub struct LogSession {
    ctx: RuntimeContext,
    cfg: SessionConfig,
}

impl LogSession {
    pub fn new(ctx: RuntimeContext, cfg: SessionConfig) -> Self {
        Self { ctx, cfg }
    }

    /// Select the target container, open its log stream and demultiplex until either side ends.
    #[instrument(level = "info", skip(self, sink))]
    pub async fn run(
        &self,
        stack: &str,
        requested: Option<&str>,
        sink: &dyn ClientSink,
    ) -> Result<DemuxSummary, StreamError> {
        let metrics = self.ctx.metrics();
        metrics.record_session_started(SESSION_KIND_LOGS);
        let started = Instant::now();

        let result = self.stream(stack, requested, sink).await;

        let outcome = match &result {
            Ok(summary) => summary.outcome,
            Err(e) => error_outcome(e),
        };
        metrics.record_session_completed(
            SESSION_KIND_LOGS,
            outcome,
            started.elapsed().as_millis() as u64,
        );
        result
    }

    async fn stream(
        &self,
        stack: &str,
        requested: Option<&str>,
        sink: &dyn ClientSink,
    ) -> Result<DemuxSummary, StreamError> {
        let rt = self.ctx.runtime();
        let target = select_target(rt, stack, requested).await?;
        let mut logs = rt
            .follow_logs(&target.id, LogOptions::follow(self.cfg.log_tail.clone()))
            .await?;
        info!(container = target.display_name(), tail = %self.cfg.log_tail, "following container logs");

        let summary = forward_frames(&mut logs, sink).await;
        info!(frames = summary.frames, bytes = summary.bytes, "log session finished");
        Ok(summary)
    }
}

/// Run a log session on its own task.
pub fn spawn_log_session<S>(
    session: LogSession,
    stack: StackName,
    requested: Option<String>,
    sink: S,
) -> JoinHandle<Result<DemuxSummary, StreamError>>
where
    S: ClientSink + 'static,
{
    tokio::spawn(async move { session.run(&stack, requested.as_deref(), &sink).await })
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, sync::Arc};

    use super::*;
    use flotilla_core::testing::{FakeContainer, FakeOp, FakeRuntime};
    use flotilla_model::Labels;
    use tokio::sync::mpsc;

    fn frame(kind: StreamKind, payload: &[u8]) -> Vec<u8> {
        let mut out = FrameHeader::new(kind, payload.len() as u32).encode().to_vec();
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn header_layout() {
        let hdr = FrameHeader::new(StreamKind::Stderr, 0x0102_0304).encode();
        assert_eq!(hdr, [2, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(
            FrameHeader::decode(&[1, 9, 9, 9, 0, 0, 1, 0]),
            FrameHeader::new(StreamKind::Stdout, 256)
        );
    }

    #[tokio::test]
    async fn splits_frames_into_messages() {
        let mut bytes = frame(StreamKind::Stdout, b"hello");
        bytes.extend(frame(StreamKind::Stderr, b"bye"));
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let summary = forward_frames(&mut Cursor::new(bytes), &tx).await;

        assert_eq!(rx.recv().await.unwrap(), b"hello");
        assert_eq!(rx.recv().await.unwrap(), b"bye");
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.bytes, 8);
        assert_eq!(summary.outcome, SessionOutcome::StreamEnded);
    }

    #[tokio::test]
    async fn truncated_payload_ends_without_partial_message() {
        let mut bytes = frame(StreamKind::Stdout, b"one");
        bytes.extend(FrameHeader::new(StreamKind::Stdout, 10).encode());
        bytes.extend_from_slice(b"shor");
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let summary = forward_frames(&mut Cursor::new(bytes), &tx).await;
        drop(tx);

        assert_eq!(rx.recv().await.unwrap(), b"one");
        assert!(rx.recv().await.is_none());
        assert_eq!(summary.frames, 1);
    }

    #[tokio::test]
    async fn oversized_length_with_short_body_ends_cleanly() {
        let mut bytes = FrameHeader::new(StreamKind::Stdout, u32::MAX).encode().to_vec();
        bytes.extend_from_slice(b"abc");
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let summary = forward_frames(&mut Cursor::new(bytes), &tx).await;
        drop(tx);

        assert_eq!(summary.frames, 0);
        assert_eq!(summary.outcome, SessionOutcome::StreamEnded);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn short_header_ends_cleanly() {
        let (tx, _rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let summary = forward_frames(&mut Cursor::new(vec![1u8, 0, 0]), &tx).await;

        assert_eq!(summary.frames, 0);
        assert_eq!(summary.outcome, SessionOutcome::StreamEnded);
    }

    #[tokio::test]
    async fn closed_client_stops_the_loop() {
        let mut bytes = frame(StreamKind::Stdout, b"a");
        bytes.extend(frame(StreamKind::Stdout, b"b"));
        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
        drop(rx);

        let summary = forward_frames(&mut Cursor::new(bytes), &tx).await;

        assert_eq!(summary.frames, 0);
        assert_eq!(summary.outcome, SessionOutcome::ClientGone);
    }

    #[tokio::test]
    async fn session_follows_selected_container() {
        let rt = Arc::new(FakeRuntime::new());
        rt.insert_container(FakeContainer::running("aaa1", "s_web_1", Labels::managed("s", "web")));
        rt.insert_container(FakeContainer::running("bbb2", "s_db_1", Labels::managed("s", "db")));
        rt.set_logs("bbb2", frame(StreamKind::Stdout, b"ready\n"));
        let session = LogSession::new(RuntimeContext::new(rt.clone()), SessionConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let summary = spawn_log_session(session, "s".into(), Some("bbb".into()), tx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.frames, 1);
        assert_eq!(rx.recv().await.unwrap(), b"ready\n");
        assert_eq!(rt.count(FakeOp::Logs, Some("bbb2")), 1);

        let requested = rt.log_requests();
        assert_eq!(requested.len(), 1);
        let (container, options) = &requested[0];
        assert_eq!(container, "bbb2");
        assert_eq!(options.tail, "200");
        assert!(options.stdout.is_enabled());
        assert!(options.stderr.is_enabled());
        assert!(options.follow.is_enabled());
    }

    #[tokio::test]
    async fn session_without_containers_fails() {
        let rt = Arc::new(FakeRuntime::new());
        let session = LogSession::new(RuntimeContext::new(rt), SessionConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let err = session.run("empty", None, &tx).await.unwrap_err();

        assert!(matches!(err, StreamError::NoContainers(_)));
    }
}
