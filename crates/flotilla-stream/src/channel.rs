//! Client-facing message channels.
//!
//! A session writes whole messages to a [`ClientSink`] and reads keystrokes from a
//! [`ClientSource`]. The transport (websocket, SSE, test channel) lives outside this crate.
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::StreamError;

/// Outbound half of a client connection.
#[async_trait]
pub trait ClientSink: Send + Sync {
    /// Deliver one message. An error means the client is gone.
    async fn send(&self, message: Vec<u8>) -> Result<(), StreamError>;
}

/// Inbound half of a client connection.
#[async_trait]
pub trait ClientSource: Send {
    /// Next message, or `None` once the client stopped sending.
    async fn recv(&mut self) -> Option<Vec<u8>>;
}

#[async_trait]
impl ClientSink for mpsc::Sender<Vec<u8>> {
    async fn send(&self, message: Vec<u8>) -> Result<(), StreamError> {
        mpsc::Sender::send(self, message)
            .await
            .map_err(|_| StreamError::ChannelClosed)
    }
}

#[async_trait]
impl ClientSink for mpsc::UnboundedSender<Vec<u8>> {
    async fn send(&self, message: Vec<u8>) -> Result<(), StreamError> {
        mpsc::UnboundedSender::send(self, message).map_err(|_| StreamError::ChannelClosed)
    }
}

#[async_trait]
impl ClientSource for mpsc::Receiver<Vec<u8>> {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        mpsc::Receiver::recv(self).await
    }
}

#[async_trait]
impl ClientSource for mpsc::UnboundedReceiver<Vec<u8>> {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        mpsc::UnboundedReceiver::recv(self).await
    }
}
