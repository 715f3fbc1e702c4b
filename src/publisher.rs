//! # Command Publisher Module
//!
//! Sends [`OutboundCommand`]s to the vehicle's control stack.
//!
//! Each command is one JSON datagram. One datagram is sent per mapping call,
//! so the publish rate follows the gamepad's sampling rate.

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::Result;
use crate::teleop::command::OutboundCommand;

/// Destination for mapped commands.
#[async_trait]
pub trait CommandSink: Send {
    /// Publish one command
    async fn publish(&mut self, command: &OutboundCommand) -> Result<()>;
}

/// Publishes commands as JSON datagrams over UDP.
#[derive(Debug)]
pub struct UdpCommandPublisher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpCommandPublisher {
    /// Bind a local socket and direct commands at `target`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the local address cannot be bound.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fx10_teleop::publisher::UdpCommandPublisher;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let publisher = UdpCommandPublisher::bind(
    ///         "0.0.0.0:0".parse()?,
    ///         "127.0.0.1:9000".parse()?,
    ///     ).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn bind(bind_addr: SocketAddr, target: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        info!(
            "Publishing commands from {} to {}",
            socket.local_addr()?,
            target
        );
        Ok(Self { socket, target })
    }

    /// Address commands are sent to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl CommandSink for UdpCommandPublisher {
    async fn publish(&mut self, command: &OutboundCommand) -> Result<()> {
        let payload = serde_json::to_vec(command)?;
        self.socket.send_to(&payload, self.target).await?;
        debug!("Published command seq {} ({} bytes)", command.header.seq, payload.len());
        Ok(())
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::TeleopError;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Mock sink that records every published command
    #[derive(Clone, Default)]
    pub struct MockCommandSink {
        pub published: Arc<Mutex<Vec<OutboundCommand>>>,
        pub publish_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl MockCommandSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_published(&self) -> Vec<OutboundCommand> {
            self.published.lock().unwrap().clone()
        }

        pub fn set_publish_error(&self, error: io::ErrorKind) {
            *self.publish_error.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl CommandSink for MockCommandSink {
        async fn publish(&mut self, command: &OutboundCommand) -> Result<()> {
            if let Some(error) = *self.publish_error.lock().unwrap() {
                return Err(TeleopError::Io(io::Error::new(error, "Mock publish error")));
            }
            self.published.lock().unwrap().push(command.clone());
            Ok(())
        }
    }
}
