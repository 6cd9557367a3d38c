// MIT License - Copyright (c) 2026 Peter Wright
// Byte transports and link supervision

pub mod link;
pub mod queue;
pub mod serial;

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite};

pub use link::LinkState;
pub use serial::SerialConnector;

/// Opens the byte stream the link supervisor talks over.
///
/// The serial implementation is [`SerialConnector`]; tests substitute an
/// in-memory duplex stream.
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open `device` at `baud`.
    fn connect(
        &self,
        device: &str,
        baud: u32,
    ) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}
