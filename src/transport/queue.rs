// MIT License - Copyright (c) 2026 Peter Wright
// Outbound frame queue and paced writer

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::error::{AdemcoError, Result};

/// Unbounded FIFO of encoded frames.
///
/// Producers never block. The receiving end is shared so that each new
/// connection's sender picks up where the previous one stopped; frames queued
/// while the link is down are written once it comes back.
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Append an encoded frame.
    pub fn push(&self, frame: Vec<u8>) -> Result<()> {
        self.tx.send(frame).map_err(|_| AdemcoError::ShutDown)
    }

    /// Drop every queued frame. Waits for the active sender, if any, to
    /// release the queue.
    pub async fn clear(&self) -> usize {
        let mut rx = self.rx.lock().await;
        let mut dropped = 0;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Write queued frames one at a time, pausing `interval` after each.
///
/// Returns only on a write failure; the caller tears down the link.
pub async fn run_paced_sender<W>(queue: &CommandQueue, writer: &mut W, interval: Duration) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut rx = queue.rx.lock().await;
    loop {
        let frame = rx.recv().await.ok_or(AdemcoError::ShutDown)?;
        debug!("Sending {:?}", String::from_utf8_lossy(&frame));
        writer.write_all(&frame).await?;
        writer.flush().await?;
        sleep(interval).await;
    }
}
