// MIT License - Copyright (c) 2026 Peter Wright
// Serial link supervisor: connect, prime, poll, reconnect

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::codec::decode_frame;
use crate::constants::{MAX_LINE_LEN, PRIMING_SEQUENCE};
use crate::error::{AdemcoError, Result};
use crate::event::PanelEvent;
use crate::panel::PanelShared;
use crate::protocol::Command;
use crate::router;
use crate::transport::queue::run_paced_sender;
use crate::transport::Connector;

/// Connection state of the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// No device configured; waiting for the park interval to elapse.
    Parked,
    Disconnected,
    Connecting,
    Connected,
}

/// Supervisor loop. Runs until aborted by the panel.
///
/// Each connection runs three duties (paced sender, reader, refresh cycle)
/// in one `JoinSet`. The first duty to stop takes the others down with it,
/// so no stale half of the stream outlives a failure.
pub(crate) async fn supervise<C: Connector>(shared: Arc<PanelShared>, connector: Arc<C>) {
    let config = shared.config.clone();
    loop {
        let Some(device) = config.device_path() else {
            shared.set_link_state(LinkState::Parked);
            info!(
                "No serial device configured, checking again in {}s",
                config.park_interval_secs
            );
            sleep(config.park_interval()).await;
            continue;
        };

        shared.set_link_state(LinkState::Connecting);
        info!("Connecting to {} at {} baud", device, config.baud_rate);

        match connector.connect(device, config.baud_rate).await {
            Ok(stream) => {
                let err = run_connection(&shared, stream).await;
                if err.is_retryable() {
                    warn!("Serial link lost: {}", err);
                } else {
                    error!("Serial link stopped: {}", err);
                }
                shared.link_down();
            }
            Err(e) => {
                error!("Failed to open {}: {}", device, e);
                shared.link_down();
            }
        }

        debug!("Reconnecting in {}ms", config.restart_delay_ms);
        sleep(config.restart_delay()).await;
    }
}

/// Drive one open connection until any duty fails. Returns the failure.
async fn run_connection<S>(shared: &Arc<PanelShared>, stream: S) -> AdemcoError
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);

    if let Err(e) = prime(&mut writer).await {
        return e;
    }

    shared.set_link_state(LinkState::Connected);
    info!("Serial link connected");
    shared.emit(PanelEvent::Connected);

    let mut duties: JoinSet<Result<()>> = JoinSet::new();
    {
        let shared = shared.clone();
        let interval = shared.config.send_interval();
        duties.spawn(async move { run_paced_sender(&shared.queue, &mut writer, interval).await });
    }
    duties.spawn(read_frames(shared.clone(), reader));
    duties.spawn(refresh_cycle(shared.clone()));

    let err = match duties.join_next().await {
        Some(Ok(Err(e))) => e,
        Some(Ok(Ok(()))) | None => AdemcoError::Disconnected,
        Some(Err(join_err)) => AdemcoError::Io(std::io::Error::other(join_err)),
    };

    duties.abort_all();
    while duties.join_next().await.is_some() {}
    err
}

async fn prime<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<()> {
    writer.write_all(PRIMING_SEQUENCE).await?;
    writer.flush().await?;
    Ok(())
}

/// Read CR/LF-terminated lines and route each valid frame, in arrival order.
async fn read_frames<R>(shared: Arc<PanelShared>, reader: R) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(128);
    // Set while skipping the rest of an over-long line.
    let mut discarding = false;
    loop {
        line.clear();
        let read = (&mut reader)
            .take(MAX_LINE_LEN as u64)
            .read_until(b'\n', &mut line)
            .await?;
        if read == 0 {
            return Err(AdemcoError::Disconnected);
        }
        if line.last() != Some(&b'\n') {
            if !discarding {
                warn!("Discarding inbound line longer than {} bytes", MAX_LINE_LEN);
                discarding = true;
            }
            continue;
        }
        if discarding {
            discarding = false;
            continue;
        }
        match decode_frame(&line) {
            Ok(Some(frame)) => router::dispatch(&shared, &frame),
            Ok(None) => {}
            Err(e) => error!("Dropping inbound frame: {}", e),
        }
    }
}

/// Poll zone status until the model is initialized, then outputs and the
/// zone partition table; repeat every refresh interval.
async fn refresh_cycle(shared: Arc<PanelShared>) -> Result<()> {
    let config = shared.config.clone();
    loop {
        shared.enqueue(&Command::ZoneStatusRequest)?;
        sleep(config.initial_status_wait()).await;

        while !shared.is_initialized() {
            debug!("No zone status report yet, requesting again");
            shared.enqueue(&Command::ZoneStatusRequest)?;
            sleep(config.status_retry()).await;
        }

        shared.enqueue(&Command::OutputStatusRequest)?;
        sleep(config.output_request_delay()).await;
        shared.enqueue(&Command::ZonePartitionRequest)?;

        sleep(config.refresh_interval()).await;
    }
}
