//! Example: Pulse a relay output, e.g. a garage door opener.
//!
//! Usage: cargo run --example output_pulse -- /dev/ttyUSB0 1

use std::time::Duration;

use ademco_serial::{LinkState, Panel, PanelConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let device = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let output_id: u32 = args.next().as_deref().unwrap_or("1").parse()?;

    let config = PanelConfig::builder()
        .device(device)
        .outputs([output_id])
        .build();
    let panel = Panel::new(config)?;

    let mut link = panel.watch_link_state();
    link.wait_for(|s| *s == LinkState::Connected).await?;

    let output = panel
        .configured_outputs()
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("output {output_id} not configured"))?;

    println!("Pulsing output {}", output.id());
    output.turn_on()?;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    output.turn_off()?;

    // Both commands go out one per second behind any queued status requests.
    tokio::time::sleep(Duration::from_secs(5)).await;

    panel.shutdown().await;
    Ok(())
}
