//! Example: Print zone changes as the panel reports them.
//!
//! Usage: cargo run --example zone_events -- /dev/ttyUSB0

use ademco_serial::{Panel, PanelConfig, PanelEvent, ZoneStatusFlags};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let device = std::env::args().nth(1).unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let config = PanelConfig::builder().device(device).zones(1..=8).build();

    let panel = Panel::new(config)?;
    let mut events = panel.subscribe();

    // Per-zone callbacks see the zone after the change has been applied.
    for zone in panel.configured_zones() {
        let z = zone.clone();
        zone.register_callback(move || {
            println!("Zone {} callback: {:?}", z.id(), z.status());
        });
    }

    println!("Listening for zone events (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(PanelEvent::ZoneStatusChanged { zone_id, old_status: _, new_status, changed }) => {
                        println!("Zone {} status changed:", zone_id);
                        for e in ZoneStatusFlags::event_names(changed, new_status) {
                            println!("  {}", e);
                        }
                    }
                    Ok(PanelEvent::Initialized) => {
                        let open: Vec<u32> = panel
                            .zones()
                            .iter()
                            .filter(|z| z.opened())
                            .map(|z| z.id())
                            .collect();
                        println!("Panel initialized, open zones: {:?}", open);
                    }
                    Ok(event) => {
                        println!("Event: {:?}", event);
                    }
                    Err(e) => {
                        println!("Event channel error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping...");
                break;
            }
        }
    }

    panel.shutdown().await;
    Ok(())
}
