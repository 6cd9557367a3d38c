// MIT License - Copyright (c) 2026 Peter Wright
// Serial panel monitor

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use ademco_serial::{Panel, PanelConfig, PanelEvent, ZoneStatusFlags};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "ademco-monitor")]
#[command(about = "Watch an Ademco alarm panel over its serial port")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Pre-checksum command body to queue at startup (e.g. 08as00). Repeatable.
    #[arg(long = "send", value_name = "BODY")]
    send: Vec<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    panel: PanelToml,
    #[serde(default, deserialize_with = "deserialize_zone_names")]
    zone_names: HashMap<u32, String>,
}

fn deserialize_zone_names<'de, D>(deserializer: D) -> Result<HashMap<u32, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let string_map: HashMap<String, String> = HashMap::deserialize(deserializer)?;
    string_map
        .into_iter()
        .map(|(k, v)| {
            k.parse::<u32>()
                .map(|id| (id, v))
                .map_err(|_| serde::de::Error::custom(format!("invalid zone ID: {k}")))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct PanelToml {
    /// Serial device. An empty string leaves the link parked.
    #[serde(default = "default_device")]
    device: String,
    #[serde(default = "default_baud_rate")]
    baud_rate: u32,
    #[serde(default)]
    zones: Vec<u32>,
    #[serde(default)]
    outputs: Vec<u32>,
    /// Ask for partition arming status whenever the panel (re)initializes.
    #[serde(default)]
    poll_arming_status: bool,
    #[serde(default = "default_send_interval")]
    send_interval_ms: u64,
    #[serde(default = "default_restart_delay")]
    restart_delay_ms: u64,
    #[serde(default = "default_refresh_interval")]
    refresh_interval_secs: u64,
}

fn default_device() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_baud_rate() -> u32 {
    1200
}
fn default_send_interval() -> u64 {
    1000
}
fn default_restart_delay() -> u64 {
    2000
}
fn default_refresh_interval() -> u64 {
    3600
}

fn build_panel_config(toml: &PanelToml) -> PanelConfig {
    let builder = PanelConfig::builder()
        .baud_rate(toml.baud_rate)
        .zones(toml.zones.iter().copied())
        .outputs(toml.outputs.iter().copied())
        .send_interval_ms(toml.send_interval_ms)
        .restart_delay_ms(toml.restart_delay_ms)
        .refresh_interval_secs(toml.refresh_interval_secs);
    if toml.device.trim().is_empty() {
        info!("No serial device configured; the link will stay parked");
        builder.no_device().build()
    } else {
        builder.device(toml.device.as_str()).build()
    }
}

fn zone_label(zone_id: u32, names: &HashMap<u32, String>) -> String {
    match names.get(&zone_id) {
        Some(name) => format!("{name} (zone {zone_id})"),
        None => format!("Zone {zone_id}"),
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

fn handle_panel_event(
    event: PanelEvent,
    panel: &Panel,
    zone_names: &HashMap<u32, String>,
    poll_arming_status: bool,
) {
    match event {
        PanelEvent::Connected => info!("Panel link up"),
        PanelEvent::Disconnected => warn!("Panel link down"),
        PanelEvent::Initialized => {
            info!("Panel initialized");
            if poll_arming_status && let Err(e) = panel.request_arming_status() {
                warn!("Failed to request arming status: {e}");
            }
        }
        PanelEvent::ZoneStatusChanged {
            zone_id,
            new_status,
            changed,
            ..
        } => {
            let label = zone_label(zone_id, zone_names);
            let names = ZoneStatusFlags::event_names(changed, new_status);
            info!("{label}: {}", names.join(", "));
        }
        PanelEvent::PartitionStatusChanged {
            partition_id,
            old_status,
            new_status,
        } => {
            info!("Partition {partition_id}: {old_status:?} -> {new_status:?}");
        }
        PanelEvent::OutputStatusChanged { output_id, on } => {
            info!("Output {output_id}: {}", if on { "on" } else { "off" });
        }
        PanelEvent::SystemEvent {
            raw_code,
            code,
            zone_id,
        } => match code {
            Some(code) => info!("System event {}: {}", code.description(), zone_label(zone_id, zone_names)),
            None => debug!("System event {raw_code:02X} for {zone_id}"),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=ademco_serial=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    let config_text =
        std::fs::read_to_string(&cli.config).context("Failed to read config file")?;
    let config: Config = toml::from_str(&config_text).context("Failed to parse config file")?;

    let panel_config = build_panel_config(&config.panel);
    let poll_arming_status = config.panel.poll_arming_status;
    let zone_names = config.zone_names;

    let panel = Arc::new(Panel::new(panel_config).context("Invalid panel configuration")?);

    for body in &cli.send {
        panel
            .send_command(body)
            .with_context(|| format!("Cannot queue command {body:?}"))?;
        info!("Queued {body}");
    }

    let mut events = panel.subscribe();
    let event_panel = panel.clone();
    let event_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    handle_panel_event(event, &event_panel, &zone_names, poll_arming_status)
                }
                Err(RecvError::Lagged(n)) => warn!("Event stream lagged, {n} events skipped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    info!("Monitor running. Send SIGHUP to restart the link, SIGINT/SIGTERM to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
            _ = sighup.recv() => {
                info!("Received SIGHUP, restarting panel link...");
                panel.restart().await;
            }
        }
    }

    event_handle.abort();
    panel.shutdown().await;

    info!("Shutdown complete");
    Ok(())
}
