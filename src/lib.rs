// MIT License - Copyright (c) 2026 Peter Wright
// Ademco serial panel driver
//
//! # ademco-serial
//!
//! Async driver for Ademco-family security panels attached over RS-232.
//!
//! The driver owns the serial link, frames and checksums every message,
//! paces outbound commands one per second, and keeps an in-memory model of
//! the panel's 96 zones, its relay outputs and its partitions. Consumers
//! read that model synchronously, register per-zone callbacks, or subscribe
//! to a broadcast stream of [`PanelEvent`]s.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ademco_serial::{Panel, PanelConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PanelConfig::builder()
//!         .device("/dev/ttyUSB0")
//!         .baud_rate(1200)
//!         .build();
//!
//!     let panel = Panel::new(config)?;
//!
//!     let mut events = panel.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     if let Some(output) = panel.output(1) {
//!         output.turn_on()?;
//!     }
//!
//!     tokio::signal::ctrl_c().await?;
//!     panel.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod devices;
pub mod error;
pub mod event;
pub mod panel;
pub mod protocol;
mod router;
pub mod transport;

// Re-exports for convenience
pub use config::{PanelConfig, PanelConfigBuilder};
pub use constants::SystemEventCode;
pub use devices::output::Output;
pub use devices::partition::{ArmStatus, Partition};
pub use devices::zone::{Zone, ZoneStatusFlags};
pub use error::{AdemcoError, Result};
pub use event::{EventReceiver, PanelEvent};
pub use panel::Panel;
pub use protocol::{Command, MessageType};
pub use transport::{Connector, LinkState, SerialConnector};
