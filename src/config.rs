// MIT License - Copyright (c) 2026 Peter Wright
// Driver configuration

use std::time::Duration;

use crate::constants::{MAX_OUTPUTS, MAX_ZONES};
use crate::error::{AdemcoError, Result};

/// Configuration for a serial panel link.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Serial device path (default: /dev/ttyUSB0). `None` parks the link.
    pub device: Option<String>,
    /// Baud rate (default: 1200)
    pub baud_rate: u32,
    /// Zones the caller intends to use. Every zone is tracked regardless;
    /// this list is validated and reported back by `Panel::configured_zones`.
    pub zones: Vec<u32>,
    /// Relay outputs the caller intends to drive.
    pub outputs: Vec<u32>,
    /// Minimum gap between two outbound frames in milliseconds (default: 1000)
    pub send_interval_ms: u64,
    /// Delay before reconnecting after a link failure in milliseconds (default: 2000)
    pub restart_delay_ms: u64,
    /// Recheck interval while no device is configured, in seconds (default: 300)
    pub park_interval_secs: u64,
    /// Wait after the first zone status request in milliseconds (default: 3000)
    pub initial_status_wait_ms: u64,
    /// Zone status re-request interval until initialized, in milliseconds (default: 5000)
    pub status_retry_ms: u64,
    /// Gap between the output status and zone partition requests in milliseconds (default: 2000)
    pub output_request_delay_ms: u64,
    /// Full refresh interval in seconds (default: 3600)
    pub refresh_interval_secs: u64,
    /// Broadcast event channel capacity (default: 256)
    pub event_capacity: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            device: Some("/dev/ttyUSB0".to_string()),
            baud_rate: 1200,
            zones: Vec::new(),
            outputs: Vec::new(),
            send_interval_ms: 1000,
            restart_delay_ms: 2000,
            park_interval_secs: 300,
            initial_status_wait_ms: 3000,
            status_retry_ms: 5000,
            output_request_delay_ms: 2000,
            refresh_interval_secs: 3600,
            event_capacity: 256,
        }
    }
}

impl PanelConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }

    /// Check ids against the addressable ranges and reject unusable settings.
    pub fn validate(&self) -> Result<()> {
        for &id in &self.zones {
            if id == 0 || id > MAX_ZONES {
                return Err(AdemcoError::InvalidDeviceId {
                    kind: "zone",
                    id,
                    max: MAX_ZONES,
                });
            }
        }
        for &id in &self.outputs {
            if id == 0 || id > MAX_OUTPUTS {
                return Err(AdemcoError::InvalidDeviceId {
                    kind: "output",
                    id,
                    max: MAX_OUTPUTS,
                });
            }
        }
        if self.baud_rate == 0 {
            return Err(AdemcoError::InvalidConfig {
                reason: "baud_rate must be non-zero".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(AdemcoError::InvalidConfig {
                reason: "event_capacity must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Device path, treating an empty string as not configured.
    pub fn device_path(&self) -> Option<&str> {
        self.device.as_deref().filter(|d| !d.trim().is_empty())
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
    pub fn park_interval(&self) -> Duration {
        Duration::from_secs(self.park_interval_secs)
    }
    pub fn initial_status_wait(&self) -> Duration {
        Duration::from_millis(self.initial_status_wait_ms)
    }
    pub fn status_retry(&self) -> Duration {
        Duration::from_millis(self.status_retry_ms)
    }
    pub fn output_request_delay(&self) -> Duration {
        Duration::from_millis(self.output_request_delay_ms)
    }
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Builder for PanelConfig.
#[derive(Debug, Clone, Default)]
pub struct PanelConfigBuilder {
    config: PanelConfig,
}

impl PanelConfigBuilder {
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.config.device = Some(device.into());
        self
    }

    /// Leave the device unset; the link parks until restarted with a device.
    pub fn no_device(mut self) -> Self {
        self.config.device = None;
        self
    }

    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.config.baud_rate = baud;
        self
    }

    pub fn zones(mut self, zones: impl IntoIterator<Item = u32>) -> Self {
        self.config.zones = zones.into_iter().collect();
        self
    }

    pub fn outputs(mut self, outputs: impl IntoIterator<Item = u32>) -> Self {
        self.config.outputs = outputs.into_iter().collect();
        self
    }

    pub fn send_interval_ms(mut self, ms: u64) -> Self {
        self.config.send_interval_ms = ms;
        self
    }

    pub fn restart_delay_ms(mut self, ms: u64) -> Self {
        self.config.restart_delay_ms = ms;
        self
    }

    pub fn park_interval_secs(mut self, secs: u64) -> Self {
        self.config.park_interval_secs = secs;
        self
    }

    pub fn initial_status_wait_ms(mut self, ms: u64) -> Self {
        self.config.initial_status_wait_ms = ms;
        self
    }

    pub fn status_retry_ms(mut self, ms: u64) -> Self {
        self.config.status_retry_ms = ms;
        self
    }

    pub fn output_request_delay_ms(mut self, ms: u64) -> Self {
        self.config.output_request_delay_ms = ms;
        self
    }

    pub fn refresh_interval_secs(mut self, secs: u64) -> Self {
        self.config.refresh_interval_secs = secs;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn build(self) -> PanelConfig {
        self.config
    }
}
