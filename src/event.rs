// MIT License - Copyright (c) 2026 Peter Wright
// Broadcast panel events

use crate::constants::SystemEventCode;
use crate::devices::{partition::ArmStatus, zone::ZoneStatusFlags};

/// All events that can be emitted by the panel.
///
/// Users subscribe via `panel.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<PanelEvent>`. Per-zone callbacks fire
/// before the matching event is broadcast.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    /// Serial port opened and primed
    Connected,
    /// Serial link lost; the supervisor will reconnect
    Disconnected,
    /// First zone status report applied since the link came up
    Initialized,
    ZoneStatusChanged {
        zone_id: u32,
        old_status: ZoneStatusFlags,
        new_status: ZoneStatusFlags,
        changed: ZoneStatusFlags,
    },
    PartitionStatusChanged {
        partition_id: u32,
        old_status: ArmStatus,
        new_status: ArmStatus,
    },
    OutputStatusChanged {
        output_id: u32,
        on: bool,
    },
    /// `NQ` report, whether or not it mapped onto zone state.
    /// `code` is `None` for codes outside the documented table.
    SystemEvent {
        raw_code: u8,
        code: Option<SystemEventCode>,
        zone_id: u32,
    },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<PanelEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<PanelEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
