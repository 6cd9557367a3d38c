// MIT License - Copyright (c) 2026 Peter Wright
// Inbound message routing

use tracing::{debug, error, info, warn};

use crate::codec::Frame;
use crate::constants::{MAX_OUTPUTS, MAX_ZONES, OUTPUT_UNUSED, SystemEventCode};
use crate::devices::zone::ZoneStatusFlags;
use crate::event::PanelEvent;
use crate::panel::PanelShared;
use crate::protocol::MessageType;

/// Apply one validated frame to the panel model.
pub(crate) fn dispatch(panel: &PanelShared, frame: &Frame) {
    debug!("Received {} {:?}", frame.message_type, frame.data);
    match &frame.message_type {
        MessageType::ZoneStatus => zone_status_report(panel, &frame.data),
        MessageType::ZonePartition => panel.set_zone_partitions(&frame.data),
        MessageType::OutputStatus => output_status_report(panel, &frame.data),
        MessageType::ArmingStatus => arming_status_report(panel, &frame.data),
        MessageType::SystemEvent => system_event(panel, &frame.data),
        MessageType::Ack => {}
        MessageType::Unknown(code) => {
            error!("Unhandled message type {}: {:?}", code, frame.data)
        }
    }
}

/// One status digit per zone, zone 1 first.
fn zone_status_report(panel: &PanelShared, data: &str) {
    for (index, digit) in data.chars().enumerate() {
        let id = index as u32 + 1;
        let Some(zone) = panel.zone(id) else {
            warn!(
                "Zone status report has {} entries, ignoring those past zone {}",
                data.len(),
                MAX_ZONES
            );
            break;
        };
        match ZoneStatusFlags::from_digit(digit) {
            Some(status) => {
                zone.process_status(status);
            }
            None => error!("Invalid status digit {:?} for zone {}", digit, id),
        }
    }
    if !data.is_empty() {
        panel.mark_initialized();
    }
}

/// One char per output: `0` off, `1` on, `U` unused.
fn output_status_report(panel: &PanelShared, data: &str) {
    for (index, c) in data.chars().enumerate() {
        let id = index as u32 + 1;
        if id > MAX_OUTPUTS {
            warn!("Output status report has {} entries, ignoring the rest", data.len());
            break;
        }
        match c {
            OUTPUT_UNUSED => continue,
            '0' => {
                panel.apply_output_status(id, false);
            }
            '1' => {
                panel.apply_output_status(id, true);
            }
            other => error!("Invalid status {:?} for output {}", other, id),
        }
    }
}

/// One arming letter per partition, partition 1 first.
fn arming_status_report(panel: &PanelShared, data: &str) {
    for (index, c) in data.chars().enumerate() {
        let id = index as u32 + 1;
        if let Err(e) = panel.apply_partition_status(id, c) {
            error!("Partition {}: {}", id, e);
        }
    }
}

/// `CCNN...`: event code, then the zone (or user) index counted from 0.
fn system_event(panel: &PanelShared, data: &str) {
    let (Some(code), Some(index)) = (
        hex_field(data, 0..2).and_then(|s| u8::from_str_radix(s, 16).ok()),
        hex_field(data, 2..4).and_then(|s| u32::from_str_radix(s, 16).ok()),
    ) else {
        error!("Malformed system event {:?}", data);
        return;
    };
    let zone_id = index + 1;
    let event = SystemEventCode::from_u8(code);

    match event {
        Some(ev) => debug!("System event {:02X} ({}) zone/user {}", code, ev.description(), zone_id),
        None => info!("Unknown system event code {:02X} zone/user {}", code, zone_id),
    }

    let update = match event {
        Some(SystemEventCode::OtherTrouble) => Some((ZoneStatusFlags::TROUBLE, true)),
        Some(SystemEventCode::OtherTroubleRestore) => Some((ZoneStatusFlags::TROUBLE, false)),
        Some(SystemEventCode::OtherBypass) => Some((ZoneStatusFlags::BYPASSED, true)),
        Some(SystemEventCode::OtherUnbypass) => Some((ZoneStatusFlags::BYPASSED, false)),
        Some(SystemEventCode::Fault) => Some((ZoneStatusFlags::OPENED, true)),
        Some(SystemEventCode::FaultRestore) => Some((ZoneStatusFlags::OPENED, false)),
        _ => None,
    };

    if let Some((flag, value)) = update {
        match panel.zone(zone_id) {
            Some(zone) => {
                zone.set_flag(flag, value);
            }
            None => warn!("System event {:02X} names unknown zone {}", code, zone_id),
        }
    }

    panel.emit(PanelEvent::SystemEvent {
        raw_code: code,
        code: event,
        zone_id,
    });
}

/// A fixed-width field made only of hex digits. `from_str_radix` alone
/// would also take a sign.
fn hex_field(data: &str, range: std::ops::Range<usize>) -> Option<&str> {
    data.get(range)
        .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
}
