// MIT License - Copyright (c) 2026 Peter Wright
// Command bodies and message types

use std::fmt;

use crate::codec::build_body;
use crate::constants::MAX_OUTPUTS;
use crate::error::{AdemcoError, Result};

/// Commands that can be sent to the panel.
///
/// Each command renders to a pre-checksum body (`LL TT DATA 00`); the codec
/// appends the checksum and terminator when it is queued.
///
/// # Refresh Cycle
///
/// While connected, the driver polls:
///
/// ```text
/// zs (repeat until a ZS report arrives), cs, zp, then idle for an hour
/// ```
///
/// Arming status (`as`) is never polled automatically; request it with
/// [`Panel::request_arming_status`](crate::Panel::request_arming_status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `zs`: Request a full zone status report (answered with `ZS`).
    ZoneStatusRequest,
    /// `cs`: Request relay output status (answered with `CS`).
    OutputStatusRequest,
    /// `zp`: Request the zone to partition table (answered with `ZP`).
    ZonePartitionRequest,
    /// `as`: Request partition arming status (answered with `AS`).
    ArmingStatusRequest,
    /// `cn<id>`: Energise a relay output. Range: 1-8.
    OutputOn { id: u32 },
    /// `cf<id>`: Release a relay output. Range: 1-8.
    OutputOff { id: u32 },
    /// Raw pre-checksum body, sent as-is.
    Raw(String),
}

impl Command {
    /// Convert the command to its pre-checksum body.
    pub fn to_body(&self) -> Result<String> {
        match self {
            Command::ZoneStatusRequest => build_body("zs", ""),
            Command::OutputStatusRequest => build_body("cs", ""),
            Command::ZonePartitionRequest => build_body("zp", ""),
            Command::ArmingStatusRequest => build_body("as", ""),
            Command::OutputOn { id } => build_body("cn", &output_field(*id)?),
            Command::OutputOff { id } => build_body("cf", &output_field(*id)?),
            Command::Raw(body) => Ok(body.clone()),
        }
    }

    /// Relay command for the requested state.
    pub fn output(id: u32, on: bool) -> Self {
        if on {
            Command::OutputOn { id }
        } else {
            Command::OutputOff { id }
        }
    }
}

fn output_field(id: u32) -> Result<String> {
    if id == 0 || id > MAX_OUTPUTS {
        return Err(AdemcoError::InvalidDeviceId {
            kind: "output",
            id,
            max: MAX_OUTPUTS,
        });
    }
    Ok(format!("{:02}", id))
}

/// Inbound message types, keyed by the 2-char `TT` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// `ZS`: one status digit per zone.
    ZoneStatus,
    /// `ZP`: zone to partition table.
    ZonePartition,
    /// `CS`: one char per relay output.
    OutputStatus,
    /// `AS`: one char per partition.
    ArmingStatus,
    /// `NQ`: system event (code + zone index).
    SystemEvent,
    /// `OK`: acknowledgement.
    Ack,
    Unknown(String),
}

impl MessageType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "ZS" => Self::ZoneStatus,
            "ZP" => Self::ZonePartition,
            "CS" => Self::OutputStatus,
            "AS" => Self::ArmingStatus,
            "NQ" => Self::SystemEvent,
            "OK" => Self::Ack,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::ZoneStatus => "ZS",
            Self::ZonePartition => "ZP",
            Self::OutputStatus => "CS",
            Self::ArmingStatus => "AS",
            Self::SystemEvent => "NQ",
            Self::Ack => "OK",
            Self::Unknown(code) => code,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
