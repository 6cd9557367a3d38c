// MIT License - Copyright (c) 2026 Peter Wright
// Protocol constants

/// Number of addressable zones on the panel.
pub const MAX_ZONES: u32 = 96;

/// Number of addressable relay outputs.
pub const MAX_OUTPUTS: u32 = 8;

/// Frame terminator.
pub const CRLF: &[u8; 2] = b"\r\n";

/// Written once right after the port opens.
pub const PRIMING_SEQUENCE: &[u8; 2] = b"\r\n";

/// Keep-alive marker some firmware emits without a terminator.
pub const KEEPALIVE: u8 = b'P';

/// Bytes of a frame not counted in its payload: length, type, reserved, checksum.
pub const FRAME_OVERHEAD: usize = 8;

/// Longest inbound line kept before it is discarded as noise. A frame is at
/// most 0xFF bytes plus CR/LF; the rest is room for leading keep-alives.
pub const MAX_LINE_LEN: usize = 512;

/// Reserved field appended after the payload of outbound frames.
pub const RESERVED: &str = "00";

/// Output status marker for an unused output slot.
pub const OUTPUT_UNUSED: char = 'U';

/// System event codes reported in `NQ` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SystemEventCode {
    PerimeterAlarm = 0x00,
    EntryExitAlarm = 0x01,
    InteriorFollowerAlarm = 0x04,
    FireAlarm = 0x06,
    AudiblePanicAlarm = 0x07,
    SilentPanicAlarm = 0x08,
    Auxiliary24Hour = 0x09,
    DuressAlarm = 0x0C,
    OtherAlarmRestore = 0x0E,
    RfLowBattery = 0x0F,
    RfLowBatteryRestore = 0x10,
    OtherTrouble = 0x11,
    OtherTroubleRestore = 0x12,
    ArmStay = 0x15,
    Disarm = 0x16,
    Arm = 0x18,
    LowBattery = 0x1A,
    LowBatteryRestore = 0x1B,
    AcFail = 0x1C,
    AcRestore = 0x1D,
    AlarmCancel = 0x20,
    OtherBypass = 0x21,
    OtherUnbypass = 0x22,
    DayNightAlarm = 0x23,
    DayNightRestore = 0x24,
    FailToDisarm = 0x27,
    FailToArm = 0x28,
    Fault = 0x2B,
    FaultRestore = 0x2C,
}

impl SystemEventCode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x00 => Some(Self::PerimeterAlarm),
            0x01 => Some(Self::EntryExitAlarm),
            0x04 => Some(Self::InteriorFollowerAlarm),
            0x06 => Some(Self::FireAlarm),
            0x07 => Some(Self::AudiblePanicAlarm),
            0x08 => Some(Self::SilentPanicAlarm),
            0x09 => Some(Self::Auxiliary24Hour),
            0x0C => Some(Self::DuressAlarm),
            0x0E => Some(Self::OtherAlarmRestore),
            0x0F => Some(Self::RfLowBattery),
            0x10 => Some(Self::RfLowBatteryRestore),
            0x11 => Some(Self::OtherTrouble),
            0x12 => Some(Self::OtherTroubleRestore),
            0x15 => Some(Self::ArmStay),
            0x16 => Some(Self::Disarm),
            0x18 => Some(Self::Arm),
            0x1A => Some(Self::LowBattery),
            0x1B => Some(Self::LowBatteryRestore),
            0x1C => Some(Self::AcFail),
            0x1D => Some(Self::AcRestore),
            0x20 => Some(Self::AlarmCancel),
            0x21 => Some(Self::OtherBypass),
            0x22 => Some(Self::OtherUnbypass),
            0x23 => Some(Self::DayNightAlarm),
            0x24 => Some(Self::DayNightRestore),
            0x27 => Some(Self::FailToDisarm),
            0x28 => Some(Self::FailToArm),
            0x2B => Some(Self::Fault),
            0x2C => Some(Self::FaultRestore),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::PerimeterAlarm => "Perimeter Alarm",
            Self::EntryExitAlarm => "Entry/Exit Alarm",
            Self::InteriorFollowerAlarm => "Interior Follower Alarm",
            Self::FireAlarm => "Fire Alarm",
            Self::AudiblePanicAlarm => "Audible Panic Alarm",
            Self::SilentPanicAlarm => "Silent Panic Alarm",
            Self::Auxiliary24Hour => "24-Hr. Auxiliary",
            Self::DuressAlarm => "Duress Alarm",
            Self::OtherAlarmRestore => "Other Alarm Restores",
            Self::RfLowBattery => "RF Low Battery",
            Self::RfLowBatteryRestore => "RF Low Battery Restore",
            Self::OtherTrouble => "Other Trouble",
            Self::OtherTroubleRestore => "Other Trouble Restore",
            Self::ArmStay => "Arm-Stay/Home",
            Self::Disarm => "Disarm",
            Self::Arm => "Arm",
            Self::LowBattery => "Low Battery",
            Self::LowBatteryRestore => "Low Battery Restore",
            Self::AcFail => "AC Fail",
            Self::AcRestore => "AC Restore",
            Self::AlarmCancel => "Alarm Cancel",
            Self::OtherBypass => "Other Bypass",
            Self::OtherUnbypass => "Other Unbypass",
            Self::DayNightAlarm => "Day/Night Alarm",
            Self::DayNightRestore => "Day/Night Restore",
            Self::FailToDisarm => "Fail To Disarm",
            Self::FailToArm => "Fail To Arm",
            Self::Fault => "Faults",
            Self::FaultRestore => "Fault Restore",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_code_lookup() {
        assert_eq!(SystemEventCode::from_u8(0x2B), Some(SystemEventCode::Fault));
        assert_eq!(SystemEventCode::from_u8(0x11), Some(SystemEventCode::OtherTrouble));
        assert_eq!(SystemEventCode::from_u8(0x02), None);
        assert_eq!(SystemEventCode::from_u8(0xFF), None);
    }

    #[test]
    fn test_event_code_repr_matches_lookup() {
        for code in 0u8..=0xFF {
            if let Some(ev) = SystemEventCode::from_u8(code) {
                assert_eq!(ev as u8, code);
                assert!(!ev.description().is_empty());
            }
        }
    }
}
