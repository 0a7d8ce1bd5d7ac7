use std::fmt;

use crate::device::constants::{
    CC_ENABLE_DFU, CC_RESTART, CC_STATUS, CONTROL_CHANGE, STATUS_DFU_ACTIVE, STATUS_DFU_ENABLED,
    STATUS_NORMAL, VALUE_NONE, VALUE_ON,
};

/// A three byte MIDI Control Change packet, used as a generic command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChange {
    pub channel: u8,
    pub control: u8,
    pub value: u8,
}

impl ControlChange {
    pub fn new(channel: u8, control: u8, value: u8) -> Self {
        ControlChange {
            channel: channel.min(15),
            control: control & 0x7F,
            value: value & 0x7F,
        }
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        [CONTROL_CHANGE | (self.channel & 0x0F), self.control & 0x7F, self.value & 0x7F]
    }

    /// Returns `None` for anything that is not exactly one Control Change message.
    pub fn parse(bytes: &[u8]) -> Option<ControlChange> {
        match bytes {
            [status, control, value] if status & 0xF0 == CONTROL_CHANGE => Some(ControlChange {
                channel: status & 0x0F,
                control: *control,
                value: *value,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StatusQuery,
    EnableDfu,
    Restart,
}

impl Command {
    pub fn control(self) -> u8 {
        match self {
            Command::StatusQuery => CC_STATUS,
            Command::EnableDfu => CC_ENABLE_DFU,
            Command::Restart => CC_RESTART,
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Command::StatusQuery => VALUE_NONE,
            Command::EnableDfu | Command::Restart => VALUE_ON,
        }
    }

    pub fn packet(self, channel: u8) -> ControlChange {
        ControlChange::new(channel, self.control(), self.value())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            Command::StatusQuery => "status query",
            Command::EnableDfu => "enable DFU",
            Command::Restart => "restart",
        };

        write!(f, "{}", result)
    }
}

/// The single status byte the device answers a status query with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Normal,
    EnabledNotActive,
    NormalVersion(u8),
    DfuActive,
    Unknown(u8),
}

impl StatusCode {
    pub fn from_byte(value: u8) -> StatusCode {
        match value {
            STATUS_NORMAL => StatusCode::Normal,
            STATUS_DFU_ENABLED => StatusCode::EnabledNotActive,
            2..=126 => StatusCode::NormalVersion(value),
            STATUS_DFU_ACTIVE => StatusCode::DfuActive,
            other => StatusCode::Unknown(other),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, StatusCode::Unknown(_))
    }

    pub fn is_dfu_active(&self) -> bool {
        matches!(self, StatusCode::DfuActive)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Normal => write!(f, "Device is running normally"),
            StatusCode::EnabledNotActive => write!(f, "DFU enabled, waiting for the device to restart"),
            StatusCode::NormalVersion(version) => write!(f, "Device is running normally (firmware {})", version),
            StatusCode::DfuActive => write!(f, "Device is in DFU mode"),
            StatusCode::Unknown(value) => write!(f, "Unknown device status ({})", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_channel_one_control_change() {
        assert_eq!(Command::StatusQuery.packet(0).to_bytes(), [0xB0, 0x5A, 0]);
        assert_eq!(Command::EnableDfu.packet(0).to_bytes(), [0xB0, 0x5B, 127]);
        assert_eq!(Command::Restart.packet(0).to_bytes(), [0xB0, 0x13, 127]);
    }

    #[test]
    fn channel_is_clamped() {
        assert_eq!(Command::StatusQuery.packet(200).to_bytes()[0], 0xBF);
    }

    #[test]
    fn parse_accepts_only_control_change() {
        assert_eq!(
            ControlChange::parse(&[0xB0, 0x5A, 127]),
            Some(ControlChange { channel: 0, control: 0x5A, value: 127 })
        );
        assert_eq!(ControlChange::parse(&[0xB3, 0x5A, 6]).map(|cc| cc.channel), Some(3));
        // note on
        assert_eq!(ControlChange::parse(&[0x90, 60, 100]), None);
        assert_eq!(ControlChange::parse(&[0xB0, 0x5A]), None);
        assert_eq!(ControlChange::parse(&[0xB0, 0x5A, 0, 0]), None);
        assert_eq!(ControlChange::parse(&[]), None);
    }

    #[test]
    fn status_byte_mapping() {
        assert_eq!(StatusCode::from_byte(0), StatusCode::Normal);
        assert_eq!(StatusCode::from_byte(1), StatusCode::EnabledNotActive);
        assert_eq!(StatusCode::from_byte(2), StatusCode::NormalVersion(2));
        assert_eq!(StatusCode::from_byte(6), StatusCode::NormalVersion(6));
        assert_eq!(StatusCode::from_byte(126), StatusCode::NormalVersion(126));
        assert_eq!(StatusCode::from_byte(127), StatusCode::DfuActive);
        assert_eq!(StatusCode::from_byte(128), StatusCode::Unknown(128));
        assert_eq!(StatusCode::from_byte(255), StatusCode::Unknown(255));
    }

    #[test]
    fn only_dfu_active_is_confirmed() {
        for value in (0..=126).chain(128..=255) {
            assert!(!StatusCode::from_byte(value).is_dfu_active(), "status {}", value);
        }
        assert!(StatusCode::from_byte(127).is_dfu_active());
        assert!(!StatusCode::Unknown(200).is_valid());
    }
}
