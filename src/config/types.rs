use serde::{Deserialize, Serialize};

use crate::device::constants::{
    CONNECTION_POLL_DELAY, DEFAULT_DEVICE_NAMES, MAX_POLL_ATTEMPTS, MAX_RESTART_ATTEMPTS, MIN_POLL_DELAY,
    RESCAN_DELAY, STATUS_POLL_DELAY,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// A MIDI destination is the device if its name contains any of these.
    pub device_names: Vec<String>,
    /// 0 based, 0 is MIDI channel 1.
    pub midi_channel: u8,
    pub connection_poll_interval_ms: u64,
    pub status_poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub max_restart_attempts: u32,
    pub rescan_delay_ms: u64,
}

impl Config {
    pub fn normalize(&mut self) {
        self.device_names.retain(|name| !name.trim().is_empty());
        self.midi_channel = self.midi_channel.min(15);
        self.connection_poll_interval_ms = self.connection_poll_interval_ms.max(MIN_POLL_DELAY);
        self.status_poll_interval_ms = self.status_poll_interval_ms.max(MIN_POLL_DELAY);
        self.max_poll_attempts = self.max_poll_attempts.max(1);
        self.max_restart_attempts = self.max_restart_attempts.max(1);
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device_names: DEFAULT_DEVICE_NAMES.iter().map(|name| name.to_string()).collect(),
            midi_channel: 0,
            connection_poll_interval_ms: CONNECTION_POLL_DELAY,
            status_poll_interval_ms: STATUS_POLL_DELAY,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
            max_restart_attempts: MAX_RESTART_ATTEMPTS,
            rescan_delay_ms: RESCAN_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "deviceNames": ["Pico"], "maxPollAttempts": 4 }"#).unwrap();
        assert_eq!(config.device_names, vec!["Pico".to_string()]);
        assert_eq!(config.max_poll_attempts, 4);
        assert_eq!(config.max_restart_attempts, 3);
        assert_eq!(config.status_poll_interval_ms, 1000);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"connectionPollIntervalMs\":1000"));
        assert!(json.contains("\"rescanDelayMs\":3000"));
    }

    #[test]
    fn normalize_clamps_values() {
        let mut config = Config {
            device_names: vec!["".to_string(), "  ".to_string(), "Pico".to_string()],
            midi_channel: 20,
            connection_poll_interval_ms: 0,
            status_poll_interval_ms: 1,
            max_poll_attempts: 0,
            max_restart_attempts: 0,
            rescan_delay_ms: 0,
        };
        config.normalize();

        assert_eq!(config.device_names, vec!["Pico".to_string()]);
        assert_eq!(config.midi_channel, 15);
        assert_eq!(config.connection_poll_interval_ms, MIN_POLL_DELAY);
        assert_eq!(config.status_poll_interval_ms, MIN_POLL_DELAY);
        assert_eq!(config.max_poll_attempts, 1);
        assert_eq!(config.max_restart_attempts, 1);
        assert_eq!(config.rescan_delay_ms, 0);
    }
}
