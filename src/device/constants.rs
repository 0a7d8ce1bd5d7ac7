/**
 * How often (milliseconds) to re-enumerate MIDI destinations and check for the device.
 */
pub const CONNECTION_POLL_DELAY: u64 = 1000;

/**
 * How often (milliseconds) to send a status query while waiting for DFU mode.
 */
pub const STATUS_POLL_DELAY: u64 = 1000;

/**
 * How long (milliseconds) to wait after the OTA transfer disconnected before scanning again.
 */
pub const RESCAN_DELAY: u64 = 3000;

/**
 * Lower bound (milliseconds) for any configured interval.
 */
pub const MIN_POLL_DELAY: u64 = 10;

/**
 * Consecutive unanswered status queries before a restart command is sent.
 */
pub const MAX_POLL_ATTEMPTS: u32 = 7;

/**
 * Restart commands to send before giving up and asking the user to reconnect the device.
 */
pub const MAX_RESTART_ATTEMPTS: u32 = 3;

/**
 * Substrings of MIDI port names that identify the device.
 */
pub const DEFAULT_DEVICE_NAMES: [&str; 2] = ["DFU Link", "TinyUSB MIDI"];

pub const CONTROL_CHANGE: u8 = 0xB0;
pub const CC_STATUS: u8 = 0x5A;
pub const CC_ENABLE_DFU: u8 = 0x5B;
pub const CC_RESTART: u8 = 0x13;

pub const VALUE_NONE: u8 = 0;
pub const VALUE_ON: u8 = 127;

pub const STATUS_NORMAL: u8 = 0;
pub const STATUS_DFU_ENABLED: u8 = 1;
pub const STATUS_DFU_ACTIVE: u8 = 127;

pub const GIVE_UP_MESSAGE: &str =
    "The device did not enter DFU mode. Please disconnect and reconnect it manually, then try again.";

pub const MIDI_CLIENT_NAME: &str = "midi-dfu-link";
