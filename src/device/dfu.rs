use log::{info, warn};

use crate::device::constants::GIVE_UP_MESSAGE;
use crate::device::protocol::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Unknown,
    Normal { version: Option<u8> },
    DfuEnabled,
    DfuActive,
    Unrecognized(u8),
}

impl DeviceMode {
    pub fn message(&self) -> String {
        match self {
            DeviceMode::Unknown => "Device status unknown".to_string(),
            DeviceMode::Normal { version: None } => StatusCode::Normal.to_string(),
            DeviceMode::Normal { version: Some(version) } => StatusCode::NormalVersion(*version).to_string(),
            DeviceMode::DfuEnabled => StatusCode::EnabledNotActive.to_string(),
            DeviceMode::DfuActive => "Device is in DFU mode, ready for the wireless update".to_string(),
            DeviceMode::Unrecognized(value) => StatusCode::Unknown(*value).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfuAction {
    None,
    SendStatusQuery,
    SendRestart,
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLimits {
    pub max_poll_attempts: u32,
    pub max_restart_attempts: u32,
}

/// Drives status poll -> unanswered -> restart -> give up.
///
/// The device mode is a single value, so a confirmed DFU mode can never coexist with a
/// normal-mode status.
#[derive(Debug)]
pub struct DfuTracker {
    limits: RetryLimits,
    mode: DeviceMode,
    polling: bool,
    poll_attempts: u32,
    restart_attempts: u32,
    gave_up: bool,
}

impl DfuTracker {
    pub fn new(limits: RetryLimits) -> Self {
        DfuTracker {
            limits,
            mode: DeviceMode::Unknown,
            polling: false,
            poll_attempts: 0,
            restart_attempts: 0,
            gave_up: false,
        }
    }

    pub fn mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn is_confirmed(&self) -> bool {
        self.mode == DeviceMode::DfuActive
    }

    pub fn gave_up(&self) -> bool {
        self.gave_up
    }

    pub fn poll_attempts(&self) -> u32 {
        self.poll_attempts
    }

    pub fn restart_attempts(&self) -> u32 {
        self.restart_attempts
    }

    pub fn message(&self) -> String {
        if self.gave_up {
            GIVE_UP_MESSAGE.to_string()
        } else {
            self.mode.message()
        }
    }

    pub fn start_polling(&mut self) {
        self.polling = true;
        self.gave_up = false;
        self.poll_attempts = 0;
        self.restart_attempts = 0;
    }

    pub fn stop_polling(&mut self) {
        self.polling = false;
    }

    /// Forget everything learned about the previous device.
    pub fn reset(&mut self) {
        self.mode = DeviceMode::Unknown;
        self.polling = false;
        self.gave_up = false;
        self.poll_attempts = 0;
        self.restart_attempts = 0;
    }

    pub fn on_poll_tick(&mut self) -> DfuAction {
        if !self.polling {
            return DfuAction::None;
        }

        if self.poll_attempts >= self.limits.max_poll_attempts {
            self.poll_attempts = 0;

            if self.restart_attempts >= self.limits.max_restart_attempts {
                warn!("No DFU confirmation after {} restart attempts, giving up", self.restart_attempts);
                self.polling = false;
                self.gave_up = true;
                return DfuAction::GiveUp;
            }

            self.restart_attempts += 1;
            info!(
                "No status response after {} polls, restarting device (attempt {}/{})",
                self.limits.max_poll_attempts, self.restart_attempts, self.limits.max_restart_attempts,
            );
            return DfuAction::SendRestart;
        }

        self.poll_attempts += 1;
        DfuAction::SendStatusQuery
    }

    pub fn on_status(&mut self, code: StatusCode) {
        if code.is_valid() {
            self.poll_attempts = 0;
            self.restart_attempts = 0;
            self.gave_up = false;
        }

        self.mode = match code {
            StatusCode::Normal => DeviceMode::Normal { version: None },
            StatusCode::NormalVersion(version) => DeviceMode::Normal { version: Some(version) },
            StatusCode::EnabledNotActive => DeviceMode::DfuEnabled,
            StatusCode::DfuActive => {
                if self.polling {
                    info!("DFU mode confirmed, status polling stopped");
                }
                self.polling = false;
                DeviceMode::DfuActive
            },
            StatusCode::Unknown(value) => {
                warn!("Received unknown status byte {}", value);
                DeviceMode::Unrecognized(value)
            },
        };
    }

    pub fn on_disconnect(&mut self) {
        self.poll_attempts = 0;
        self.mode = DeviceMode::Unknown;
    }

    pub fn on_ota_disconnect(&mut self, complete: bool) {
        if !complete {
            return;
        }

        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> DfuTracker {
        DfuTracker::new(RetryLimits { max_poll_attempts: 7, max_restart_attempts: 3 })
    }

    #[test]
    fn idle_tracker_does_nothing() {
        let mut dfu = tracker();
        assert_eq!(dfu.on_poll_tick(), DfuAction::None);
        assert_eq!(dfu.poll_attempts(), 0);
    }

    #[test]
    fn restart_after_seven_unanswered_polls() {
        let mut dfu = tracker();
        dfu.start_polling();

        for attempt in 1..=7 {
            assert_eq!(dfu.on_poll_tick(), DfuAction::SendStatusQuery);
            assert_eq!(dfu.poll_attempts(), attempt);
        }

        assert_eq!(dfu.on_poll_tick(), DfuAction::SendRestart);
        assert_eq!(dfu.poll_attempts(), 0);
        assert_eq!(dfu.restart_attempts(), 1);
        assert_eq!(dfu.on_poll_tick(), DfuAction::SendStatusQuery);
    }

    #[test]
    fn gives_up_after_three_restarts() {
        let mut dfu = tracker();
        dfu.start_polling();

        let mut restarts = 0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            match dfu.on_poll_tick() {
                DfuAction::SendRestart => restarts += 1,
                DfuAction::GiveUp => break,
                DfuAction::SendStatusQuery => {},
                DfuAction::None => panic!("polling stopped without giving up"),
            }
        }

        assert_eq!(restarts, 3);
        // 4 rounds of 7 polls, 3 restarts and the give up itself
        assert_eq!(ticks, 4 * 7 + 3 + 1);
        assert!(!dfu.is_polling());
        assert!(dfu.gave_up());
        assert_eq!(dfu.message(), GIVE_UP_MESSAGE);
        assert_eq!(dfu.on_poll_tick(), DfuAction::None);
    }

    #[test]
    fn any_valid_response_resets_counters() {
        let mut dfu = tracker();
        dfu.start_polling();
        for _ in 0..(7 + 1 + 3) {
            dfu.on_poll_tick();
        }
        assert_eq!(dfu.restart_attempts(), 1);
        assert_eq!(dfu.poll_attempts(), 3);

        dfu.on_status(StatusCode::from_byte(1));
        assert_eq!(dfu.poll_attempts(), 0);
        assert_eq!(dfu.restart_attempts(), 0);
        assert_eq!(dfu.mode(), DeviceMode::DfuEnabled);
        assert!(dfu.is_polling());
    }

    #[test]
    fn unknown_status_keeps_counters() {
        let mut dfu = tracker();
        dfu.start_polling();
        dfu.on_poll_tick();
        dfu.on_status(StatusCode::from_byte(200));
        assert_eq!(dfu.poll_attempts(), 1);
        assert_eq!(dfu.mode(), DeviceMode::Unrecognized(200));
        assert!(!dfu.is_confirmed());
    }

    #[test]
    fn dfu_active_confirms_and_stops_polling() {
        let mut dfu = tracker();
        dfu.start_polling();
        dfu.on_poll_tick();
        dfu.on_status(StatusCode::from_byte(127));

        assert!(dfu.is_confirmed());
        assert!(!dfu.is_polling());
        assert_eq!(dfu.on_poll_tick(), DfuAction::None);
    }

    #[test]
    fn normal_status_is_never_confirmed() {
        let mut dfu = tracker();
        dfu.on_status(StatusCode::DfuActive);

        for value in std::iter::once(0).chain(6..=126) {
            dfu.on_status(StatusCode::from_byte(value));
            assert!(!dfu.is_confirmed(), "status {}", value);
            assert!(matches!(dfu.mode(), DeviceMode::Normal { .. }));
        }
        assert_eq!(dfu.mode(), DeviceMode::Normal { version: Some(126) });
    }

    #[test]
    fn give_up_cleared_by_response() {
        let mut dfu = tracker();
        dfu.start_polling();
        while dfu.on_poll_tick() != DfuAction::GiveUp {}

        dfu.on_status(StatusCode::Normal);
        assert!(!dfu.gave_up());
        assert_eq!(dfu.message(), "Device is running normally");
    }

    #[test]
    fn disconnect_resets_poll_counter_only() {
        let mut dfu = tracker();
        dfu.start_polling();
        for _ in 0..9 {
            dfu.on_poll_tick();
        }
        dfu.on_disconnect();
        assert_eq!(dfu.poll_attempts(), 0);
        assert_eq!(dfu.restart_attempts(), 1);
        assert!(dfu.is_polling());
    }

    #[test]
    fn reset_forgets_device() {
        let mut dfu = tracker();
        dfu.start_polling();
        for _ in 0..9 {
            dfu.on_poll_tick();
        }
        dfu.on_status(StatusCode::NormalVersion(42));
        dfu.on_poll_tick();

        dfu.reset();
        assert_eq!(dfu.mode(), DeviceMode::Unknown);
        assert!(!dfu.is_polling());
        assert_eq!(dfu.poll_attempts(), 0);
        assert_eq!(dfu.restart_attempts(), 0);
        assert_eq!(dfu.message(), "Device status unknown");
    }

    #[test]
    fn completed_ota_clears_confirmation() {
        let mut dfu = tracker();
        dfu.on_status(StatusCode::DfuActive);

        dfu.on_ota_disconnect(false);
        assert!(dfu.is_confirmed());

        dfu.on_ota_disconnect(true);
        assert!(!dfu.is_confirmed());
        assert_eq!(dfu.mode(), DeviceMode::Unknown);
    }
}
