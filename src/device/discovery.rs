use log::{debug, info};

use crate::device::types::{ConnectionStatus, DeviceCandidate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryChange {
    Unchanged,
    Connected(DeviceCandidate),
    Disconnected,
}

/// Tracks which of the enumerated MIDI destinations is our device.
#[derive(Debug)]
pub struct Discovery {
    device_names: Vec<String>,
    pinned: Option<String>,
    status: ConnectionStatus,
    candidates: Vec<DeviceCandidate>,
    selected: Option<DeviceCandidate>,
}

impl Discovery {
    pub fn new(device_names: Vec<String>) -> Self {
        Discovery {
            device_names,
            pinned: None,
            status: ConnectionStatus::Unknown,
            candidates: Vec::new(),
            selected: None,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn candidates(&self) -> &[DeviceCandidate] {
        &self.candidates
    }

    pub fn selected(&self) -> Option<&DeviceCandidate> {
        self.selected.as_ref()
    }

    pub fn pinned(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    pub fn pin(&mut self, name: Option<String>) {
        self.pinned = name;
    }

    pub fn start(&mut self) {
        if self.status != ConnectionStatus::Connected {
            self.status = ConnectionStatus::Scanning;
        }
    }

    /// Drop the current selection without reporting a disconnect, so that the next update
    /// connects again.
    pub fn forget(&mut self) {
        self.selected = None;
        if self.status == ConnectionStatus::Connected {
            self.status = ConnectionStatus::Scanning;
        }
    }

    pub fn reset(&mut self) {
        self.selected = None;
        self.candidates.clear();
        self.status = ConnectionStatus::Disconnected;
    }

    fn find_match(&self) -> Option<&DeviceCandidate> {
        match &self.pinned {
            Some(pinned) => self.candidates.iter().find(|candidate| &candidate.name == pinned),
            None => self.candidates.iter().find(|candidate| {
                self.device_names.iter().any(|name| candidate.name.contains(name.as_str()))
            }),
        }
    }

    pub fn update(&mut self, candidates: Vec<DeviceCandidate>) -> DiscoveryChange {
        self.candidates = candidates;

        match self.find_match().cloned() {
            Some(candidate) => {
                self.status = ConnectionStatus::Connected;

                if self.selected.as_ref() == Some(&candidate) {
                    return DiscoveryChange::Unchanged;
                }

                info!("Found device {} ({:?})", candidate.name, candidate.endpoint);
                self.selected = Some(candidate.clone());
                DiscoveryChange::Connected(candidate)
            },
            None => {
                if let Some(previous) = self.selected.take() {
                    info!("Device {} is gone", previous.name);
                    self.status = ConnectionStatus::Disconnected;
                    return DiscoveryChange::Disconnected;
                }

                debug!("No destinations matched");
                DiscoveryChange::Unchanged
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::types::EndpointHandle;

    fn candidate(name: &str, index: usize) -> DeviceCandidate {
        DeviceCandidate { name: name.to_string(), endpoint: EndpointHandle(index) }
    }

    fn discovery() -> Discovery {
        let mut discovery = Discovery::new(vec!["DFU Link".to_string()]);
        discovery.start();
        discovery
    }

    #[test]
    fn matches_by_substring() {
        let mut discovery = discovery();
        assert_eq!(discovery.status(), ConnectionStatus::Scanning);

        let change = discovery.update(vec![candidate("IAC Bus 1", 0), candidate("My DFU Link Port 2", 1)]);
        assert_eq!(change, DiscoveryChange::Connected(candidate("My DFU Link Port 2", 1)));
        assert_eq!(discovery.status(), ConnectionStatus::Connected);
        assert_eq!(discovery.candidates().len(), 2);
    }

    #[test]
    fn match_is_case_sensitive() {
        let mut discovery = discovery();
        assert_eq!(discovery.update(vec![candidate("dfu link", 0)]), DiscoveryChange::Unchanged);
        assert_eq!(discovery.status(), ConnectionStatus::Scanning);
    }

    #[test]
    fn presence_and_absence_drive_transitions() {
        let mut discovery = discovery();
        discovery.update(vec![candidate("DFU Link", 0)]);
        assert_eq!(discovery.update(vec![candidate("DFU Link", 0)]), DiscoveryChange::Unchanged);

        assert_eq!(discovery.update(vec![]), DiscoveryChange::Disconnected);
        assert_eq!(discovery.status(), ConnectionStatus::Disconnected);
        assert_eq!(discovery.update(vec![]), DiscoveryChange::Unchanged);
        assert_eq!(discovery.status(), ConnectionStatus::Disconnected);

        assert_eq!(
            discovery.update(vec![candidate("DFU Link", 3)]),
            DiscoveryChange::Connected(candidate("DFU Link", 3))
        );
    }

    #[test]
    fn moved_endpoint_reconnects() {
        let mut discovery = discovery();
        discovery.update(vec![candidate("DFU Link", 0)]);
        assert_eq!(
            discovery.update(vec![candidate("Other", 0), candidate("DFU Link", 1)]),
            DiscoveryChange::Connected(candidate("DFU Link", 1))
        );
    }

    #[test]
    fn pinned_destination_matches_exact_name() {
        let mut discovery = discovery();
        discovery.pin(Some("Synth".to_string()));
        let change = discovery.update(vec![candidate("DFU Link", 0), candidate("Synth", 1)]);
        assert_eq!(change, DiscoveryChange::Connected(candidate("Synth", 1)));

        discovery.pin(None);
        let change = discovery.update(vec![candidate("DFU Link", 0), candidate("Synth", 1)]);
        assert_eq!(change, DiscoveryChange::Connected(candidate("DFU Link", 0)));
    }

    #[test]
    fn forget_retries_on_next_update() {
        let mut discovery = discovery();
        discovery.update(vec![candidate("DFU Link", 0)]);
        discovery.forget();
        assert_eq!(discovery.status(), ConnectionStatus::Scanning);
        assert_eq!(
            discovery.update(vec![candidate("DFU Link", 0)]),
            DiscoveryChange::Connected(candidate("DFU Link", 0))
        );
    }
}
