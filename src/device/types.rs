use std::fmt;
use futures::channel::mpsc::Sender;

/// Opaque identifier of a MIDI port, only meaningful to the transport that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointHandle(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCandidate {
    pub name: String,
    pub endpoint: EndpointHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Scanning,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            ConnectionStatus::Unknown => "Unknown",
            ConnectionStatus::Scanning => "Scanning…",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        };

        write!(f, "{}", result)
    }
}

/// Everything the UI layer displays, published whenever any field changes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkSnapshot {
    pub destinations: Vec<String>,
    pub selected_destination: Option<String>,
    pub device_name: Option<String>,
    pub connection: ConnectionStatus,
    pub connected: bool,
    pub status_message: String,
    pub poll_attempts: u32,
    pub restart_attempts: u32,
    pub status_polling: bool,
    pub dfu_confirmed: bool,
    pub dfu_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    EnterDfu,
    CancelDfu,
    QueryStatus,
    // None removes the pin and goes back to matching by name
    SelectDestination(Option<String>),
    // sent by the wireless update mechanism once it lets go of the device
    OtaDisconnected { complete: bool },
}

#[derive(Debug, Clone)]
pub enum DeviceEvent {
    Ready(Sender<DeviceCommand>),
    StateChange(LinkSnapshot),
}
