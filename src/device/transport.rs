use futures::channel::mpsc::UnboundedSender;
use log::{debug, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use crate::device::constants::MIDI_CLIENT_NAME;
use crate::device::types::{DeviceCandidate, EndpointHandle};
use crate::error::DeviceError;

/// The platform MIDI service, reduced to what the link monitor needs.
///
/// Inbound packets are not returned from any method; implementations push them into the
/// channel they were constructed with.
pub trait MidiTransport {
    fn destinations(&mut self) -> Result<Vec<DeviceCandidate>, DeviceError>;
    fn connect(&mut self, candidate: &DeviceCandidate) -> Result<(), DeviceError>;
    fn disconnect(&mut self);
    fn send(&mut self, packet: &[u8]) -> Result<(), DeviceError>;
}

pub struct MidirTransport {
    incoming: UnboundedSender<Vec<u8>>,
    enumerator: Option<MidiOutput>,
    output: Option<MidiOutputConnection>,
    input: Option<MidiInputConnection<()>>,
}

impl MidirTransport {
    pub fn new(incoming: UnboundedSender<Vec<u8>>) -> Self {
        MidirTransport {
            incoming,
            enumerator: None,
            output: None,
            input: None,
        }
    }

    fn connect_output(candidate: &DeviceCandidate) -> Result<MidiOutputConnection, DeviceError> {
        let midi_output = MidiOutput::new(MIDI_CLIENT_NAME)?;
        let ports = midi_output.ports();

        let port = ports.get(candidate.endpoint.0)
            .filter(|port| midi_output.port_name(port).ok().as_deref() == Some(candidate.name.as_str()))
            .ok_or_else(|| DeviceError::EndpointGone { name: candidate.name.clone() })?
            .clone();

        Ok(midi_output.connect(&port, "dfu-link-out")?)
    }

    fn connect_input(&self, name: &str) -> Result<Option<MidiInputConnection<()>>, DeviceError> {
        let mut midi_input = MidiInput::new(MIDI_CLIENT_NAME)?;
        midi_input.ignore(Ignore::All);

        let port = midi_input.ports()
            .into_iter()
            .find(|port| midi_input.port_name(port).ok().as_deref() == Some(name));

        let port = match port {
            Some(port) => port,
            None => return Ok(None),
        };

        let incoming = self.incoming.clone();
        let connection = midi_input.connect(
            &port,
            "dfu-link-in",
            move |_stamp, message, _| {
                if incoming.unbounded_send(message.to_vec()).is_err() {
                    debug!("Dropping MIDI message, link monitor is gone");
                }
            },
            (),
        )?;

        Ok(Some(connection))
    }
}

impl MidiTransport for MidirTransport {
    fn destinations(&mut self) -> Result<Vec<DeviceCandidate>, DeviceError> {
        let enumerator = match self.enumerator.take() {
            Some(enumerator) => enumerator,
            None => MidiOutput::new(MIDI_CLIENT_NAME)?,
        };

        let mut candidates = Vec::new();
        for (index, port) in enumerator.ports().iter().enumerate() {
            match enumerator.port_name(port) {
                Ok(name) => candidates.push(DeviceCandidate { name, endpoint: EndpointHandle(index) }),
                Err(err) => warn!("Could not query MIDI port {} for its name: {}", index, err),
            }
        }

        self.enumerator = Some(enumerator);
        Ok(candidates)
    }

    fn connect(&mut self, candidate: &DeviceCandidate) -> Result<(), DeviceError> {
        self.disconnect();

        info!("Connecting to MIDI port {}...", candidate.name);
        let output = Self::connect_output(candidate)?;

        match self.connect_input(&candidate.name) {
            Ok(Some(input)) => self.input = Some(input),
            Ok(None) => warn!("MIDI port {} has no matching input, status responses will not arrive", candidate.name),
            Err(err) => warn!("Failed to open MIDI input {}: {}", candidate.name, err),
        }

        self.output = Some(output);
        info!("Connected to MIDI port {}", candidate.name);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(output) = self.output.take() {
            output.close();
        }
        if let Some(input) = self.input.take() {
            input.close();
        }
    }

    fn send(&mut self, packet: &[u8]) -> Result<(), DeviceError> {
        match self.output.as_mut() {
            Some(output) => Ok(output.send(packet)?),
            None => Err(DeviceError::NotConnected),
        }
    }
}
