use std::convert::Infallible;
use futures::channel::mpsc::{channel, unbounded, Receiver, Sender, UnboundedReceiver};
use futures::{future, SinkExt, StreamExt};
use iced::subscription::{self, Subscription};
use log::{debug, info, warn};
use tokio::time::{interval, sleep, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::types::Config;
use crate::device::constants::CC_STATUS;
use crate::device::dfu::{DfuAction, DfuTracker, RetryLimits};
use crate::device::discovery::{Discovery, DiscoveryChange};
use crate::device::protocol::{Command, ControlChange, StatusCode};
use crate::device::transport::{MidiTransport, MidirTransport};
use crate::device::types::{ConnectionStatus, DeviceCommand, DeviceEvent, LinkSnapshot};

/// Owns the device link: discovery, the DFU retry state and the transport.
///
/// Every method runs on the single task driven by [`LinkMonitor::run`], so there is no locking.
pub struct LinkMonitor<T: MidiTransport> {
    config: Config,
    transport: T,
    discovery: Discovery,
    dfu: DfuTracker,
    scan_paused: bool,
    rescan_pending: bool,
    status_message: String,
}

impl<T: MidiTransport> LinkMonitor<T> {
    pub fn new(config: Config, transport: T) -> Self {
        let discovery = Discovery::new(config.device_names.clone());
        let dfu = DfuTracker::new(RetryLimits {
            max_poll_attempts: config.max_poll_attempts,
            max_restart_attempts: config.max_restart_attempts,
        });

        LinkMonitor {
            config,
            transport,
            discovery,
            dfu,
            scan_paused: false,
            rescan_pending: false,
            status_message: String::new(),
        }
    }

    pub fn is_scan_paused(&self) -> bool {
        self.scan_paused
    }

    pub fn is_rescan_pending(&self) -> bool {
        self.rescan_pending
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        let selected = self.discovery.selected();
        let connection = self.discovery.status();

        LinkSnapshot {
            destinations: self.discovery.candidates().iter().map(|candidate| candidate.name.clone()).collect(),
            selected_destination: self.discovery.pinned()
                .map(String::from)
                .or_else(|| selected.map(|candidate| candidate.name.clone())),
            device_name: selected.map(|candidate| candidate.name.clone()),
            connection,
            connected: connection == ConnectionStatus::Connected,
            status_message: self.status_message.clone(),
            poll_attempts: self.dfu.poll_attempts(),
            restart_attempts: self.dfu.restart_attempts(),
            status_polling: self.dfu.is_polling(),
            dfu_confirmed: self.dfu.is_confirmed(),
            dfu_message: self.dfu.message(),
        }
    }

    pub fn start(&mut self) {
        self.discovery.start();
        self.status_message = "Scanning for device…".to_string();
    }

    fn send(&mut self, command: Command) {
        let packet = command.packet(self.config.midi_channel);
        debug!("Sending {} {:?}", command, packet);

        if let Err(err) = self.transport.send(&packet.to_bytes()) {
            warn!("Failed to send {} command: {}", command, err);
        }
    }

    pub fn on_connection_tick(&mut self) {
        if self.scan_paused {
            return;
        }

        let candidates = match self.transport.destinations() {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!("Failed to enumerate MIDI destinations: {}", err);
                Vec::new()
            },
        };

        let had_device = self.discovery.selected().is_some();

        match self.discovery.update(candidates) {
            DiscoveryChange::Unchanged => {},
            DiscoveryChange::Connected(candidate) => {
                if had_device {
                    info!("Switched to {}, forgetting the previous device's state", candidate.name);
                    self.dfu.reset();
                }

                match self.transport.connect(&candidate) {
                    Ok(()) => {
                        self.status_message = format!("Connected to {}", candidate.name);
                        // learn the current mode, this query is not counted as a poll attempt
                        self.send(Command::StatusQuery);
                    },
                    Err(err) => {
                        warn!("Connecting to {} failed: {}", candidate.name, err);
                        self.status_message = format!("Could not open {}: {}", candidate.name, err);
                        self.discovery.forget();
                    },
                }
            },
            DiscoveryChange::Disconnected => {
                self.transport.disconnect();
                self.dfu.on_disconnect();
                self.status_message = "Device disconnected, scanning…".to_string();
            },
        }
    }

    /// Ticks count toward the retry ceilings even while the device is gone, so a device that
    /// never comes back after a restart still ends in the give up message. Nothing is sent then.
    pub fn on_status_tick(&mut self) {
        let connected = self.discovery.status() == ConnectionStatus::Connected;

        match self.dfu.on_poll_tick() {
            DfuAction::None => {},
            DfuAction::SendStatusQuery => {
                if connected {
                    self.send(Command::StatusQuery);
                }
            },
            DfuAction::SendRestart => {
                self.status_message = format!(
                    "No response from device, restarting it ({}/{})",
                    self.dfu.restart_attempts(), self.config.max_restart_attempts,
                );
                if connected {
                    self.send(Command::Restart);
                }
            },
            DfuAction::GiveUp => {
                self.status_message = "Manual reconnection required".to_string();
            },
        }
    }

    pub fn on_packet(&mut self, bytes: &[u8]) {
        let packet = match ControlChange::parse(bytes) {
            Some(packet) => packet,
            None => {
                debug!("Ignoring MIDI message {:02X?}", bytes);
                return;
            },
        };

        if packet.channel != self.config.midi_channel || packet.control != CC_STATUS {
            debug!("Ignoring control change {:?}", packet);
            return;
        }

        let code = StatusCode::from_byte(packet.value);
        debug!("Status response {:?}", code);
        let was_confirmed = self.dfu.is_confirmed();
        self.dfu.on_status(code);

        if self.dfu.is_confirmed() && !was_confirmed {
            info!("Device entered DFU mode, waiting for the wireless update");
            self.scan_paused = true;
            self.status_message = "Device is in DFU mode, start the wireless update".to_string();
        }
    }

    /// Returns true when a delayed rescan should be scheduled.
    pub fn on_command(&mut self, command: DeviceCommand) -> bool {
        match command {
            DeviceCommand::EnterDfu => {
                if self.discovery.status() != ConnectionStatus::Connected {
                    self.status_message = "No device connected".to_string();
                    return false;
                }

                if self.dfu.is_confirmed() {
                    self.status_message = "Device is already in DFU mode".to_string();
                    return false;
                }

                info!("Requesting DFU mode");
                self.send(Command::EnableDfu);
                self.dfu.start_polling();
                self.status_message = "Waiting for DFU mode…".to_string();
            },
            DeviceCommand::CancelDfu => {
                info!("DFU request cancelled");
                self.dfu.stop_polling();
                self.status_message = "DFU request cancelled".to_string();
            },
            DeviceCommand::QueryStatus => {
                if self.discovery.status() == ConnectionStatus::Connected {
                    self.send(Command::StatusQuery);
                }
            },
            DeviceCommand::SelectDestination(name) => {
                info!("Destination selected: {:?}", name);
                self.discovery.pin(name);
            },
            DeviceCommand::OtaDisconnected { complete } => {
                if complete {
                    info!("Wireless update complete, rescanning in {}ms", self.config.rescan_delay_ms);
                    self.dfu.on_ota_disconnect(true);
                    self.transport.disconnect();
                    self.discovery.reset();
                    self.status_message = "Firmware update complete, reconnecting…".to_string();
                } else {
                    warn!("Wireless update did not complete");
                    self.status_message = "Firmware update did not complete".to_string();
                }

                self.scan_paused = true;
                self.rescan_pending = true;
                return true;
            },
        }

        false
    }

    pub fn on_rescan(&mut self) {
        info!("Resuming device scanning");
        self.rescan_pending = false;
        self.scan_paused = false;
        self.start();
        self.on_connection_tick();
    }

    pub async fn run(
        mut self,
        cancel: CancellationToken,
        mut commands: Receiver<DeviceCommand>,
        mut incoming: UnboundedReceiver<Vec<u8>>,
        mut senders: Vec<Sender<DeviceEvent>>,
    ) {
        let mut connection_interval = interval(Duration::from_millis(self.config.connection_poll_interval_ms));
        connection_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut status_interval = interval(Duration::from_millis(self.config.status_poll_interval_ms));
        status_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let rescan = sleep(Duration::ZERO);
        tokio::pin!(rescan);

        let mut previous_snapshot: Option<LinkSnapshot> = None;
        self.start();

        'mainloop: loop {
            let snapshot = self.snapshot();
            if previous_snapshot.as_ref() != Some(&snapshot) {
                for sender in &mut senders {
                    if sender.send(DeviceEvent::StateChange(snapshot.clone())).await.is_err() {
                        debug!("DeviceEvent receiver is gone");
                    }
                }
                previous_snapshot = Some(snapshot);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                _ = connection_interval.tick() => self.on_connection_tick(),
                _ = status_interval.tick() => self.on_status_tick(),
                _ = &mut rescan, if self.rescan_pending => self.on_rescan(),
                Some(bytes) = incoming.next() => self.on_packet(&bytes),
                Some(command) = commands.next() => {
                    let enter_dfu = command == DeviceCommand::EnterDfu;
                    if self.on_command(command) {
                        rescan.as_mut().reset(Instant::now() + Duration::from_millis(self.config.rescan_delay_ms));
                    }
                    if enter_dfu {
                        // first poll one full interval after the enable command
                        status_interval.reset();
                    }
                },
            }
        }

        self.transport.disconnect();
        info!("Link monitor stopped");
    }
}

pub fn connect_device_subscription(cancel: CancellationToken, config: Config) -> Subscription<DeviceEvent> {
    struct Connect;

    subscription::channel(
        std::any::TypeId::of::<Connect>(),
        64,
        move |mut subscription_sender| async move {
            let (command_sender, command_receiver) = channel::<DeviceCommand>(16);
            if subscription_sender.send(DeviceEvent::Ready(command_sender)).await.is_err() {
                warn!("Failed to hand the command sender to the UI");
            }

            let (incoming_sender, incoming_receiver) = unbounded();
            let monitor = LinkMonitor::new(config, MidirTransport::new(incoming_sender));
            monitor.run(cancel, command_receiver, incoming_receiver, vec![subscription_sender]).await;

            // note: subscription::channel expects the future to never resolve (Infallible)
            future::pending::<Infallible>().await
        },
    )
}
