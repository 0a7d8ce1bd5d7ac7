use futures::channel::mpsc::Sender;
use futures::SinkExt;
use iced::{Alignment, Application, Command, Element, Length, Settings, Size, Subscription, executor, window};
use iced::event::{self, Event};
use iced::theme::{self, Theme};
use iced::widget::{PickList, button, column, container, horizontal_rule, row, text};
use log::{error, info};
use tokio_util::sync::{CancellationToken};

use crate::config::io::{ConfigIO};
use crate::config::types::Config;
use crate::device::connection::connect_device_subscription;
use crate::device::types::{DeviceCommand, DeviceEvent, LinkSnapshot};
use crate::error::AppRunError;
use crate::gui::types::Message;

const AUTOMATIC_DESTINATION: &str = "Automatic";

pub struct ApplicationFlags {
    config_io: ConfigIO,
}

pub struct MyApplication {
    // this token is cancelled upon exit
    app_cancel: CancellationToken,

    // messages that the user must click away
    notices: Vec<String>,

    config_io: ConfigIO,
    // the device subscription is started once the config has been loaded
    config: Option<Config>,

    // commands for the link monitor, available after DeviceEvent::Ready
    command_sender: Option<Sender<DeviceCommand>>,

    // latest state from the link monitor
    snapshot: LinkSnapshot,
}

impl MyApplication {
    fn before_close(&mut self) {
        self.app_cancel.cancel();
    }

    fn load_config(&self) -> Command<Message> {
        let config_io = self.config_io.clone();

        let fut = async move {
            match config_io.read().await {
                Ok(config) => (config, None),
                Err(err) => {
                    error!("Failed to load config: {:?}", &err);
                    (Config::default(), Some(format!("Failed to load config, using defaults: {}", &err)))
                }
            }
        };

        Command::perform(fut, Message::ConfigLoadComplete)
    }

    fn send_command(&self, command: DeviceCommand) -> Command<Message> {
        let mut sender = match &self.command_sender {
            Some(sender) => sender.clone(),
            None => {
                info!("Ignoring {:?}, link monitor not ready", command);
                return Command::none();
            },
        };

        let fut = async move {
            match sender.send(command).await {
                Ok(_) => true,
                Err(err) => {
                    error!("Failed to send command to link monitor: {:?}", &err);
                    false
                },
            }
        };

        Command::perform(fut, Message::CommandSent)
    }
}

impl Application for MyApplication {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ApplicationFlags;

    fn new(flags: ApplicationFlags) -> (MyApplication, Command<Self::Message>) {
        let app = MyApplication {
            app_cancel: CancellationToken::new(),
            notices: Vec::new(),
            config_io: flags.config_io,
            config: None,
            command_sender: None,
            snapshot: LinkSnapshot::default(),
        };

        let command = app.load_config();
        (app, command)
    }

    fn title(&self) -> String {
        String::from(concat!("MIDI DFU Link ", env!("CARGO_PKG_VERSION")))
    }

    fn update(&mut self, message: Message) -> Command<Self::Message> {
        match message {
            Message::ConfigLoadComplete((config, error_message)) => {
                info!("Config load complete");
                self.config = Some(config);
                if let Some(error_message) = error_message {
                    self.notices.push(error_message);
                }
            },
            Message::NoticeConfirmed => {
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
            },
            Message::EventOccurred(Event::Window(id, window::Event::CloseRequested)) => {
                info!("Close requested");
                self.before_close();
                return window::close(id);
            },
            Message::DeviceEvent(DeviceEvent::Ready(sender)) => {
                info!("Link monitor ready");
                self.command_sender = Some(sender);
            },
            Message::DeviceEvent(DeviceEvent::StateChange(snapshot)) => {
                self.snapshot = snapshot;
            },
            Message::DeviceCommand(command) => {
                return self.send_command(command);
            },
            Message::DestinationSelected(name) => {
                let pinned = if name == AUTOMATIC_DESTINATION { None } else { Some(name) };
                return self.send_command(DeviceCommand::SelectDestination(pinned));
            },
            Message::CommandSent(false) => {
                self.command_sender = None;
            },

            _ => {}
        }

        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen().map(Message::EventOccurred)];

        if let Some(config) = &self.config {
            subscriptions.push(
                connect_device_subscription(self.app_cancel.clone(), config.clone()).map(Message::DeviceEvent)
            );
        }

        Subscription::batch(subscriptions)
    }

    fn view(&self) -> Element<Message> {
        if let Some(notice) = self.notices.first() {
            return container(
                column![
                    text(notice),

                    button(text("Okay"))
                        .on_press(Message::NoticeConfirmed),

                ].align_items(Alignment::Center).spacing(20),
            )
            .width(Length::Fill)
            .padding(20)
            .into()
        }

        let snapshot = &self.snapshot;

        let mut destinations = vec![AUTOMATIC_DESTINATION.to_string()];
        destinations.extend(snapshot.destinations.iter().cloned());
        let selected = Some(snapshot.selected_destination.clone().unwrap_or_else(|| AUTOMATIC_DESTINATION.to_string()));

        let device = match &snapshot.device_name {
            Some(name) => format!("{}: {}", name, snapshot.connection),
            None => snapshot.connection.to_string(),
        };

        let mut enter_dfu_button = button(text("Enter DFU mode")).style(theme::Button::Primary);
        if snapshot.connected && !snapshot.status_polling && !snapshot.dfu_confirmed {
            enter_dfu_button = enter_dfu_button.on_press(Message::DeviceCommand(DeviceCommand::EnterDfu));
        }

        let mut cancel_button = button(text("Cancel")).style(theme::Button::Secondary);
        if snapshot.status_polling {
            cancel_button = cancel_button.on_press(Message::DeviceCommand(DeviceCommand::CancelDfu));
        }

        let mut query_button = button(text("Query status")).style(theme::Button::Secondary);
        if snapshot.connected {
            query_button = query_button.on_press(Message::DeviceCommand(DeviceCommand::QueryStatus));
        }

        container(
            column![
                PickList::new(destinations, selected, Message::DestinationSelected).width(300),

                text(device),
                text(&snapshot.status_message),

                horizontal_rule(10),

                text(&snapshot.dfu_message).size(20),
                text(format!(
                    "Status polls: {}   Restart attempts: {}",
                    snapshot.poll_attempts, snapshot.restart_attempts,
                )).size(14),

                row![enter_dfu_button, cancel_button, query_button].spacing(20),
            ]
                .spacing(20)
                .width(Length::Fill)
                .align_items(Alignment::Center),
        )
        .width(Length::Fill)
        .padding(20)
        .into()
    }
}

pub fn run_application() -> Result<(), AppRunError> {
    let mut config_io = ConfigIO::new_sync()?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let flags = ApplicationFlags { config_io };
    let mut settings = Settings::with_flags(flags);

    // handle exits ourselves (Event::CloseRequested)
    settings.id = Some("midi-dfu-link".to_string());
    settings.window.exit_on_close_request = false;
    settings.window.size = Size::new(500.0, 400.0);
    settings.window.resizable = false;

    // this function will call process::exit() unless there was a startup error
    MyApplication::run(settings)?;
    Ok(())
}
