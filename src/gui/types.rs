use iced::{Event};

use crate::config::types::Config;
use crate::device::types::{DeviceCommand, DeviceEvent};

#[derive(Debug, Clone)]
pub enum Message {
    EventOccurred(Event),
    ConfigLoadComplete((Config, Option<String>)),
    NoticeConfirmed,
    DeviceEvent(DeviceEvent),
    DeviceCommand(DeviceCommand),
    DestinationSelected(String),
    CommandSent(bool), // false if the link monitor is gone
}
