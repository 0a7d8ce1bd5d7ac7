use std::io;
use thiserror::Error;
use msgbox::IconType;
use std::fmt::{Debug, Display};
use std::str::Utf8Error;
use iced;
use serde_json;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl ConfigError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            ConfigError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start application (io): {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to list MIDI destinations: {source}")]
    DeviceError { #[from] source: DeviceError },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Failed to initialize MIDI client (midir): {message}")]
    Init { message: String },

    #[error("Failed to connect to MIDI port (midir): {message}")]
    Connect { message: String },

    #[error("Failed to query MIDI port (midir): {source}")]
    PortInfo { #[from] source: midir::PortInfoError },

    #[error("Failed to send to MIDI port (midir): {source}")]
    Send { #[from] source: midir::SendError },

    #[error("MIDI port {name} is no longer available")]
    EndpointGone { name: String },

    #[error("No device connected")]
    NotConnected,
}

impl From<midir::InitError> for DeviceError {
    fn from(err: midir::InitError) -> Self {
        DeviceError::Init { message: err.to_string() }
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for DeviceError {
    fn from(err: midir::ConnectError<midir::MidiOutput>) -> Self {
        DeviceError::Connect { message: err.to_string() }
    }
}

impl From<midir::ConnectError<midir::MidiInput>> for DeviceError {
    fn from(err: midir::ConnectError<midir::MidiInput>) -> Self {
        DeviceError::Connect { message: err.to_string() }
    }
}

pub fn error_msgbox<T: Display>(message: &'static str, error: &T) {
    let message = format!("{}: {}", message, error);
    eprintln!("{}", &message);
    if let Err(err) = msgbox::create(concat!("MIDI DFU Link ", env!("CARGO_PKG_VERSION")), &message, IconType::Error) {
        eprintln!("Failed to create msgbox: {:?}", err);
    }
}
