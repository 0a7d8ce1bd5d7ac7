pub mod connection;
pub mod constants;
pub mod dfu;
pub mod discovery;
pub mod protocol;
pub mod transport;
pub mod types;
