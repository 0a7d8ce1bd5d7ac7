use std::env;
use clap::Parser;
use crate::gui::application::run_application;
use crate::error::AppRunError;

pub mod device;
pub mod gui;
pub mod error;
pub mod config;
pub mod headless;

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Finds a MIDI connected microcontroller and switches it into firmware update (DFU) mode", long_about = None)]
pub struct Args {
    /// Print the available MIDI destinations and exit
    #[arg(long)]
    pub list: bool,

    /// Run without a window, logging every state change until Ctrl-C
    #[arg(long)]
    pub headless: bool,

    /// Request DFU mode as soon as the device is connected (headless only)
    #[arg(long, requires = "headless")]
    pub enter_dfu: bool,

    /// Log debug messages, including every packet
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn init_logging(level: log::LevelFilter) {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

pub fn run(args: Args) -> Result<(), AppRunError> {
    if args.list {
        return headless::list_destinations();
    }

    if args.headless {
        return headless::run_headless(args.enter_dfu);
    }

    run_application()?;
    Ok(())
}
