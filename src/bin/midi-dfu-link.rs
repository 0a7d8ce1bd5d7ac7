use clap::Parser;
use log::{info, LevelFilter};
use msgbox::IconType;
use midi_dfu_link::{init_logging, run, Args};
use midi_dfu_link::error::{error_msgbox, AppRunError, ConfigError};

fn main() -> Result<(), AppRunError> {
    let args = Args::parse();
    init_logging(if args.verbose { LevelFilter::Debug } else { LevelFilter::Info });
    info!(concat!("MIDI DFU Link ", env!("CARGO_PKG_VERSION")));

    let gui = !args.list && !args.headless;

    match run(args) {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            let message = "This application has already been started";
            if gui {
                msgbox::create(
                    concat!("MIDI DFU Link ", env!("CARGO_PKG_VERSION")),
                    message,
                    IconType::Error,
                ).expect("Could not create msgbox");
            } else {
                eprintln!("{}", message);
            }
            Ok(())
        },
        Err(err) => {
            if gui {
                error_msgbox("Unexpected error", &err);
            }
            Err(err)
        }
        Ok(_) => Ok(())
    }
}
