use futures::channel::mpsc::{channel, unbounded};
use futures::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

use crate::config::io::ConfigIO;
use crate::device::connection::LinkMonitor;
use crate::device::transport::{MidiTransport, MidirTransport};
use crate::device::types::{DeviceCommand, DeviceEvent};
use crate::error::AppRunError;

pub fn list_destinations() -> Result<(), AppRunError> {
    let (incoming_sender, _incoming_receiver) = unbounded();
    let mut transport = MidirTransport::new(incoming_sender);

    for candidate in transport.destinations()? {
        println!("{}: {}", candidate.endpoint.0, candidate.name);
    }

    Ok(())
}

pub fn run_headless(enter_dfu: bool) -> Result<(), AppRunError> {
    let mut config_io = ConfigIO::new_sync()?;
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async move {
        let config = config_io.read().await?;
        let cancel = CancellationToken::new();

        let (mut command_sender, command_receiver) = channel::<DeviceCommand>(16);
        let (event_sender, mut event_receiver) = channel::<DeviceEvent>(64);
        let (incoming_sender, incoming_receiver) = unbounded();

        let monitor = LinkMonitor::new(config, MidirTransport::new(incoming_sender));
        let monitor_handle = tokio::spawn(
            monitor.run(cancel.clone(), command_receiver, incoming_receiver, vec![event_sender])
        );

        let mut dfu_requested = !enter_dfu;

        'mainloop: loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        warn!("Failed to listen for Ctrl-C: {}", err);
                    }
                    info!("Stopping");
                    break 'mainloop;
                },
                Some(event) = event_receiver.next() => {
                    if let DeviceEvent::StateChange(snapshot) = event {
                        info!(
                            "{} | {} | polls {} restarts {} | {}",
                            snapshot.connection,
                            snapshot.status_message,
                            snapshot.poll_attempts,
                            snapshot.restart_attempts,
                            snapshot.dfu_message,
                        );

                        if snapshot.connected && !dfu_requested {
                            dfu_requested = true;
                            if command_sender.send(DeviceCommand::EnterDfu).await.is_err() {
                                warn!("Link monitor is not accepting commands");
                            }
                        }
                    }
                },
            }
        }

        cancel.cancel();
        // keep draining events so that the monitor is never blocked on a full channel while it stops
        tokio::spawn(async move { while event_receiver.next().await.is_some() {} });
        if let Err(err) = monitor_handle.await {
            warn!("Link monitor task failed: {}", err);
        }

        Ok::<(), AppRunError>(())
    })
}
