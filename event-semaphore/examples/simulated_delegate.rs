use std::error::Error;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use event_semaphore::{EventKey, EventRegistry, Outcome};
use tracing::metadata::LevelFilter;
use tracing::{info, warn};
use uuid::Uuid;

/// Commands the caller issues to the pretend Bluetooth stack.
enum Command {
    Connect(Uuid),
    ReadRssi(Uuid),
}

/// Stands in for the platform stack: answers commands from its own thread
/// the way delegate callbacks would.
fn spawn_stack(registry: EventRegistry<i16>) -> mpsc::Sender<Command> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        for command in receiver {
            thread::sleep(Duration::from_millis(50));
            match command {
                Command::Connect(id) => {
                    registry.resolve(EventKey::scoped("didConnect", id).as_str(), 0);
                }
                Command::ReadRssi(id) if id.as_u128() % 2 == 0 => {
                    registry.resolve(EventKey::scoped("didReadRSSI", id).as_str(), -58);
                }
                Command::ReadRssi(id) => {
                    registry.reject_with_message(
                        EventKey::scoped("didReadRSSI", id).as_str(),
                        "peripheral disconnected",
                    );
                }
            }
        }
    });
    sender
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let registry = EventRegistry::<i16>::with_default_timeout(Duration::from_secs(2));
    let stack = spawn_stack(registry.clone());

    for id in [Uuid::from_u128(0x10), Uuid::from_u128(0x11)] {
        let outcome = registry
            .wait_for_async(EventKey::scoped("didConnect", id), || {
                if stack.send(Command::Connect(id)).is_err() {
                    warn!(%id, "stack thread is gone; connect not issued");
                }
            })
            .await;
        info!(%id, connected = outcome.is_success(), "connect finished");

        match registry
            .wait_for_async(EventKey::scoped("didReadRSSI", id), || {
                if stack.send(Command::ReadRssi(id)).is_err() {
                    warn!(%id, "stack thread is gone; RSSI read not issued");
                }
            })
            .await
        {
            Outcome::Success(rssi) => info!(%id, rssi, "read RSSI"),
            Outcome::Failure(error) => warn!(%id, %error, "RSSI read rejected"),
            Outcome::TimedOut => warn!(%id, "RSSI read timed out"),
        }
    }

    // nobody answers this one
    let outcome = registry
        .wait_for_async("peripheralManagerDidStartAdvertising", || {})
        .await;
    info!(timed_out = outcome.is_timed_out(), "advertising");

    Ok(())
}
