//! Signal handling for graceful shutdown

use std::io;
use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::info;

/// Wait for a shutdown signal (SIGTERM, SIGINT) and return its number
pub async fn shutdown_signal() -> io::Result<i32> {
    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    let handle = signals.handle();

    let signal = signals.next().await;
    handle.close();

    let signal = signal.ok_or_else(|| io::Error::other("signal stream closed"))?;
    info!("Received signal: {}", signal);
    Ok(signal)
}
