//! Graceful shutdown handling.

use log::{error, warn};
use tokio_util::sync::CancellationToken;

/// Exit code used when a scan is interrupted (128 + SIGINT).
pub const INTERRUPT_EXIT_CODE: i32 = 130;

/// Installs the Ctrl-C handler.
///
/// The first signal cancels the token: workers stop picking up new sites,
/// in-flight probes finish, and the engine flushes both stores on its
/// normal exit path (which performs no network calls). A second signal
/// during that drain exits immediately; the stores are write-through, so
/// everything confirmed before the signal is already on disk.
pub fn install_interrupt_handler(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received: finishing in-flight probes, then flushing state");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            error!("Second interrupt: exiting immediately");
            std::process::exit(INTERRUPT_EXIT_CODE);
        }
    })
}
