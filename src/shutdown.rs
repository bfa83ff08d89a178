//! Graceful shutdown on SIGINT and SIGTERM.
//!
//! The signal handler sets a process-wide flag and stops the server through
//! its [`ShutdownHandle`]; workers finish the request in hand and exit, after
//! which [`crate::server::ValidatorServer::run`] returns.

use crate::error::JcvError;
use crate::server::ShutdownHandle;
use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// True once a shutdown signal has been received.
pub fn is_shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Can only be installed once per process; a second call returns an error.
pub fn install_signal_handler(handle: ShutdownHandle) -> Result<(), JcvError> {
    ctrlc::set_handler(move || {
        tracing::info!("shutdown signal received");
        request_shutdown();
        handle.shutdown();
    })
    .map_err(|e| JcvError::ServerError(format!("failed to install signal handler: {}", e)))?;
    tracing::debug!("signal handler installed");
    Ok(())
}
