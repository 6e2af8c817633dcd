// Signal-driven shutdown: end the session as ClientTerminating exactly once

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit status used after a signal-driven shutdown
pub const SIGNAL_EXIT_CODE: i32 = 130;

/// Shared shutdown flag; clones observe the same request
#[derive(Clone)]
pub struct ShutdownState {
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request a shutdown. Returns `true` only for the first request.
    pub fn request_shutdown(&self) -> bool {
        let first = !self.shutdown_requested.swap(true, Ordering::SeqCst);
        if first {
            log::info!("Shutdown requested");
        }
        first
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of shutdown cleanup
#[derive(Debug, Clone, Default)]
pub struct ShutdownResult {
    /// Whether an active session was ended by this shutdown
    pub session_ended: bool,
}

impl ShutdownResult {
    pub fn new(session_ended: bool) -> Self {
        Self { session_ended }
    }
}

/// Runs the cleanup callback at most once, however many signals arrive
#[derive(Clone, Default)]
pub struct ShutdownHandler {
    state: ShutdownState,
}

impl ShutdownHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Perform shutdown cleanup.
    /// Returns `None` when another caller already started the shutdown.
    pub fn handle_shutdown<F>(&self, cleanup_fn: F) -> Option<ShutdownResult>
    where
        F: FnOnce() -> ShutdownResult,
    {
        if !self.state.request_shutdown() {
            log::debug!("Shutdown already in progress");
            return None;
        }

        let result = cleanup_fn();
        log::info!(
            "Shutdown complete: session {}",
            if result.session_ended {
                "ended"
            } else {
                "was not active"
            }
        );
        Some(result)
    }
}

/// Register signal handlers for SIGINT (Ctrl+C), SIGTERM and SIGHUP.
/// `on_signal` runs on the signal thread for every signal received.
#[cfg(unix)]
pub fn register_signal_handlers<F>(on_signal: F) -> Result<()>
where
    F: Fn() + Send + 'static,
{
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::thread;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
        .map_err(|e| anyhow::anyhow!("Failed to register signal handlers: {}", e))?;

    thread::Builder::new()
        .name("signal-watcher".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGINT => log::info!("Received SIGINT (Ctrl+C)"),
                    SIGTERM => log::info!("Received SIGTERM"),
                    SIGHUP => log::info!("Received SIGHUP"),
                    _ => continue,
                }
                on_signal();
            }
        })
        .map_err(|e| anyhow::anyhow!("Failed to spawn signal thread: {}", e))?;

    log::debug!("Signal handlers registered (SIGINT, SIGTERM, SIGHUP)");
    Ok(())
}

/// Register signal handlers for Windows
#[cfg(windows)]
pub fn register_signal_handlers<F>(on_signal: F) -> Result<()>
where
    F: Fn() + Send + 'static,
{
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C");
        on_signal();
    })
    .map_err(|e| anyhow::anyhow!("Failed to register Ctrl+C handler: {}", e))?;

    log::debug!("Signal handler registered (Ctrl+C)");
    Ok(())
}
