//! Graceful stop between work items via an atomic flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Granularity of interruptible sleeps
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Global shutdown flag, set by the SIGTERM/SIGINT handler
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Check if shutdown was requested
pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

/// Sleep for `duration` in short slices, waking early on a shutdown request.
///
/// Returns `false` if shutdown was requested before or during the sleep.
pub fn sleep_unless_shutdown(duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if is_shutdown_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

/// Register SIGINT/SIGTERM handlers.
///
/// First signal: the driver finishes the current item and stops.
/// Second signal: exit immediately with status 130.
pub fn install_signal_handlers() -> anyhow::Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
        unsafe {
            signal_hook::low_level::register(signal, || {
                if shutdown_flag().swap(true, Ordering::Relaxed) {
                    std::process::exit(130);
                }
            })
        }
        .map_err(|e| anyhow::anyhow!("Failed to register handler for signal {signal}: {e}"))?;
    }
    Ok(())
}
