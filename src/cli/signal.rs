//! Ctrl+C handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};

/// Install the Ctrl+C handler. The returned flag is set on interrupt;
/// a second interrupt exits immediately.
pub fn setup_cancel_handler() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        crate::log!("build"; "cancelling...");
    })
    .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))?;
    Ok(cancel)
}
