use crate::{
    display::{Display, PanelDriver},
    Error, Result,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use super::Logger;

/// Install a ctrl-c handler that flips the shared running flag instead of exiting immediately.
pub(super) fn create_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let running_handle = running.clone();

    ctrlc::set_handler(move || {
        running_handle.store(false, Ordering::SeqCst);
    })
    .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    Ok(running)
}

/// Blank the panel before exit. Best-effort: a failure is only logged.
pub fn blank_on_exit<P: PanelDriver>(display: &mut Display<P>, logger: &Logger) {
    match display.clear() {
        Ok(()) => logger.info("display cleared"),
        Err(err) => logger.warn(format!("display clear on exit failed: {err}")),
    }
}
