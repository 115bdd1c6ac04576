//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
///
/// Panics if a logger is already installed; use [`try_init`] when that can happen.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring an already installed logger
pub fn try_init() -> bool {
    env_logger::builder().try_init().is_ok()
}
