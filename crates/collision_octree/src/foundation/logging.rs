//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Reads the filter from `RUST_LOG`. Safe to call more than once; later calls
/// are ignored so tests and tools can both initialize.
pub fn init() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}
