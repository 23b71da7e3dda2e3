//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging backend (binaries only; the library just emits through `log`)
///
/// Honors `RUST_LOG`; falls back to `default_filter` when it is unset.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    // A second init (tests, embedding hosts) is harmless.
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
}
