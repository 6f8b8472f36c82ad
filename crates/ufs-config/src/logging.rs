//! Structured logging setup for UFS components.
//!
//! The library crates emit `tracing` events; a host calls
//! [`init_logging`] once at startup to install a subscriber.

/// Component identifiers for log filtering
pub struct Component;

impl Component {
    pub const ENGINE: &'static str = "ENGINE";
    pub const IMAGE: &'static str = "IMAGE";
    pub const HOST: &'static str = "HOST";
}

/// Log levels for runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Initialize logging with the given level filter.
/// Call this once at application startup.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
