use tracing::info;

use crate::LogLevel;

/// Installs the global fmt subscriber, must only be called once per process.
pub fn init_tracer(log_level: &LogLevel, service_name: &'static str) {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(log_level))
        .with_target(true)
        .init();

    info!(service = service_name, "tracing initialized");
}
