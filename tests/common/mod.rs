//! Helpers shared between the integration suites.

use memkeeper::KeeperConfig;
use memkeeper::MemKeeper;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// A keeper with a short operation timeout and no root prefix.
pub fn start_keeper() -> MemKeeper {
    enable_logger();
    start_keeper_with_config(KeeperConfig {
        operation_timeout_in_ms: 1_000,
        ..KeeperConfig::default()
    })
}

pub fn start_keeper_with_config(config: KeeperConfig) -> MemKeeper {
    enable_logger();
    MemKeeper::new(config).expect("Should succeed to build a keeper")
}
