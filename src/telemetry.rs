use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_level` when set. Fails when a global
/// subscriber is already installed.
pub fn init(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}
