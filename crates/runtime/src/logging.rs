//! Tracing subscriber setup shared by battle binaries.

use tracing_subscriber::EnvFilter;

use crate::error::{Result, RuntimeError};

/// Install a fmt subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG`, with `info` added as the baseline.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| RuntimeError::Logging(e.to_string()))
}
