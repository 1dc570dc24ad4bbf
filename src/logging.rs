//! Tracing subscriber setup

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr subscriber at `level`. `RUST_LOG` overrides it.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}
