//! Subscriber setup for processes that host the adapter.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary.

use std::io;

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn initialize(verbosity: u8) -> Result<()> {
	let fallback = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(io::stderr)
		.try_init()
		.map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}
