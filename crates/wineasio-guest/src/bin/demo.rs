//! Thin demo CLI (§10.3): brings up a guest driver object against a real
//! native-session subprocess, prints what `Init`/`GetChannels`/`GetSampleRate`
//! report, then releases it. Not a host — just enough to exercise the
//! process-boundary wiring end to end outside of the test suite.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wineasio_guest::{AsioDriver, DriverObject, ProcessTransport};
use wineasio_guest::config::{apply_env_overrides, load_toml};

#[derive(Parser)]
#[command(author, version, about = "Bring up a WineASIO guest session against a native host subprocess")]
struct Cli {
    /// Optional TOML file overriding the default session configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Native session host binary to spawn.
    #[arg(long, default_value = "wineasio-native-host")]
    native_host: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_toml(path)?,
        None => wineasio_proto::SessionConfig::default().normalized(),
    };
    let config = apply_env_overrides(config);

    let transport = ProcessTransport::spawn(&cli.native_host)
        .with_context(|| format!("spawning native session host {}", cli.native_host))?;
    let mut object = DriverObject::new(transport);

    if !object.init(config) {
        anyhow::bail!("native session host refused Init");
    }

    let (num_inputs, num_outputs) =
        object.get_channels().map_err(|status| anyhow::anyhow!("GetChannels failed: {status:?}"))?;
    let sample_rate =
        object.get_sample_rate().map_err(|status| anyhow::anyhow!("GetSampleRate failed: {status:?}"))?;
    info!(num_inputs, num_outputs, sample_rate, "session initialised");

    object.release();
    Ok(())
}
