//! Entry point for the native-side subprocess: one JACK-backed session,
//! driven entirely over stdin/stdout by whatever spawned it (normally the
//! guest driver object's transport client).

use std::io;

use tracing_subscriber::EnvFilter;
use wineasio_native::{server, JackBackend};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    server::run::<JackBackend, _, _>(stdin.lock(), stdout.lock())?;
    Ok(())
}
