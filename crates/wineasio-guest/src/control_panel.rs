//! Launches the external settings tool the way the original does: try
//! `PATH`, then two fixed absolute fallbacks, and never wait for it (§6
//! "Control-panel action").

use std::process::{Command, Stdio};

use tracing::warn;

const CANDIDATES: [&str; 3] =
    ["wineasio-settings", "/usr/bin/wineasio-settings", "/usr/local/bin/wineasio-settings"];

/// Spawns the first candidate that launches successfully and does not wait
/// for it. Returns `true` iff some candidate was spawned.
pub fn launch() -> bool {
    for candidate in CANDIDATES {
        match Command::new(candidate).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
            Ok(child) => {
                drop(child);
                return true;
            }
            Err(_) => continue,
        }
    }
    warn!("no wineasio-settings binary found on PATH or in the fixed fallback locations");
    false
}
