//! TOML/environment front-end for [`SessionConfig`] (§10.3): reading the
//! real `Software\Wine\WineASIO` registry subtree is out of scope, but a
//! thin CLI or demo binary still needs *some* way to hand the core a
//! config. This is that front-end, not part of the core contract itself.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use wineasio_proto::SessionConfig;

/// Mirrors the six registry keys from §6's configuration table one field at
/// a time, each optional so a partial file only overrides what it names.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    num_inputs: Option<i32>,
    num_outputs: Option<i32>,
    preferred_bufsize: Option<i32>,
    fixed_bufsize: Option<bool>,
    autoconnect: Option<bool>,
    client_name: Option<String>,
}

impl FileConfig {
    fn apply(self, base: SessionConfig) -> SessionConfig {
        SessionConfig {
            num_inputs: self.num_inputs.unwrap_or(base.num_inputs),
            num_outputs: self.num_outputs.unwrap_or(base.num_outputs),
            preferred_bufsize: self.preferred_bufsize.unwrap_or(base.preferred_bufsize),
            fixed_bufsize: self.fixed_bufsize.unwrap_or(base.fixed_bufsize),
            autoconnect: self.autoconnect.unwrap_or(base.autoconnect),
            client_name: self.client_name.unwrap_or(base.client_name),
        }
    }
}

/// Loads a [`SessionConfig`] from a TOML file, falling back to
/// [`SessionConfig::default`] for any field the file doesn't mention.
pub fn load_toml(path: &Path) -> Result<SessionConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let file: FileConfig = toml::from_str(&text)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    Ok(file.apply(SessionConfig::default()).normalized())
}

/// Overrides a config from a handful of `WINEASIO_*` environment variables,
/// the way the teacher's CLI layers environment overrides on top of a file.
pub fn apply_env_overrides(mut config: SessionConfig) -> SessionConfig {
    if let Ok(v) = std::env::var("WINEASIO_NUM_INPUTS") {
        if let Ok(n) = v.parse() {
            config.num_inputs = n;
        }
    }
    if let Ok(v) = std::env::var("WINEASIO_NUM_OUTPUTS") {
        if let Ok(n) = v.parse() {
            config.num_outputs = n;
        }
    }
    if let Ok(v) = std::env::var("WINEASIO_CLIENT_NAME") {
        config.client_name = v;
    }
    config.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "num_inputs = 4\nclient_name = \"Test\"").unwrap();

        let config = load_toml(file.path()).unwrap();
        assert_eq!(config.num_inputs, 4);
        assert_eq!(config.client_name, "Test");
        assert_eq!(config.num_outputs, SessionConfig::default().num_outputs);
    }

    #[test]
    fn env_override_replaces_client_name() {
        std::env::set_var("WINEASIO_CLIENT_NAME", "EnvName");
        let config = apply_env_overrides(SessionConfig::default());
        assert_eq!(config.client_name, "EnvName");
        std::env::remove_var("WINEASIO_CLIENT_NAME");
    }
}
