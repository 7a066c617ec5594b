use serde::{Deserialize, Serialize};

use crate::MAX_CHANNELS;

/// The six configuration values the original reads from
/// `Software\Wine\WineASIO`. Reading them from a registry, config file, or
/// environment is an external concern; this type is just the clamped
/// snapshot the core accepts at `Init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub num_inputs: i32,
    pub num_outputs: i32,
    pub preferred_bufsize: i32,
    pub fixed_bufsize: bool,
    pub autoconnect: bool,
    pub client_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            num_inputs: 16,
            num_outputs: 16,
            preferred_bufsize: 1024,
            fixed_bufsize: false,
            autoconnect: true,
            client_name: "WineASIO".to_string(),
        }
    }
}

impl SessionConfig {
    /// Applies the same clamping the original `asio_init` performs: channel
    /// counts default to 2 when non-positive and are capped at
    /// [`MAX_CHANNELS`]; the preferred buffer size defaults to 1024 when
    /// non-positive; the client name defaults to "WineASIO" when empty and
    /// is truncated to 63 bytes otherwise.
    pub fn normalized(mut self) -> Self {
        if self.num_inputs <= 0 {
            self.num_inputs = 2;
        }
        self.num_inputs = self.num_inputs.min(MAX_CHANNELS as i32);

        if self.num_outputs <= 0 {
            self.num_outputs = 2;
        }
        self.num_outputs = self.num_outputs.min(MAX_CHANNELS as i32);

        if self.preferred_bufsize <= 0 {
            self.preferred_bufsize = 1024;
        }

        if self.client_name.trim().is_empty() {
            self.client_name = "WineASIO".to_string();
        } else if self.client_name.len() > 63 {
            self.client_name.truncate(63);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.num_inputs, 16);
        assert_eq!(cfg.num_outputs, 16);
        assert_eq!(cfg.preferred_bufsize, 1024);
        assert!(!cfg.fixed_bufsize);
        assert!(cfg.autoconnect);
        assert_eq!(cfg.client_name, "WineASIO");
    }

    #[test]
    fn channel_counts_are_clamped_and_defaulted() {
        let cfg = SessionConfig {
            num_inputs: 0,
            num_outputs: 9001,
            ..SessionConfig::default()
        }
        .normalized();
        assert_eq!(cfg.num_inputs, 2);
        assert_eq!(cfg.num_outputs, MAX_CHANNELS as i32);
    }

    #[test]
    fn client_name_defaults_when_blank_and_truncates_when_long() {
        let blank = SessionConfig { client_name: "   ".into(), ..SessionConfig::default() }.normalized();
        assert_eq!(blank.client_name, "WineASIO");

        let long_name = "x".repeat(200);
        let truncated = SessionConfig { client_name: long_name, ..SessionConfig::default() }.normalized();
        assert_eq!(truncated.client_name.len(), 63);
    }
}
