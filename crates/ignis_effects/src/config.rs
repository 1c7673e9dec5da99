//! # Engine Configuration
//!
//! TOML configuration loaded once at startup.
//!
//! ```toml
//! tick_rate = 20
//! sink_queue_capacity = 1024
//! server_revision = "v1_8_R3"   # optional, skips detection
//! default_view_range = 64.0
//! ```
//!
//! Every key is optional.

use std::path::Path;

use ignis_shared::TICK_RATE;
use serde::{Deserialize, Serialize};

use crate::error::{EffectError, EffectResult};
use crate::protocol::ServerVersion;

fn default_tick_rate() -> u32 {
    TICK_RATE
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_view_range() -> f64 {
    64.0
}

/// Engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Scheduler ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Capacity of the outbound packet queue.
    #[serde(default = "default_queue_capacity")]
    pub sink_queue_capacity: usize,
    /// Fixed protocol revision instead of asking the host.
    #[serde(default)]
    pub server_revision: Option<String>,
    /// Audience radius for the demo server's emitters.
    #[serde(default = "default_view_range")]
    pub default_view_range: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            sink_queue_capacity: default_queue_capacity(),
            server_revision: None,
            default_view_range: default_view_range(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> EffectResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| EffectError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> EffectResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EffectError::InvalidConfig(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "engine configuration loaded");
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first bad key.
    pub fn validate(&self) -> EffectResult<()> {
        if !(1..=1000).contains(&self.tick_rate) {
            return Err(EffectError::InvalidConfig(format!(
                "tick_rate {} is outside 1..=1000",
                self.tick_rate
            )));
        }
        if self.sink_queue_capacity == 0 {
            return Err(EffectError::InvalidConfig(
                "sink_queue_capacity must be at least 1".into(),
            ));
        }
        if !self.default_view_range.is_finite() || self.default_view_range < 0.0 {
            return Err(EffectError::InvalidConfig(format!(
                "default_view_range {} is not a finite value >= 0",
                self.default_view_range
            )));
        }
        self.server_version()?;
        Ok(())
    }

    /// The configured revision override, parsed.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the override does not parse.
    pub fn server_version(&self) -> EffectResult<Option<ServerVersion>> {
        self.server_revision
            .as_deref()
            .map(|text| {
                ServerVersion::parse(text)
                    .map_err(|e| EffectError::InvalidConfig(format!("server_revision: {e}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.tick_rate, 20);
        assert_eq!(config.server_version().unwrap(), None);
    }

    #[test]
    fn test_full_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            tick_rate = 40
            sink_queue_capacity = 16
            server_revision = "v1_9_R2"
            default_view_range = 32.5
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_rate, 40);
        assert_eq!(config.sink_queue_capacity, 16);
        assert_eq!(config.server_version().unwrap().unwrap().minor(), 9);
        assert_eq!(config.default_view_range, 32.5);
    }

    #[test]
    fn test_rejects_bad_values() {
        for text in [
            "tick_rate = 0",
            "sink_queue_capacity = 0",
            "default_view_range = -1.0",
            "server_revision = \"v1_20_R1\"",
            "unknown_key = 1",
            "tick_rate = \"fast\"",
        ] {
            assert!(
                matches!(EngineConfig::from_toml_str(text), Err(EffectError::InvalidConfig(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/ignis.toml").unwrap_err();
        assert!(matches!(err, EffectError::InvalidConfig(msg) if msg.contains("ignis.toml")));
    }
}
