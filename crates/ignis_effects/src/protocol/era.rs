//! Server protocol revision and the packet layout era it selects.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{EffectError, EffectResult};
use crate::host::ProtocolSource;

/// Packet layout generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolEra {
    /// Textual identity, no long-distance field (minor < 8).
    Legacy,
    /// Numeric identity, long-distance flag, integer data array (minor >= 8).
    Modern,
}

impl ProtocolEra {
    /// First minor version using the modern layout.
    pub const MODERN_THRESHOLD: u8 = 8;

    /// Era for a protocol minor version.
    #[inline]
    #[must_use]
    pub const fn for_minor(minor: u8) -> Self {
        if minor < Self::MODERN_THRESHOLD {
            Self::Legacy
        } else {
            Self::Modern
        }
    }
}

/// Parsed server protocol revision, e.g. `v1_8_R3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerVersion {
    minor: u8,
    revision: u8,
}

impl ServerVersion {
    /// Oldest recognized minor version.
    pub const MIN_MINOR: u8 = 5;
    /// Newest recognized minor version.
    pub const MAX_MINOR: u8 = 12;

    /// Creates a version, rejecting minors outside the recognized range.
    ///
    /// # Errors
    ///
    /// `UnsupportedProtocolVersion` for an unrecognized minor version.
    pub fn new(minor: u8, revision: u8) -> EffectResult<Self> {
        if !(Self::MIN_MINOR..=Self::MAX_MINOR).contains(&minor) {
            return Err(EffectError::UnsupportedProtocolVersion(format!(
                "1.{minor} is outside 1.{}..=1.{}",
                Self::MIN_MINOR,
                Self::MAX_MINOR
            )));
        }
        Ok(Self { minor, revision })
    }

    /// Parses a revision string such as `v1_8_R3`.
    ///
    /// A dotted package prefix (`org.example.server.v1_8_R3`) is ignored.
    ///
    /// # Errors
    ///
    /// `UnsupportedProtocolVersion` when the string is malformed or names an
    /// unrecognized version.
    pub fn parse(text: &str) -> EffectResult<Self> {
        let malformed = || EffectError::UnsupportedProtocolVersion(text.to_owned());

        let tail = text.rsplit('.').next().unwrap_or(text);
        let mut parts = tail.strip_prefix('v').ok_or_else(malformed)?.split('_');

        let major = parts.next().ok_or_else(malformed)?;
        let minor = parts.next().ok_or_else(malformed)?;
        let revision = parts.next().ok_or_else(malformed)?;
        if major != "1" || parts.next().is_some() {
            return Err(malformed());
        }

        let minor: u8 = minor.parse().map_err(|_| malformed())?;
        let revision: u8 = revision
            .strip_prefix('R')
            .and_then(|r| r.parse().ok())
            .ok_or_else(malformed)?;

        Self::new(minor, revision)
    }

    /// Minor protocol version (the `8` in `v1_8_R3`).
    #[inline]
    #[must_use]
    pub const fn minor(&self) -> u8 {
        self.minor
    }

    /// Revision number (the `3` in `v1_8_R3`).
    #[inline]
    #[must_use]
    pub const fn revision(&self) -> u8 {
        self.revision
    }

    /// Packet layout era for this version.
    #[inline]
    #[must_use]
    pub const fn era(&self) -> ProtocolEra {
        ProtocolEra::for_minor(self.minor)
    }
}

impl FromStr for ServerVersion {
    type Err = EffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v1_{}_R{}", self.minor, self.revision)
    }
}

/// One-time lazy version detection.
///
/// The first call asks the [`ProtocolSource`]; the outcome, success or
/// failure, is kept for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct VersionCache {
    detected: OnceLock<EffectResult<ServerVersion>>,
}

impl VersionCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            detected: OnceLock::new(),
        }
    }

    /// Creates a cache that already holds `version`.
    #[must_use]
    pub fn preset(version: ServerVersion) -> Self {
        Self {
            detected: OnceLock::from(Ok(version)),
        }
    }

    /// Returns the cached version, detecting it on first use.
    ///
    /// # Errors
    ///
    /// `UnsupportedProtocolVersion` when the source has no revision or it
    /// does not parse.
    pub fn get_or_detect(&self, source: &dyn ProtocolSource) -> EffectResult<ServerVersion> {
        self.detected
            .get_or_init(|| {
                let detected = source
                    .server_revision()
                    .ok_or_else(|| {
                        EffectError::UnsupportedProtocolVersion("server revision unavailable".into())
                    })
                    .and_then(|revision| ServerVersion::parse(&revision));
                match &detected {
                    Ok(version) => tracing::info!(%version, era = ?version.era(), "detected server protocol"),
                    Err(err) => tracing::error!(%err, "server protocol detection failed"),
                }
                detected
            })
            .clone()
    }

    /// The cached outcome, if detection already ran.
    #[must_use]
    pub fn cached(&self) -> Option<&EffectResult<ServerVersion>> {
        self.detected.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FixedRevision;

    #[test]
    fn test_parse_revision() {
        let version = ServerVersion::parse("v1_8_R3").unwrap();
        assert_eq!(version.minor(), 8);
        assert_eq!(version.revision(), 3);
        assert_eq!(version.era(), ProtocolEra::Modern);
        assert_eq!(version.to_string(), "v1_8_R3");

        let legacy: ServerVersion = "org.example.server.v1_7_R4".parse().unwrap();
        assert_eq!(legacy.era(), ProtocolEra::Legacy);

        let double_digit = ServerVersion::parse("v1_12_R1").unwrap();
        assert_eq!(double_digit.minor(), 12);
    }

    #[test]
    fn test_parse_rejects() {
        for text in ["", "1_8_R3", "v2_8_R1", "v1_8", "v1_x_R1", "v1_8_3", "v1_4_R1", "v1_13_R1"] {
            assert!(
                matches!(
                    ServerVersion::parse(text),
                    Err(EffectError::UnsupportedProtocolVersion(_))
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn test_era_threshold() {
        assert_eq!(ProtocolEra::for_minor(7), ProtocolEra::Legacy);
        assert_eq!(ProtocolEra::for_minor(8), ProtocolEra::Modern);
    }

    #[test]
    fn test_cache_detects_once() {
        let source = FixedRevision::new("v1_9_R2");
        let cache = VersionCache::new();
        assert!(cache.cached().is_none());
        assert_eq!(cache.get_or_detect(&source).unwrap().minor(), 9);
        assert_eq!(cache.get_or_detect(&source).unwrap().minor(), 9);
        assert_eq!(source.queries(), 1);
    }

    #[test]
    fn test_preset_skips_detection() {
        let version = ServerVersion::parse("v1_10_R1").unwrap();
        let cache = VersionCache::preset(version);
        assert_eq!(cache.cached(), Some(&Ok(version)));

        let source = FixedRevision::new("v1_7_R4");
        assert_eq!(cache.get_or_detect(&source).unwrap(), version);
        assert_eq!(source.queries(), 0);
    }

    #[test]
    fn test_cache_keeps_failure() {
        let source = FixedRevision::unavailable();
        let cache = VersionCache::new();
        assert!(cache.get_or_detect(&source).is_err());
        assert!(cache.get_or_detect(&source).is_err());
        assert_eq!(source.queries(), 1);
    }
}
