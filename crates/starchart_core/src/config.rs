//! Game constants and access levels.
//!
//! Loaded once from a RON file at process start and immutable afterwards.
//!
//! ```ron
//! (
//!     roids: (max_capture_rate: 0.25, min_capture_rate: 0.12),
//!     numbers: (resource_cap_per_agent: 50000),
//!     access: {"galmate": 0, "member": 100, "admin": 1000},
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarchartError};

/// Access level every registered user gets without an explicit grant.
pub const BASE_LEVEL: &str = "galmate";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRoids {
    max_capture_rate: Option<f64>,
    min_capture_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNumbers {
    resource_cap_per_agent: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    roids: Option<RawRoids>,
    numbers: Option<RawNumbers>,
    access: Option<BTreeMap<String, u32>>,
}

/// Constants consumed by the combat formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureConstants {
    /// Lowest capture rate an attack can be clamped to.
    pub min_capture_rate: f64,
    /// Capture rate against an equal-value target, and the upper clamp.
    pub max_capture_rate: f64,
    /// Upper bound on resources stolen per agent.
    pub resource_cap_per_agent: i64,
}

impl CaptureConstants {
    /// Check that the constants are usable.
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("roids.min_capture_rate", self.min_capture_rate),
            ("roids.max_capture_rate", self.max_capture_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(StarchartError::InvalidConfig(format!(
                    "{name} must be in (0, 1], got {rate}"
                )));
            }
        }
        if self.min_capture_rate > self.max_capture_rate {
            return Err(StarchartError::InvalidConfig(format!(
                "roids.min_capture_rate ({}) exceeds roids.max_capture_rate ({})",
                self.min_capture_rate, self.max_capture_rate
            )));
        }
        if self.resource_cap_per_agent < 0 {
            return Err(StarchartError::InvalidConfig(format!(
                "numbers.resource_cap_per_agent must not be negative, got {}",
                self.resource_cap_per_agent
            )));
        }
        Ok(())
    }
}

/// Fixed table of named access levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLevels {
    levels: BTreeMap<String, u32>,
}

impl AccessLevels {
    /// Build the table from `name -> threshold` pairs.
    #[must_use]
    pub fn new(levels: impl IntoIterator<Item = (String, u32)>) -> Self {
        Self {
            levels: levels
                .into_iter()
                .map(|(name, threshold)| (name.to_lowercase(), threshold))
                .collect(),
        }
    }

    /// Threshold of a named level.
    pub fn threshold(&self, level: &str) -> Result<u32> {
        self.levels
            .get(&level.to_lowercase())
            .copied()
            .ok_or_else(|| StarchartError::ConfigMissing(format!("access.{level}")))
    }

    /// Whether a user with `user_level` meets the named level.
    pub fn has_access(&self, user_level: u32, level: &str) -> Result<bool> {
        Ok(user_level >= self.threshold(level)?)
    }

    /// Highest named level a user reaches.
    ///
    /// The base level is only reported when nothing else matches.
    #[must_use]
    pub fn level_name(&self, user_level: u32) -> &str {
        self.levels
            .iter()
            .filter(|(name, _)| name.as_str() != BASE_LEVEL)
            .filter(|&(_, threshold)| user_level >= *threshold)
            .max_by_key(|&(_, threshold)| *threshold)
            .map_or(BASE_LEVEL, |(name, _)| name.as_str())
    }

    /// Iterate over `(name, threshold)` pairs by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.levels.iter().map(|(name, &threshold)| (name.as_str(), threshold))
    }
}

/// Immutable process-wide constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConstants {
    /// Combat formula constants.
    pub capture: CaptureConstants,
    /// Access level table.
    pub access: AccessLevels,
}

impl GameConstants {
    /// Load constants from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| StarchartError::DataParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let constants = Self::parse(&contents, &path.display().to_string())?;
        tracing::info!(path = %path.display(), "Loaded game constants");
        Ok(constants)
    }

    /// Parse constants from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Self::parse(ron, "<inline>")
    }

    fn parse(ron: &str, origin: &str) -> Result<Self> {
        let raw: RawConfig = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(ron)
            .map_err(|e| StarchartError::DataParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        let roids = raw
            .roids
            .ok_or_else(|| StarchartError::ConfigMissing("roids".to_string()))?;
        let numbers = raw
            .numbers
            .ok_or_else(|| StarchartError::ConfigMissing("numbers".to_string()))?;

        let capture = CaptureConstants {
            max_capture_rate: roids.max_capture_rate.ok_or_else(|| {
                StarchartError::ConfigMissing("roids.max_capture_rate".to_string())
            })?,
            min_capture_rate: roids.min_capture_rate.ok_or_else(|| {
                StarchartError::ConfigMissing("roids.min_capture_rate".to_string())
            })?,
            resource_cap_per_agent: numbers.resource_cap_per_agent.ok_or_else(|| {
                StarchartError::ConfigMissing("numbers.resource_cap_per_agent".to_string())
            })?,
        };
        capture.validate()?;

        Ok(Self {
            capture,
            access: AccessLevels::new(raw.access.unwrap_or_default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"(
        roids: (max_capture_rate: 0.25, min_capture_rate: 0.12),
        numbers: (resource_cap_per_agent: 50000),
        access: {"galmate": 0, "member": 100, "dc": 500, "admin": 1000},
    )"#;

    #[test]
    fn test_full_config_parses() {
        let constants = GameConstants::from_ron_str(FULL).unwrap();
        assert!((constants.capture.max_capture_rate - 0.25).abs() < f64::EPSILON);
        assert!((constants.capture.min_capture_rate - 0.12).abs() < f64::EPSILON);
        assert_eq!(constants.capture.resource_cap_per_agent, 50_000);
        assert_eq!(constants.access.threshold("DC").unwrap(), 500);
    }

    #[test]
    fn test_missing_constant_is_config_missing() {
        let ron = "(roids: (max_capture_rate: 0.25), numbers: (resource_cap_per_agent: 1))";
        assert_eq!(
            GameConstants::from_ron_str(ron).unwrap_err(),
            StarchartError::ConfigMissing("roids.min_capture_rate".to_string())
        );

        let ron = "(roids: (max_capture_rate: 0.25, min_capture_rate: 0.1))";
        assert_eq!(
            GameConstants::from_ron_str(ron).unwrap_err(),
            StarchartError::ConfigMissing("numbers".to_string())
        );
    }

    #[test]
    fn test_inverted_rates_rejected() {
        let ron = "(roids: (max_capture_rate: 0.1, min_capture_rate: 0.2), numbers: (resource_cap_per_agent: 1))";
        assert!(matches!(
            GameConstants::from_ron_str(ron),
            Err(StarchartError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_ron_is_parse_error() {
        assert!(matches!(
            GameConstants::from_ron_str("(roids: ["),
            Err(StarchartError::DataParseError { .. })
        ));
    }

    #[test]
    fn test_access_checks() {
        let access = GameConstants::from_ron_str(FULL).unwrap().access;
        assert!(access.has_access(100, "member").unwrap());
        assert!(!access.has_access(99, "member").unwrap());
        assert!(access.has_access(0, "galmate").unwrap());
        assert_eq!(
            access.has_access(5000, "emperor").unwrap_err(),
            StarchartError::ConfigMissing("access.emperor".to_string())
        );
    }

    #[test]
    fn test_level_name_picks_highest_reached() {
        let access = GameConstants::from_ron_str(FULL).unwrap().access;
        assert_eq!(access.level_name(750), "dc");
        assert_eq!(access.level_name(1000), "admin");
        assert_eq!(access.level_name(3), "galmate");
    }
}
