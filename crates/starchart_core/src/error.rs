//! Error types for the universe store.

use thiserror::Error;

use crate::entities::EntityKind;
use crate::tick::TickId;

/// Result type alias using [`StarchartError`].
pub type Result<T> = std::result::Result<T, StarchartError>;

/// Top-level error type for every query and write path.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StarchartError {
    /// A key or key/tick pair did not resolve under the lookup policy.
    #[error("{kind} {key} not found{}", .tick.map(|t| format!(" at tick {t}")).unwrap_or_default())]
    NotFound {
        /// Entity kind that was searched.
        kind: EntityKind,
        /// Rendered natural key (or search text).
        key: String,
        /// Requested tick, for history lookups.
        tick: Option<TickId>,
    },

    /// A natural key has a missing or zero component, or repeats inside one dump.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A formula hit a zero denominator.
    #[error("Division undefined: {0} is zero")]
    DivisionUndefined(&'static str),

    /// A second write for an existing tick, or for an existing `(key, tick)` pair.
    #[error("Duplicate tick {tick}: {what}")]
    DuplicateTick {
        /// Tick that already holds the record.
        tick: TickId,
        /// What was duplicated.
        what: String,
    },

    /// A required configuration value is absent.
    #[error("Missing configuration value: {0}")]
    ConfigMissing(String),

    /// A configuration value is present but unusable.
    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    /// A rank table lists the same entity twice.
    #[error("Invalid ranking: {0}")]
    InvalidRanking(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Archive serialization or file access failed.
    #[error("Archive error: {0}")]
    Archive(String),
}

impl StarchartError {
    /// Build a [`StarchartError::NotFound`] for a rendered key.
    pub fn not_found(kind: EntityKind, key: impl ToString, tick: Option<TickId>) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
            tick,
        }
    }

    /// Returns true for the not-found family of errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_includes_tick() {
        let err = StarchartError::not_found(EntityKind::Planet, "1:2:3", Some(40));
        assert_eq!(err.to_string(), "planet 1:2:3 not found at tick 40");

        let err = StarchartError::not_found(EntityKind::Galaxy, "1:2", None);
        assert_eq!(err.to_string(), "galaxy 1:2 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_tick_message() {
        let err = StarchartError::DuplicateTick {
            tick: 7,
            what: "planet 1:1:1 snapshot".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate tick 7: planet 1:1:1 snapshot");
    }
}
