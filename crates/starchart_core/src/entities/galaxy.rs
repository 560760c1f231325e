//! Galaxies.

use serde::{Deserialize, Serialize};

use super::{EntityKind, StatLine, Stats, UniverseEntity};
use crate::keys::GalaxyKey;

/// A galaxy as published in one dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Galaxy {
    /// Coordinates.
    pub key: GalaxyKey,
    /// Galaxy name.
    pub name: String,
    /// Member planet count.
    #[serde(default)]
    pub members: u32,
    /// Whether the galaxy is a private galaxy.
    #[serde(default)]
    pub private: bool,
    /// Score excluding bonus points.
    #[serde(default)]
    pub real_score: StatLine,
    /// Statistics.
    pub stats: Stats,
}

impl Galaxy {
    /// Create a galaxy with the given statistics.
    pub fn new(key: GalaxyKey, name: impl Into<String>, stats: Stats) -> Self {
        Self {
            key,
            name: name.into(),
            members: 0,
            private: false,
            real_score: StatLine::default(),
            stats,
        }
    }

    /// `"x:y 'name' (planets) Score: ..."`.
    #[must_use]
    pub fn summary(&self, active_planets: usize) -> String {
        format!(
            "{} '{}' ({}) {}",
            self.key,
            self.name,
            active_planets,
            self.stats.headline()
        )
    }
}

impl UniverseEntity for Galaxy {
    type Key = GalaxyKey;
    const KIND: EntityKind = EntityKind::Galaxy;

    fn key(&self) -> GalaxyKey {
        self.key
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_includes_planet_count() {
        let galaxy = Galaxy::new(
            GalaxyKey { x: 4, y: 9 },
            "Rust Belt",
            Stats::new(800, 90_000, 70_000, 1_200),
        );
        assert_eq!(
            galaxy.summary(7),
            "4:9 'Rust Belt' (7) Score: 90000 (0) Value: 70000 (0) Size: 800 (0) XP: 1200 (0)"
        );
    }
}
