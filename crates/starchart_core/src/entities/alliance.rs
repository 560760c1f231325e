//! Alliances.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EntityKind, StatLine, Stats, UniverseEntity};
use crate::keys::AllianceKey;

/// An alliance as published in one dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alliance {
    /// Alliance name.
    pub name: AllianceKey,
    /// Short alias used for fuzzy lookups.
    #[serde(default)]
    pub alias: Option<String>,
    /// Member count and rank.
    #[serde(default)]
    pub members: StatLine,
    /// Alliance points.
    #[serde(default)]
    pub points: StatLine,
    /// Average size per member.
    #[serde(default)]
    pub size_avg: StatLine,
    /// Average score per member.
    #[serde(default)]
    pub score_avg: StatLine,
    /// Statistics.
    pub stats: Stats,
}

impl Alliance {
    /// Create an alliance with the given statistics.
    #[must_use]
    pub fn new(name: AllianceKey, alias: Option<String>, stats: Stats) -> Self {
        Self {
            name,
            alias,
            members: StatLine::default(),
            points: StatLine::default(),
            size_avg: StatLine::default(),
            score_avg: StatLine::default(),
            stats,
        }
    }
}

impl UniverseEntity for Alliance {
    type Key = AllianceKey;
    const KIND: EntityKind = EntityKind::Alliance;

    fn key(&self) -> AllianceKey {
        self.name.clone()
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' Members: {} ({}) Score: {} ({}) Avg: {} ({}) Points: {} ({}) Size: {} ({}) Avg: {} ({})",
            self.name,
            self.members.amount,
            self.members.rank,
            self.stats.score.amount,
            self.stats.score.rank,
            self.score_avg.amount,
            self.score_avg.rank,
            self.points.amount,
            self.points.rank,
            self.stats.size.amount,
            self.stats.size.rank,
            self.size_avg.amount,
            self.size_avg.rank
        )
    }
}
