//! Clusters.

use serde::{Deserialize, Serialize};

use super::{EntityKind, Stats, UniverseEntity};
use crate::keys::ClusterKey;

/// A cluster as published in one dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster coordinate.
    pub key: ClusterKey,
    /// Member planet count.
    #[serde(default)]
    pub members: u32,
    /// Statistics.
    pub stats: Stats,
}

impl Cluster {
    /// Create a cluster with the given statistics.
    #[must_use]
    pub fn new(key: ClusterKey, stats: Stats) -> Self {
        Self {
            key,
            members: 0,
            stats,
        }
    }
}

impl UniverseEntity for Cluster {
    type Key = ClusterKey;
    const KIND: EntityKind = EntityKind::Cluster;

    fn key(&self) -> ClusterKey {
        self.key
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
