//! Entity types tracked per tick.
//!
//! Every entity type carries the shared [`Stats`] block and a natural key.
//! The statistics are produced by the ingestion and stored as opaque
//! numbers; nothing here recomputes growth or rank columns.

mod alliance;
mod cluster;
mod galaxy;
mod planet;
mod stats;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::keys::NaturalKey;

pub use alliance::Alliance;
pub use cluster::Cluster;
pub use galaxy::Galaxy;
pub use planet::{Planet, PlanetFlag, PlanetId};
pub use stats::{Extremum, RoidTotals, StatLine, Stats};

/// The four entity types of the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A cluster of galaxies (`x`).
    Cluster,
    /// A galaxy of planets (`x:y`).
    Galaxy,
    /// A single planet (`x:y:z`).
    Planet,
    /// A player alliance (by name).
    Alliance,
}

impl EntityKind {
    /// Lower-case name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Galaxy => "galaxy",
            Self::Planet => "planet",
            Self::Alliance => "alliance",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common interface of every entity state stored in a catalog or history.
pub trait UniverseEntity: Clone + fmt::Debug + Serialize + DeserializeOwned {
    /// Natural key type.
    type Key: NaturalKey;

    /// Entity kind tag.
    const KIND: EntityKind;

    /// Natural key of this state.
    fn key(&self) -> Self::Key;

    /// Shared statistics block.
    fn stats(&self) -> &Stats;

    /// Stable identity that survives a key change, if the type has one.
    ///
    /// Planets keep their id when they relocate; other types are identified
    /// by key alone.
    fn identity(&self) -> Option<&str> {
        None
    }
}
