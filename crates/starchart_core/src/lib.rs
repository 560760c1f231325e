//! # Starchart Core
//!
//! Tick-by-tick store of a space-strategy universe: clusters, galaxies,
//! planets and alliances as they looked at every ingested tick.
//!
//! This crate contains the whole core:
//! - No rendering
//! - No network IO
//! - No system randomness
//!
//! Reads are synchronous and pure given the stored state. The only write
//! path is [`universe::Universe::ingest`], which applies one complete tick
//! or nothing.
//!
//! ## Crate Structure
//!
//! - [`tick`] - Tick records and the tick clock
//! - [`catalog`] - Current records with active/retired resolution
//! - [`history`] - Per-tick snapshots and the point-in-time resolver
//! - [`repository`] - Typed read access per entity type
//! - [`movement`] - Planet movement ledger and planet events
//! - [`combat`] - Combat-balance formulas
//! - [`ranking`] - Atomically swapped rank tables
//! - [`universe`] - Ingestion facade and cross-type queries
//! - [`archive`] - Versioned on-disk archive

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archive;
pub mod catalog;
pub mod combat;
pub mod config;
pub mod entities;
pub mod error;
pub mod history;
pub mod keys;
pub mod movement;
pub mod ranking;
pub mod repository;
pub mod tick;
pub mod universe;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archive::{Archive, ArchiveRef, ARCHIVE_VERSION};
    pub use crate::catalog::{Catalog, Record, RecordId};
    pub use crate::combat::{CombatMetrics, Combatant};
    pub use crate::config::{AccessLevels, CaptureConstants, GameConstants};
    pub use crate::entities::{
        Alliance, Cluster, EntityKind, Galaxy, Planet, PlanetFlag, PlanetId, StatLine, Stats,
        UniverseEntity,
    };
    pub use crate::error::{Result, StarchartError};
    pub use crate::history::{History, LookupMode, Snapshot};
    pub use crate::keys::{AllianceKey, ClusterKey, GalaxyKey, NaturalKey, PlanetKey};
    pub use crate::movement::{MovementLedger, MovementRecord, PlanetEvent, PlanetEventKind};
    pub use crate::ranking::{EntityRef, RankEntry, RankSnapshot, RankTable, RankingCache};
    pub use crate::repository::Repository;
    pub use crate::tick::{TickClock, TickId, TickRecord};
    pub use crate::universe::{
        IngestSummary, PurgeSummary, RankedKey, RankingDump, TickDump, Universe, UniverseRecord,
    };
}
