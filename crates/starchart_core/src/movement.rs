//! Planet movement ledger and per-tick planet events.
//!
//! The ingestion writes one movement row per planet per tick whenever it
//! considers the planet moved. Rows whose old and new coordinates are equal
//! are kept as written and filtered out when counting relocations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::PlanetId;
use crate::error::{Result, StarchartError};
use crate::keys::{GalaxyKey, PlanetKey};
use crate::tick::TickId;

/// One planet coordinate change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Tick the move was observed at.
    pub tick: TickId,
    /// Planet that moved.
    pub planet: PlanetId,
    /// Coordinates before the move; `None` when the planet appeared.
    pub old: Option<PlanetKey>,
    /// Coordinates after the move; `None` when the planet left the universe.
    pub new: Option<PlanetKey>,
}

impl MovementRecord {
    /// A move between two known coordinates.
    #[must_use]
    pub fn moved(tick: TickId, planet: PlanetId, old: PlanetKey, new: PlanetKey) -> Self {
        Self {
            tick,
            planet,
            old: Some(old),
            new: Some(new),
        }
    }

    /// True when both ends are known and differ.
    #[must_use]
    pub fn is_relocation(&self) -> bool {
        matches!((self.old, self.new), (Some(old), Some(new)) if old != new)
    }

    fn touches(&self, galaxy: GalaxyKey) -> bool {
        self.old.is_some_and(|key| key.galaxy() == galaxy)
            || self.new.is_some_and(|key| key.galaxy() == galaxy)
    }
}

/// Kind of per-tick planet event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanetEventKind {
    /// The planet stayed idle; `amount` is the idle streak length.
    Idle,
    /// Value dropped; `amount` is the value difference.
    ValueDrop,
    /// Roids were gained; `amount` is the roid difference.
    Landing,
    /// Roids were lost; `amount` is the roid difference.
    LandedOn,
}

/// A planet event observed by the ingestion at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetEvent {
    /// Tick of the event.
    pub tick: TickId,
    /// Planet concerned.
    pub planet: PlanetId,
    /// What happened.
    pub kind: PlanetEventKind,
    /// Event magnitude.
    pub amount: i64,
}

/// Per-tick movement rows and planet events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementLedger {
    movements: BTreeMap<TickId, BTreeMap<PlanetId, MovementRecord>>,
    events: BTreeMap<TickId, BTreeMap<(PlanetId, PlanetEventKind), PlanetEvent>>,
}

impl MovementLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if a movement row already exists for this planet and tick.
    pub fn check_movement(&self, record: &MovementRecord) -> Result<()> {
        if self
            .movements
            .get(&record.tick)
            .is_some_and(|rows| rows.contains_key(&record.planet))
        {
            return Err(StarchartError::DuplicateTick {
                tick: record.tick,
                what: format!("movement of planet {}", record.planet),
            });
        }
        Ok(())
    }

    /// Append a movement row.
    pub fn record_movement(&mut self, record: MovementRecord) -> Result<()> {
        self.check_movement(&record)?;
        self.movements
            .entry(record.tick)
            .or_default()
            .insert(record.planet.clone(), record);
        Ok(())
    }

    /// Fail if an event of the same kind already exists for this planet and tick.
    pub fn check_event(&self, event: &PlanetEvent) -> Result<()> {
        if self
            .events
            .get(&event.tick)
            .is_some_and(|rows| rows.contains_key(&(event.planet.clone(), event.kind)))
        {
            return Err(StarchartError::DuplicateTick {
                tick: event.tick,
                what: format!("{:?} event of planet {}", event.kind, event.planet),
            });
        }
        Ok(())
    }

    /// Append a planet event.
    pub fn record_event(&mut self, event: PlanetEvent) -> Result<()> {
        self.check_event(&event)?;
        self.events
            .entry(event.tick)
            .or_default()
            .insert((event.planet.clone(), event.kind), event);
        Ok(())
    }

    /// Movement rows of one planet, newest first.
    #[must_use]
    pub fn movements_for_planet(&self, planet: &PlanetId) -> Vec<&MovementRecord> {
        self.movements
            .values()
            .rev()
            .filter_map(|rows| rows.get(planet))
            .collect()
    }

    /// Rows moving a planet into or out of a galaxy.
    ///
    /// Newest tick first; within a tick, rows leaving the galaxy come
    /// before rows entering it, each ordered by slot.
    #[must_use]
    pub fn movements_for_key(&self, galaxy: GalaxyKey) -> Vec<&MovementRecord> {
        let mut rows = Vec::new();
        for by_planet in self.movements.values().rev() {
            let mut tick_rows: Vec<&MovementRecord> = by_planet
                .values()
                .filter(|record| record.touches(galaxy))
                .collect();
            tick_rows.sort_by_key(|record| {
                let outgoing = record.old.filter(|key| key.galaxy() == galaxy);
                match outgoing {
                    Some(key) => (0, key.z),
                    None => (1, record.new.map_or(0, |key| key.z)),
                }
            });
            rows.extend(tick_rows);
        }
        rows
    }

    /// Genuine relocations of a planet; no-op rows are skipped.
    #[must_use]
    pub fn relocation_count(&self, planet: &PlanetId) -> usize {
        self.movements
            .values()
            .filter_map(|rows| rows.get(planet))
            .filter(|record| record.is_relocation())
            .count()
    }

    /// Relocations that left `galaxy` for another one.
    ///
    /// Moves between two slots of the same galaxy are not exiles.
    #[must_use]
    pub fn exile_count(&self, galaxy: GalaxyKey) -> usize {
        self.movements
            .values()
            .flat_map(BTreeMap::values)
            .filter(|record| record.is_relocation())
            .filter(|record| record.old.is_some_and(|key| key.galaxy() == galaxy))
            .filter(|record| record.new.is_some_and(|key| key.galaxy() != galaxy))
            .count()
    }

    /// Events of one kind for a planet, newest first.
    #[must_use]
    pub fn events_for(&self, planet: &PlanetId, kind: PlanetEventKind) -> Vec<&PlanetEvent> {
        let lookup = (planet.clone(), kind);
        self.events
            .values()
            .rev()
            .filter_map(|rows| rows.get(&lookup))
            .collect()
    }

    /// Number of ticks a planet was recorded idle.
    #[must_use]
    pub fn total_idle(&self, planet: &PlanetId) -> usize {
        self.events_for(planet, PlanetEventKind::Idle).len()
    }

    /// Total movement rows, no-ops included.
    #[must_use]
    pub fn movement_len(&self) -> usize {
        self.movements.values().map(BTreeMap::len).sum()
    }

    /// Drop every row written at `tick`. Returns `(movements, events)` removed.
    pub fn purge_tick(&mut self, tick: TickId) -> (usize, usize) {
        let movements = self.movements.remove(&tick).map_or(0, |rows| rows.len());
        let events = self.events.remove(&tick).map_or(0, |rows| rows.len());
        (movements, events)
    }
}
