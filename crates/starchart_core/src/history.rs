//! Per-tick snapshots and the point-in-time resolver.
//!
//! Snapshots are immutable copies of an entity's state at one tick, stored
//! per natural key in tick order. Each snapshot remembers the record that
//! produced it; because coordinates get reused, that record is not always
//! the one active at the key today.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Record, RecordId};
use crate::entities::UniverseEntity;
use crate::error::{Result, StarchartError};
use crate::keys::NaturalKey;
use crate::tick::TickId;

/// How a history lookup treats the requested tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupMode {
    /// Only a snapshot at exactly the requested tick.
    Exact,
    /// The snapshot nearest the requested tick (lower tick on ties).
    Closest,
}

/// Immutable copy of an entity at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<E> {
    /// Tick the snapshot was taken at.
    pub tick: TickId,
    /// Record that owned the key when the snapshot was taken.
    pub owner: RecordId,
    /// Entity state at that tick.
    pub state: E,
}

impl<E: UniverseEntity> Snapshot<E> {
    /// Natural key the snapshot is filed under.
    #[must_use]
    pub fn key(&self) -> E::Key {
        self.state.key()
    }

    /// The record that produced this snapshot.
    #[must_use]
    pub fn owner_as_of<'c>(&self, catalog: &'c Catalog<E>) -> Option<&'c Record<E>> {
        catalog.get(self.owner)
    }

    /// Whichever record is active at this snapshot's key right now.
    ///
    /// May be a different entity than [`owner_as_of`](Self::owner_as_of),
    /// or none at all.
    #[must_use]
    pub fn current_owner<'c>(&self, catalog: &'c Catalog<E>) -> Option<&'c Record<E>> {
        catalog.active_at(&self.key())
    }

    /// Whether the snapshot's own record is the one active at its key.
    #[must_use]
    pub fn has_active_owner(&self, catalog: &Catalog<E>) -> bool {
        catalog
            .active_at(&self.key())
            .is_some_and(|record| record.id == self.owner)
    }
}

/// Append-only snapshot store for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct History<E: UniverseEntity> {
    series: HashMap<E::Key, BTreeMap<TickId, Snapshot<E>>>,
}

impl<E: UniverseEntity> Default for History<E> {
    fn default() -> Self {
        Self {
            series: HashMap::new(),
        }
    }
}

impl<E: UniverseEntity> History<E> {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `DuplicateTick` if `(key, tick)` already holds a snapshot.
    pub fn check_vacant(&self, key: &E::Key, tick: TickId) -> Result<()> {
        if self.at(key, tick).is_some() {
            return Err(StarchartError::DuplicateTick {
                tick,
                what: format!("{} {key} snapshot", E::KIND),
            });
        }
        Ok(())
    }

    /// Append a snapshot.
    pub fn record(&mut self, snapshot: Snapshot<E>) -> Result<()> {
        let key = snapshot.key();
        key.validate()?;
        self.check_vacant(&key, snapshot.tick)?;
        self.series
            .entry(key)
            .or_default()
            .insert(snapshot.tick, snapshot);
        Ok(())
    }

    /// The snapshot at exactly `(key, tick)`.
    #[must_use]
    pub fn at(&self, key: &E::Key, tick: TickId) -> Option<&Snapshot<E>> {
        self.series.get(key).and_then(|ticks| ticks.get(&tick))
    }

    /// All snapshots for a key in ascending tick order.
    pub fn series(&self, key: &E::Key) -> impl Iterator<Item = &Snapshot<E>> {
        self.series.get(key).into_iter().flat_map(BTreeMap::values)
    }

    /// Total snapshot count across all keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    /// Check if no snapshot has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Resolve a snapshot for `key` near `tick`.
    ///
    /// Candidates are ordered by distance from `tick`, lower tick first on
    /// ties (`Exact` keeps only the snapshot at `tick`). The first candidate
    /// whose owner is still the active record at the key is preferred over
    /// closer snapshots left behind by a retired owner. With
    /// `require_active`, a key without such a candidate fails. Otherwise the
    /// globally nearest candidate is the fallback.
    pub fn load_snapshot(
        &self,
        catalog: &Catalog<E>,
        key: &E::Key,
        tick: TickId,
        mode: LookupMode,
        require_active: bool,
    ) -> Result<&Snapshot<E>> {
        key.validate()?;
        let missing = || StarchartError::not_found(E::KIND, key, Some(tick));

        let candidates: Vec<&Snapshot<E>> = match mode {
            LookupMode::Exact => self.at(key, tick).into_iter().collect(),
            LookupMode::Closest => {
                let mut all: Vec<&Snapshot<E>> = self.series(key).collect();
                all.sort_by_key(|snapshot| (snapshot.tick.abs_diff(tick), snapshot.tick));
                all
            }
        };

        let current = catalog.active_at(key).map(|record| record.id);
        let owner_preferred = current.and_then(|id| {
            candidates
                .iter()
                .copied()
                .find(|snapshot| snapshot.owner == id)
        });

        match owner_preferred {
            Some(snapshot) if snapshot.tick == tick || mode == LookupMode::Closest => {
                return Ok(snapshot);
            }
            Some(_) | None if require_active => {
                tracing::debug!(kind = %E::KIND, %key, tick, "No snapshot for the active owner");
                return Err(missing());
            }
            _ => {}
        }

        let fallback = candidates.first().copied().ok_or_else(missing)?;
        if mode == LookupMode::Closest || fallback.tick == tick {
            tracing::debug!(
                kind = %E::KIND,
                %key,
                tick,
                resolved = fallback.tick,
                "Resolved snapshot without an active owner"
            );
            Ok(fallback)
        } else {
            Err(missing())
        }
    }

    /// Resolve a snapshot and return the entity state it recorded.
    ///
    /// This is the entity as it was at the resolved tick, not the record that
    /// holds the key today.
    pub fn load_entity_at_tick(
        &self,
        catalog: &Catalog<E>,
        key: &E::Key,
        tick: TickId,
        mode: LookupMode,
        require_active: bool,
    ) -> Result<&E> {
        self.load_snapshot(catalog, key, tick, mode, require_active)
            .map(|snapshot| &snapshot.state)
    }

    /// Drop every snapshot taken at `tick`. Returns how many were removed.
    pub fn purge_tick(&mut self, tick: TickId) -> usize {
        let mut removed = 0;
        self.series.retain(|_, ticks| {
            if ticks.remove(&tick).is_some() {
                removed += 1;
            }
            !ticks.is_empty()
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Galaxy, Stats};
    use crate::keys::GalaxyKey;

    const KEY: GalaxyKey = GalaxyKey { x: 4, y: 2 };

    fn galaxy(name: &str) -> Galaxy {
        Galaxy::new(KEY, name, Stats::new(10, 100, 100, 0))
    }

    /// Ingest `name` (or nothing) at each tick, mirroring what the universe does.
    fn build(ticks: &[(TickId, Option<&str>)]) -> (Catalog<Galaxy>, History<Galaxy>) {
        let mut catalog = Catalog::new();
        let mut history = History::new();
        for &(tick, name) in ticks {
            let entries: Vec<Galaxy> = name.map(galaxy).into_iter().collect();
            let outcome = catalog.apply_dump(entries.clone(), tick);
            for (state, owner) in entries.into_iter().zip(outcome.owners) {
                history.record(Snapshot { tick, owner, state }).unwrap();
            }
        }
        (catalog, history)
    }

    fn resolve(
        (catalog, history): &(Catalog<Galaxy>, History<Galaxy>),
        tick: TickId,
        mode: LookupMode,
        require_active: bool,
    ) -> Result<TickId> {
        history
            .load_snapshot(catalog, &KEY, tick, mode, require_active)
            .map(|snapshot| snapshot.tick)
    }

    #[test]
    fn test_duplicate_snapshot_rejected() {
        let (_, mut history) = build(&[(1, Some("a"))]);
        let again = history.record(Snapshot {
            tick: 1,
            owner: RecordId(0),
            state: galaxy("b"),
        });
        assert!(matches!(again, Err(StarchartError::DuplicateTick { tick: 1, .. })));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_exact_lookup() {
        let store = build(&[(1, Some("a")), (2, Some("a")), (5, Some("a"))]);
        assert_eq!(resolve(&store, 2, LookupMode::Exact, true).unwrap(), 2);

        let err = resolve(&store, 3, LookupMode::Exact, true).unwrap_err();
        assert!(err.is_not_found());
        assert!(resolve(&store, 3, LookupMode::Exact, false).is_err());
    }

    #[test]
    fn test_closest_tie_breaks_to_lower_tick() {
        let store = build(&[(10, Some("a")), (20, Some("a"))]);
        assert_eq!(resolve(&store, 14, LookupMode::Closest, true).unwrap(), 10);
        assert_eq!(resolve(&store, 15, LookupMode::Closest, true).unwrap(), 10);
        assert_eq!(resolve(&store, 16, LookupMode::Closest, true).unwrap(), 20);
        assert_eq!(resolve(&store, 99, LookupMode::Closest, true).unwrap(), 20);
    }

    #[test]
    fn test_closest_prefers_active_owner_over_nearer_retired_snapshot() {
        // Ticks 1-3 belong to a retired galaxy; the active one appears at 10.
        let store = build(&[
            (1, Some("old")),
            (2, Some("old")),
            (3, Some("old")),
            (4, None),
            (10, Some("new")),
        ]);

        assert_eq!(resolve(&store, 4, LookupMode::Closest, true).unwrap(), 10);
        assert_eq!(resolve(&store, 4, LookupMode::Closest, false).unwrap(), 10);
    }

    #[test]
    fn test_exact_on_retired_owner_needs_require_active_false() {
        let store = build(&[(1, Some("old")), (2, None), (5, Some("new"))]);

        assert!(resolve(&store, 1, LookupMode::Exact, true).unwrap_err().is_not_found());
        assert_eq!(resolve(&store, 1, LookupMode::Exact, false).unwrap(), 1);
        assert_eq!(resolve(&store, 5, LookupMode::Exact, true).unwrap(), 5);
    }

    #[test]
    fn test_key_without_active_record() {
        let store = build(&[(1, Some("gone")), (2, Some("gone")), (3, None)]);

        assert!(resolve(&store, 2, LookupMode::Closest, true).is_err());
        assert_eq!(resolve(&store, 9, LookupMode::Closest, false).unwrap(), 2);
    }

    #[test]
    fn test_owner_accessors_diverge_after_reuse() {
        let (catalog, history) = build(&[(1, Some("old")), (2, None), (3, Some("new"))]);
        let snapshot = history.at(&KEY, 1).unwrap();

        assert_eq!(snapshot.owner_as_of(&catalog).unwrap().state.name, "old");
        assert_eq!(snapshot.current_owner(&catalog).unwrap().state.name, "new");
        assert!(!snapshot.has_active_owner(&catalog));

        let entity = history
            .load_entity_at_tick(&catalog, &KEY, 1, LookupMode::Exact, false)
            .unwrap();
        assert_eq!(entity.name, "old");
    }

    #[test]
    fn test_purge_tick_removes_only_that_tick() {
        let (_, mut history) = build(&[(1, Some("a")), (2, Some("a"))]);
        assert_eq!(history.purge_tick(2), 1);
        assert_eq!(history.purge_tick(2), 0);
        assert!(history.at(&KEY, 2).is_none());
        assert!(history.at(&KEY, 1).is_some());
        assert_eq!(history.purge_tick(1), 1);
        assert!(history.is_empty());
    }
}
