//! Per-tick rank tables with atomic replacement.
//!
//! The ingestion builds a complete [`RankSnapshot`] for a tick off to the
//! side and publishes it with a single pointer swap. Readers load the
//! snapshot once per call, so they see either the old tick's tables or the
//! new tick's, never a mix.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::RecordId;
use crate::entities::EntityKind;
use crate::error::{Result, StarchartError};
use crate::tick::TickId;

/// Reference to a current record of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity type.
    pub kind: EntityKind,
    /// Record within that type's catalog.
    pub record: RecordId,
}

impl EntityRef {
    /// Build a reference.
    #[must_use]
    pub const fn new(kind: EntityKind, record: RecordId) -> Self {
        Self { kind, record }
    }
}

/// One row of a rank table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    /// Ranked record.
    pub record: RecordId,
    /// The number the ranking was computed from.
    pub metric: i64,
}

/// Dense 1..N ranking of one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTable {
    entries: Vec<RankEntry>,
    positions: HashMap<RecordId, u32>,
}

impl RankTable {
    /// Build a table from entries already in rank order (best first).
    pub fn from_ordered(entries: Vec<RankEntry>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let rank = index as u32 + 1;
            if positions.insert(entry.record, rank).is_some() {
                return Err(StarchartError::InvalidRanking(format!(
                    "record {} ranked twice",
                    entry.record.0
                )));
            }
        }
        Ok(Self { entries, positions })
    }

    /// Rank of a record, starting at 1.
    #[must_use]
    pub fn rank_of(&self, record: RecordId) -> Option<u32> {
        self.positions.get(&record).copied()
    }

    /// Entry at a 1-based rank.
    #[must_use]
    pub fn at_rank(&self, rank: u32) -> Option<&RankEntry> {
        let index = usize::try_from(rank.checked_sub(1)?).ok()?;
        self.entries.get(index)
    }

    /// Number of ranked records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table ranks nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &RankEntry> {
        self.entries.iter()
    }
}

/// Every rank table for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSnapshot {
    /// Tick the tables were computed for; zero before the first publish.
    pub tick: TickId,
    tables: BTreeMap<EntityKind, RankTable>,
}

impl RankSnapshot {
    /// Start an empty snapshot for a tick.
    #[must_use]
    pub fn new(tick: TickId) -> Self {
        Self {
            tick,
            tables: BTreeMap::new(),
        }
    }

    /// Set the table of one kind.
    #[must_use]
    pub fn with_table(mut self, kind: EntityKind, table: RankTable) -> Self {
        self.tables.insert(kind, table);
        self
    }

    /// Table of one kind, if ranked.
    #[must_use]
    pub fn table(&self, kind: EntityKind) -> Option<&RankTable> {
        self.tables.get(&kind)
    }

    /// Rank of an entity in this snapshot.
    #[must_use]
    pub fn rank_of(&self, entity: EntityRef) -> Option<u32> {
        self.table(entity.kind)?.rank_of(entity.record)
    }

    /// Entity at a rank in this snapshot.
    #[must_use]
    pub fn entity_at_rank(&self, kind: EntityKind, rank: u32) -> Option<EntityRef> {
        self.table(kind)?
            .at_rank(rank)
            .map(|entry| EntityRef::new(kind, entry.record))
    }
}

/// Atomically replaced rank snapshot shared between readers.
#[derive(Debug)]
pub struct RankingCache {
    current: ArcSwap<RankSnapshot>,
}

impl Default for RankingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RankingCache {
    fn clone(&self) -> Self {
        Self {
            current: ArcSwap::new(self.current.load_full()),
        }
    }
}

impl Serialize for RankingCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.current.load().as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RankingCache {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        RankSnapshot::deserialize(deserializer).map(Self::with_snapshot)
    }
}

impl RankingCache {
    /// An empty cache ranking nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RankSnapshot::default()),
        }
    }

    /// A cache starting from an existing snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: RankSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Replace every table in one step.
    ///
    /// A snapshot for an older tick than the one published is rejected.
    /// There is a single writer (the ingestion); concurrent publishers are
    /// not coordinated.
    pub fn publish(&self, snapshot: RankSnapshot) -> Result<()> {
        let published = self.current.load().tick;
        if snapshot.tick < published {
            tracing::warn!(tick = snapshot.tick, published, "Rejected stale rank snapshot");
            return Err(StarchartError::InvalidRanking(format!(
                "snapshot for tick {} is older than published tick {published}",
                snapshot.tick
            )));
        }
        self.current.store(Arc::new(snapshot));
        Ok(())
    }

    /// Put back a snapshot unconditionally, e.g. after purging the tick it ranked.
    pub fn reset(&self, snapshot: RankSnapshot) {
        self.current.store(Arc::new(snapshot));
    }

    /// The published snapshot. Hold on to it to run several reads against one tick.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RankSnapshot> {
        self.current.load_full()
    }

    /// Tick of the published tables.
    #[must_use]
    pub fn tick(&self) -> TickId {
        self.current.load().tick
    }

    /// Rank of an entity in the published tables.
    #[must_use]
    pub fn rank_of(&self, entity: EntityRef) -> Option<u32> {
        self.current.load().rank_of(entity)
    }

    /// Entity at a rank in the published tables.
    #[must_use]
    pub fn entity_at_rank(&self, kind: EntityKind, rank: u32) -> Option<EntityRef> {
        self.current.load().entity_at_rank(kind, rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn table(records: &[u32]) -> RankTable {
        RankTable::from_ordered(
            records
                .iter()
                .map(|&id| RankEntry {
                    record: RecordId(id),
                    metric: 0,
                })
                .collect(),
        )
        .unwrap()
    }

    fn planet(id: u32) -> EntityRef {
        EntityRef::new(EntityKind::Planet, RecordId(id))
    }

    #[test]
    fn test_rank_lookup_both_ways() {
        let cache = RankingCache::new();
        cache
            .publish(RankSnapshot::new(3).with_table(EntityKind::Planet, table(&[7, 2, 9])))
            .unwrap();

        assert_eq!(cache.rank_of(planet(2)), Some(2));
        assert_eq!(cache.entity_at_rank(EntityKind::Planet, 3), Some(planet(9)));
        assert_eq!(cache.entity_at_rank(EntityKind::Planet, 0), None);
        assert_eq!(cache.entity_at_rank(EntityKind::Planet, 4), None);
        assert_eq!(cache.entity_at_rank(EntityKind::Galaxy, 1), None);
        assert_eq!(cache.rank_of(planet(1)), None);
    }

    #[test]
    fn test_repeated_record_rejected() {
        let result = RankTable::from_ordered(vec![
            RankEntry { record: RecordId(1), metric: 5 },
            RankEntry { record: RecordId(1), metric: 4 },
        ]);
        assert!(matches!(result, Err(StarchartError::InvalidRanking(_))));
    }

    #[test]
    fn test_stale_publish_rejected() {
        let cache = RankingCache::new();
        cache.publish(RankSnapshot::new(5)).unwrap();
        assert!(cache.publish(RankSnapshot::new(4)).is_err());
        assert_eq!(cache.tick(), 5);
        cache.publish(RankSnapshot::new(6)).unwrap();
        assert_eq!(cache.tick(), 6);
    }

    #[test]
    fn test_readers_never_see_rollback_or_mix() {
        // Tick t ranks record 1 at position t and record 2 at t + 1, so a
        // reader can tell which tick a snapshot came from.
        fn snapshot_for(tick: TickId) -> RankSnapshot {
            let mut ids: Vec<u32> = (100..100 + tick - 1).collect();
            ids.push(1);
            ids.push(2);
            RankSnapshot::new(tick).with_table(EntityKind::Planet, table(&ids))
        }

        let cache = Arc::new(RankingCache::with_snapshot(snapshot_for(1)));
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut last_seen = 0;
                    while !done.load(Ordering::Acquire) {
                        let rank = cache.rank_of(planet(1)).unwrap();
                        assert!(rank >= last_seen, "rank went back from {last_seen} to {rank}");
                        last_seen = rank;

                        let snapshot = cache.snapshot();
                        let first = snapshot.rank_of(planet(1)).unwrap();
                        let second = snapshot.rank_of(planet(2)).unwrap();
                        assert_eq!(first, snapshot.tick);
                        assert_eq!(second, first + 1);
                    }
                })
            })
            .collect();

        for tick in 2..=200 {
            cache.publish(snapshot_for(tick)).unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.rank_of(planet(1)), Some(200));
    }
}
