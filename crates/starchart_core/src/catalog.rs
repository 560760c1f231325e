//! Current-state records.
//!
//! A [`Catalog`] is an arena of [`Record`]s plus two indexes: every record
//! ever held at a natural key, and the single record currently active at a
//! key. Records are created on first sighting, updated in place while the
//! entity stays in the dump, and flipped to inactive (never removed) when it
//! disappears. A key can therefore map to at most one active record and any
//! number of retired ones.
//!
//! Types with a stable identity (planets) keep one record per identity for
//! the whole game: a planet that drops out of a dump and comes back is
//! reactivated rather than recreated.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entities::{Alliance, UniverseEntity};
use crate::error::{Result, StarchartError};
use crate::keys::NaturalKey;
use crate::tick::TickId;

/// Arena index of a current record. Higher ids were created later.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct RecordId(pub u32);

impl RecordId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Mutable latest-known state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<E> {
    /// Arena id.
    pub id: RecordId,
    /// Whether the entity was present in the most recent dump.
    pub active: bool,
    /// Tick of first sighting.
    pub created_tick: TickId,
    /// Last tick the entity was present.
    pub last_seen_tick: TickId,
    /// Tick at which the entity disappeared, if it has.
    pub retired_tick: Option<TickId>,
    /// Latest state.
    pub state: E,
}

/// Result of applying one dump to a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpOutcome {
    /// Owning record of each dump entry, in dump order.
    pub owners: Vec<RecordId>,
    /// Records created for first sightings.
    pub created: usize,
    /// Retired records brought back by their identity.
    pub reactivated: usize,
    /// Records retired because their entity left the dump.
    pub retired: usize,
}

/// Arena of current records for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Catalog<E: UniverseEntity> {
    records: Vec<Record<E>>,
    by_key: HashMap<E::Key, Vec<RecordId>>,
    active: HashMap<E::Key, RecordId>,
    by_identity: HashMap<String, RecordId>,
}

impl<E: UniverseEntity> Default for Catalog<E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            by_key: HashMap::new(),
            active: HashMap::new(),
            by_identity: HashMap::new(),
        }
    }
}

impl<E: UniverseEntity> Catalog<E> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a record by arena id.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record<E>> {
        self.records.get(id.index())
    }

    /// The record active at a key, if any.
    #[must_use]
    pub fn active_at(&self, key: &E::Key) -> Option<&Record<E>> {
        self.active.get(key).and_then(|&id| self.get(id))
    }

    /// Every record currently keyed at `key`, oldest first.
    #[must_use]
    pub fn records_at(&self, key: &E::Key) -> Vec<&Record<E>> {
        let mut ids = self.by_key.get(key).cloned().unwrap_or_default();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    /// All active records, ordered by key.
    #[must_use]
    pub fn active_records(&self) -> Vec<&Record<E>> {
        let mut records: Vec<&Record<E>> = self
            .active
            .values()
            .filter_map(|&id| self.get(id))
            .collect();
        records.sort_by_key(|record| record.state.key());
        records
    }

    /// Iterate over every record, active or retired, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Record<E>> {
        self.records.iter()
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of active records.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Resolve a key to a current record.
    ///
    /// An active record always wins. Without one, `require_active` fails
    /// with `NotFound`; otherwise the most recently created record at the key
    /// is returned.
    pub fn load_by_key(&self, key: &E::Key, require_active: bool) -> Result<&Record<E>> {
        key.validate()?;

        if let Some(record) = self.active_at(key) {
            return Ok(record);
        }
        if require_active {
            return Err(StarchartError::not_found(E::KIND, key, None));
        }
        self.by_key
            .get(key)
            .and_then(|ids| ids.iter().max())
            .and_then(|&id| self.get(id))
            .ok_or_else(|| StarchartError::not_found(E::KIND, key, None))
    }

    /// Check a full dump before anything is written.
    ///
    /// Every key must be valid and appear once; stable identities must be
    /// unique as well.
    pub fn validate_dump(&self, entries: &[E]) -> Result<()> {
        let mut keys = HashSet::with_capacity(entries.len());
        let mut identities = HashSet::new();
        for entry in entries {
            let key = entry.key();
            key.validate()?;
            if !keys.insert(key.clone()) {
                return Err(StarchartError::InvalidKey(format!(
                    "{} {key} appears twice in one dump",
                    E::KIND
                )));
            }
            if let Some(identity) = entry.identity() {
                if !identities.insert(identity) {
                    return Err(StarchartError::InvalidKey(format!(
                        "{} id {identity} appears twice in one dump",
                        E::KIND
                    )));
                }
            }
        }
        Ok(())
    }

    /// Replace the active set with a full dump.
    ///
    /// Entries are matched by stable identity when the type has one (active
    /// or retired), otherwise to the active record at their key. Matched
    /// records are updated in place, re-keyed if they moved and reactivated
    /// if they had been retired. Unmatched entries create new records, and
    /// active records nobody matched are retired. Call
    /// [`validate_dump`](Self::validate_dump) first.
    pub fn apply_dump(&mut self, entries: Vec<E>, tick: TickId) -> DumpOutcome {
        let matched: Vec<Option<RecordId>> =
            entries.iter().map(|entry| self.match_existing(entry)).collect();
        let kept: HashSet<RecordId> = matched.iter().flatten().copied().collect();

        let mut outcome = DumpOutcome {
            owners: Vec::with_capacity(entries.len()),
            ..DumpOutcome::default()
        };

        let mut leaving: Vec<RecordId> = self
            .active
            .values()
            .copied()
            .filter(|id| !kept.contains(id))
            .collect();
        leaving.sort_unstable();
        for id in leaving {
            let record = &mut self.records[id.index()];
            record.active = false;
            record.retired_tick = Some(tick);
            outcome.retired += 1;
            tracing::debug!(kind = %E::KIND, key = %record.state.key(), tick, "Retired record");
        }

        self.active.clear();

        for (entry, matched) in entries.into_iter().zip(matched) {
            let key = entry.key();
            let id = match matched {
                Some(id) => {
                    let old_key = self.records[id.index()].state.key();
                    if old_key != key {
                        self.reindex(id, &old_key, &key);
                    }
                    let record = &mut self.records[id.index()];
                    if !record.active {
                        record.active = true;
                        record.retired_tick = None;
                        outcome.reactivated += 1;
                        tracing::debug!(kind = %E::KIND, %key, tick, "Reactivated record");
                    }
                    record.state = entry;
                    record.last_seen_tick = tick;
                    id
                }
                None => {
                    let id = RecordId(self.records.len() as u32);
                    self.records.push(Record {
                        id,
                        active: true,
                        created_tick: tick,
                        last_seen_tick: tick,
                        retired_tick: None,
                        state: entry,
                    });
                    self.by_key.entry(key.clone()).or_default().push(id);
                    outcome.created += 1;
                    id
                }
            };

            if let Some(identity) = self.records[id.index()].state.identity() {
                self.by_identity.insert(identity.to_string(), id);
            }
            self.active.insert(key, id);
            outcome.owners.push(id);
        }

        outcome
    }

    fn match_existing(&self, entry: &E) -> Option<RecordId> {
        match entry.identity() {
            Some(identity) => self.by_identity.get(identity).copied(),
            None => self.active.get(&entry.key()).copied(),
        }
    }

    fn reindex(&mut self, id: RecordId, from: &E::Key, to: &E::Key) {
        if let Some(ids) = self.by_key.get_mut(from) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.by_key.remove(from);
            }
        }
        self.by_key.entry(to.clone()).or_default().push(id);
    }
}

type AllianceMatcher = fn(&Alliance, &str) -> bool;

/// Fuzzy alliance match stages, in priority order.
const ALLIANCE_STAGES: [AllianceMatcher; 6] = [
    |a, q| a.name.name().to_lowercase() == q,
    |a, q| a.name.name().to_lowercase().starts_with(q),
    |a, q| a.alias.as_deref().is_some_and(|alias| alias.to_lowercase() == q),
    |a, q| a.alias.as_deref().is_some_and(|alias| alias.to_lowercase().starts_with(q)),
    |a, q| a.name.name().to_lowercase().contains(q),
    |a, q| a.alias.as_deref().is_some_and(|alias| alias.to_lowercase().contains(q)),
];

impl Catalog<Alliance> {
    /// Resolve an alliance by name or alias.
    ///
    /// Stages are tried in order: exact name, name prefix, exact alias,
    /// alias prefix, name substring, alias substring. All matching is
    /// case-insensitive and the first stage with a hit wins (the oldest
    /// record among its hits). Active alliances are
    /// scanned first; retired ones only when `require_active` is false and
    /// no active alliance matched. With `exact`, only the first stage runs.
    pub fn search(&self, query: &str, require_active: bool, exact: bool) -> Result<&Record<Alliance>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(StarchartError::InvalidKey(
                "alliance search text must not be empty".to_string(),
            ));
        }

        let found = self.search_stages(&needle, true, exact).or_else(|| {
            if require_active {
                None
            } else {
                self.search_stages(&needle, false, exact)
            }
        });

        found.ok_or_else(|| StarchartError::not_found(Alliance::KIND, query, None))
    }

    fn search_stages(&self, needle: &str, active_only: bool, exact: bool) -> Option<&Record<Alliance>> {
        let stages = if exact { 1 } else { ALLIANCE_STAGES.len() };
        ALLIANCE_STAGES[..stages].iter().find_map(|matches| {
            self.records
                .iter()
                .filter(|record| !active_only || record.active)
                .filter(|record| matches(&record.state, needle))
                .min_by_key(|record| record.id)
        })
    }
}
