//! The whole universe: ingestion, purge and cross-type queries.
//!
//! [`Universe::ingest`] is the only write path. It checks a complete
//! [`TickDump`] before touching anything, so a rejected dump leaves every
//! store exactly as it was.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, DumpOutcome, Record, RecordId};
use crate::entities::{Alliance, Cluster, EntityKind, Galaxy, Planet, UniverseEntity};
use crate::error::{Result, StarchartError};
use crate::history::{History, Snapshot};
use crate::keys::{AllianceKey, ClusterKey, GalaxyKey, NaturalKey, PlanetKey};
use crate::movement::{MovementLedger, MovementRecord, PlanetEvent};
use crate::ranking::{EntityRef, RankEntry, RankSnapshot, RankTable, RankingCache};
use crate::repository::Repository;
use crate::tick::{TickClock, TickId, TickRecord};

/// A key with the metric it was ranked by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedKey<K> {
    /// Ranked entity.
    pub key: K,
    /// Metric the ranking was computed from.
    pub metric: i64,
}

impl<K> RankedKey<K> {
    /// Pair a key with its metric.
    pub const fn new(key: K, metric: i64) -> Self {
        Self { key, metric }
    }
}

/// Rank lists for one tick, best first, by natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingDump {
    /// Cluster ranking.
    #[serde(default)]
    pub clusters: Vec<RankedKey<ClusterKey>>,
    /// Galaxy ranking.
    #[serde(default)]
    pub galaxies: Vec<RankedKey<GalaxyKey>>,
    /// Planet ranking.
    #[serde(default)]
    pub planets: Vec<RankedKey<PlanetKey>>,
    /// Alliance ranking.
    #[serde(default)]
    pub alliances: Vec<RankedKey<AllianceKey>>,
}

/// Everything the ingestion observed in one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickDump {
    /// Tick id, timestamp and source metadata. Entity counts are filled in
    /// from the dump itself.
    pub tick: TickRecord,
    /// Every active cluster.
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    /// Every active galaxy.
    #[serde(default)]
    pub galaxies: Vec<Galaxy>,
    /// Every active planet.
    #[serde(default)]
    pub planets: Vec<Planet>,
    /// Every active alliance.
    #[serde(default)]
    pub alliances: Vec<Alliance>,
    /// Planet coordinate changes seen this tick.
    #[serde(default)]
    pub movements: Vec<MovementRecord>,
    /// Planet events seen this tick.
    #[serde(default)]
    pub events: Vec<PlanetEvent>,
    /// Replacement rank tables.
    #[serde(default)]
    pub rankings: RankingDump,
}

impl TickDump {
    /// An empty dump for a tick.
    #[must_use]
    pub fn new(tick: TickRecord) -> Self {
        Self {
            tick,
            clusters: Vec::new(),
            galaxies: Vec::new(),
            planets: Vec::new(),
            alliances: Vec::new(),
            movements: Vec::new(),
            events: Vec::new(),
            rankings: RankingDump::default(),
        }
    }
}

/// What one ingestion changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Ingested tick.
    pub tick: TickId,
    /// Snapshots appended across all entity types.
    pub snapshots: usize,
    /// Current records created for first sightings.
    pub created: usize,
    /// Current records retired.
    pub retired: usize,
    /// Retired records brought back by their identity.
    pub reactivated: usize,
    /// Movement rows appended.
    pub movements: usize,
    /// Planet events appended.
    pub events: usize,
}

impl IngestSummary {
    fn absorb(&mut self, outcome: &DumpOutcome) {
        self.snapshots += outcome.owners.len();
        self.created += outcome.created;
        self.retired += outcome.retired;
        self.reactivated += outcome.reactivated;
    }
}

/// What one purge removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeSummary {
    /// Purged tick.
    pub tick: TickId,
    /// Snapshots removed across all entity types.
    pub snapshots: usize,
    /// Movement rows removed.
    pub movements: usize,
    /// Planet events removed.
    pub events: usize,
}

/// A current record of any entity type.
#[derive(Debug, Clone, Copy)]
pub enum UniverseRecord<'a> {
    /// A cluster record.
    Cluster(&'a Record<Cluster>),
    /// A galaxy record.
    Galaxy(&'a Record<Galaxy>),
    /// A planet record.
    Planet(&'a Record<Planet>),
    /// An alliance record.
    Alliance(&'a Record<Alliance>),
}

impl UniverseRecord<'_> {
    /// Entity type of the record.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Cluster(_) => EntityKind::Cluster,
            Self::Galaxy(_) => EntityKind::Galaxy,
            Self::Planet(_) => EntityKind::Planet,
            Self::Alliance(_) => EntityKind::Alliance,
        }
    }

    /// Whether the record is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        match self {
            Self::Cluster(record) => record.active,
            Self::Galaxy(record) => record.active,
            Self::Planet(record) => record.active,
            Self::Alliance(record) => record.active,
        }
    }
}

impl fmt::Display for UniverseRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster(record) => write!(f, "{} {}", record.state.key, record.state.stats.headline()),
            Self::Galaxy(record) => write!(f, "{} '{}' {}", record.state.key, record.state.name, record.state.stats.headline()),
            Self::Planet(record) => write!(f, "{}", record.state),
            Self::Alliance(record) => write!(f, "{}", record.state),
        }
    }
}

/// Every store of the universe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Universe {
    clock: TickClock,
    clusters: Catalog<Cluster>,
    galaxies: Catalog<Galaxy>,
    planets: Catalog<Planet>,
    alliances: Catalog<Alliance>,
    cluster_history: History<Cluster>,
    galaxy_history: History<Galaxy>,
    planet_history: History<Planet>,
    alliance_history: History<Alliance>,
    ledger: MovementLedger,
    rankings: RankingCache,
}

impl Universe {
    /// An empty universe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tick clock.
    #[must_use]
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// The movement ledger.
    #[must_use]
    pub const fn ledger(&self) -> &MovementLedger {
        &self.ledger
    }

    /// The rank cache.
    #[must_use]
    pub const fn rankings(&self) -> &RankingCache {
        &self.rankings
    }

    /// Cluster queries.
    #[must_use]
    pub const fn clusters(&self) -> Repository<'_, Cluster> {
        Repository::new(&self.clusters, &self.cluster_history)
    }

    /// Galaxy queries.
    #[must_use]
    pub const fn galaxies(&self) -> Repository<'_, Galaxy> {
        Repository::new(&self.galaxies, &self.galaxy_history)
    }

    /// Planet queries.
    #[must_use]
    pub const fn planets(&self) -> Repository<'_, Planet> {
        Repository::new(&self.planets, &self.planet_history)
    }

    /// Alliance queries.
    #[must_use]
    pub const fn alliances(&self) -> Repository<'_, Alliance> {
        Repository::new(&self.alliances, &self.alliance_history)
    }

    /// Check a dump against the current state without applying it.
    pub fn validate(&self, dump: &TickDump) -> Result<()> {
        let tick = dump.tick.id;
        self.clock.check_vacant(tick)?;
        if let Some(current) = self.clock.current_tick().filter(|&current| tick < current) {
            return Err(StarchartError::InvalidKey(format!(
                "tick {tick} is older than current tick {current}"
            )));
        }

        self.clusters.validate_dump(&dump.clusters)?;
        self.galaxies.validate_dump(&dump.galaxies)?;
        self.planets.validate_dump(&dump.planets)?;
        self.alliances.validate_dump(&dump.alliances)?;

        check_history_vacant(&self.cluster_history, &dump.clusters, tick)?;
        check_history_vacant(&self.galaxy_history, &dump.galaxies, tick)?;
        check_history_vacant(&self.planet_history, &dump.planets, tick)?;
        check_history_vacant(&self.alliance_history, &dump.alliances, tick)?;

        let mut moved = HashSet::new();
        for record in &dump.movements {
            check_row_tick(record.tick, tick, "movement")?;
            for key in record.old.iter().chain(record.new.iter()) {
                key.validate()?;
            }
            self.ledger.check_movement(record)?;
            if !moved.insert(&record.planet) {
                return Err(StarchartError::DuplicateTick {
                    tick,
                    what: format!("movement of planet {}", record.planet),
                });
            }
        }

        let mut seen = HashSet::new();
        for event in &dump.events {
            check_row_tick(event.tick, tick, "planet event")?;
            self.ledger.check_event(event)?;
            if !seen.insert((&event.planet, event.kind)) {
                return Err(StarchartError::DuplicateTick {
                    tick,
                    what: format!("{:?} event of planet {}", event.kind, event.planet),
                });
            }
        }

        check_ranked(&dump.rankings.clusters, &dump.clusters)?;
        check_ranked(&dump.rankings.galaxies, &dump.galaxies)?;
        check_ranked(&dump.rankings.planets, &dump.planets)?;
        check_ranked(&dump.rankings.alliances, &dump.alliances)?;

        Ok(())
    }

    /// Apply one complete tick.
    ///
    /// The dump is validated in full first; on error nothing is written.
    pub fn ingest(&mut self, dump: TickDump) -> Result<IngestSummary> {
        if let Err(err) = self.validate(&dump) {
            tracing::warn!(tick = dump.tick.id, error = %err, "Rejected tick dump");
            return Err(err);
        }

        let TickDump {
            mut tick,
            clusters,
            galaxies,
            planets,
            alliances,
            movements,
            events,
            rankings,
        } = dump;
        let id = tick.id;

        tick.counts.clusters = clusters.len() as u32;
        tick.counts.galaxies = galaxies.len() as u32;
        tick.counts.planets = planets.len() as u32;
        tick.counts.alliances = alliances.len() as u32;
        tick.counts.races.clear();
        for planet in &planets {
            *tick.counts.races.entry(planet.race.clone()).or_default() += 1;
        }
        self.clock.record(tick)?;

        let mut summary = IngestSummary {
            tick: id,
            ..IngestSummary::default()
        };

        let cluster_owners =
            apply_entities(&mut self.clusters, &mut self.cluster_history, clusters, id, &mut summary)?;
        let galaxy_owners =
            apply_entities(&mut self.galaxies, &mut self.galaxy_history, galaxies, id, &mut summary)?;
        let planet_owners =
            apply_entities(&mut self.planets, &mut self.planet_history, planets, id, &mut summary)?;
        let alliance_owners =
            apply_entities(&mut self.alliances, &mut self.alliance_history, alliances, id, &mut summary)?;

        summary.movements = movements.len();
        for record in movements {
            self.ledger.record_movement(record)?;
        }
        summary.events = events.len();
        for event in events {
            self.ledger.record_event(event)?;
        }

        let snapshot = RankSnapshot::new(id)
            .with_table(EntityKind::Cluster, rank_table(&rankings.clusters, &cluster_owners)?)
            .with_table(EntityKind::Galaxy, rank_table(&rankings.galaxies, &galaxy_owners)?)
            .with_table(EntityKind::Planet, rank_table(&rankings.planets, &planet_owners)?)
            .with_table(EntityKind::Alliance, rank_table(&rankings.alliances, &alliance_owners)?);
        self.rankings.publish(snapshot)?;

        tracing::info!(
            tick = id,
            snapshots = summary.snapshots,
            created = summary.created,
            retired = summary.retired,
            reactivated = summary.reactivated,
            movements = summary.movements,
            "Ingested tick"
        );
        Ok(summary)
    }

    /// Delete a tick together with its snapshots, movement rows and events.
    ///
    /// Current records are left alone. Purging the tick whose ranks are
    /// published clears the rank tables.
    pub fn purge_tick(&mut self, tick: TickId) -> Result<PurgeSummary> {
        if self.clock.purge(tick).is_none() {
            return Err(StarchartError::InvalidKey(format!("tick {tick} was never ingested")));
        }

        let snapshots = self.cluster_history.purge_tick(tick)
            + self.galaxy_history.purge_tick(tick)
            + self.planet_history.purge_tick(tick)
            + self.alliance_history.purge_tick(tick);
        let (movements, events) = self.ledger.purge_tick(tick);

        if self.rankings.tick() == tick {
            tracing::debug!(tick, "Cleared rank tables of purged tick");
            self.rankings.reset(RankSnapshot::default());
        }

        tracing::info!(tick, snapshots, movements, events, "Purged tick");
        Ok(PurgeSummary {
            tick,
            snapshots,
            movements,
            events,
        })
    }

    /// Active galaxies of a cluster, ordered by `y`.
    #[must_use]
    pub fn cluster_galaxies(&self, cluster: ClusterKey) -> Vec<&Record<Galaxy>> {
        self.galaxies
            .active_records()
            .into_iter()
            .filter(|record| record.state.key.cluster() == cluster)
            .collect()
    }

    /// Active planets of a galaxy, ordered by `z`.
    #[must_use]
    pub fn galaxy_planets(&self, galaxy: GalaxyKey) -> Vec<&Record<Planet>> {
        self.planets
            .active_records()
            .into_iter()
            .filter(|record| record.state.key.galaxy() == galaxy)
            .collect()
    }

    /// The active planet at a slot.
    pub fn galaxy_planet(&self, key: PlanetKey) -> Result<&Record<Planet>> {
        self.planets.load_by_key(&key, true)
    }

    /// `x:y 'name' (active planets) Score: ...` for a galaxy.
    pub fn describe_galaxy(&self, key: GalaxyKey, require_active: bool) -> Result<String> {
        let record = self.galaxies.load_by_key(&key, require_active)?;
        Ok(record.state.summary(self.galaxy_planets(key).len()))
    }

    /// Genuine relocations of the planet currently at `key`.
    pub fn planet_relocations(&self, key: PlanetKey, require_active: bool) -> Result<usize> {
        let record = self.planets.load_by_key(&key, require_active)?;
        Ok(self.ledger.relocation_count(&record.state.id))
    }

    /// Dereference an entity reference.
    #[must_use]
    pub fn resolve(&self, entity: EntityRef) -> Option<UniverseRecord<'_>> {
        match entity.kind {
            EntityKind::Cluster => self.clusters.get(entity.record).map(UniverseRecord::Cluster),
            EntityKind::Galaxy => self.galaxies.get(entity.record).map(UniverseRecord::Galaxy),
            EntityKind::Planet => self.planets.get(entity.record).map(UniverseRecord::Planet),
            EntityKind::Alliance => self.alliances.get(entity.record).map(UniverseRecord::Alliance),
        }
    }

    /// Published rank of a current record.
    #[must_use]
    pub fn rank_of<E: UniverseEntity>(&self, record: &Record<E>) -> Option<u32> {
        self.rankings.rank_of(EntityRef::new(E::KIND, record.id))
    }

    /// The current record at a published rank.
    #[must_use]
    pub fn entity_at_rank(&self, kind: EntityKind, rank: u32) -> Option<UniverseRecord<'_>> {
        self.rankings
            .entity_at_rank(kind, rank)
            .and_then(|entity| self.resolve(entity))
    }
}

fn check_history_vacant<E: UniverseEntity>(
    history: &History<E>,
    entries: &[E],
    tick: TickId,
) -> Result<()> {
    entries
        .iter()
        .try_for_each(|entry| history.check_vacant(&entry.key(), tick))
}

fn check_row_tick(row: TickId, tick: TickId, what: &str) -> Result<()> {
    if row != tick {
        return Err(StarchartError::InvalidKey(format!(
            "{what} for tick {row} in dump of tick {tick}"
        )));
    }
    Ok(())
}

fn check_ranked<E: UniverseEntity>(ranked: &[RankedKey<E::Key>], entries: &[E]) -> Result<()> {
    let present: HashSet<E::Key> = entries.iter().map(|entry| entry.key()).collect();
    let mut seen = HashSet::with_capacity(ranked.len());
    for entry in ranked {
        if !present.contains(&entry.key) {
            return Err(StarchartError::InvalidKey(format!(
                "ranked {} {} is not in the dump",
                E::KIND,
                entry.key
            )));
        }
        if !seen.insert(&entry.key) {
            return Err(StarchartError::InvalidRanking(format!(
                "{} {} ranked twice",
                E::KIND,
                entry.key
            )));
        }
    }
    Ok(())
}

fn apply_entities<E: UniverseEntity>(
    catalog: &mut Catalog<E>,
    history: &mut History<E>,
    entries: Vec<E>,
    tick: TickId,
    summary: &mut IngestSummary,
) -> Result<HashMap<E::Key, RecordId>> {
    let outcome = catalog.apply_dump(entries.clone(), tick);
    summary.absorb(&outcome);

    let mut owners = HashMap::with_capacity(entries.len());
    for (state, &owner) in entries.into_iter().zip(&outcome.owners) {
        owners.insert(state.key(), owner);
        history.record(Snapshot { tick, owner, state })?;
    }
    Ok(owners)
}

fn rank_table<K: NaturalKey>(ranked: &[RankedKey<K>], owners: &HashMap<K, RecordId>) -> Result<RankTable> {
    let entries = ranked
        .iter()
        .filter_map(|entry| {
            owners.get(&entry.key).map(|&record| RankEntry {
                record,
                metric: entry.metric,
            })
        })
        .collect();
    RankTable::from_ordered(entries)
}
