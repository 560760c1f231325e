//! Test fixtures and helpers.
//!
//! Entity builders, constants and tick dumps for consistent testing.

use chrono::{DateTime, Duration, TimeZone, Utc};

use starchart_core::config::CaptureConstants;
use starchart_core::entities::{Alliance, Cluster, Galaxy, Planet, PlanetId, Stats};
use starchart_core::keys::{AllianceKey, ClusterKey, GalaxyKey, PlanetKey};
use starchart_core::movement::{MovementRecord, PlanetEvent, PlanetEventKind};
use starchart_core::tick::{TickId, TickRecord};
use starchart_core::universe::{RankedKey, TickDump, Universe};

/// Maximum capture rate used by tests.
pub const MAX_CAPTURE_RATE: f64 = 0.25;
/// Minimum capture rate used by tests.
pub const MIN_CAPTURE_RATE: f64 = 0.12;
/// Resource cap per agent used by tests.
pub const RESOURCE_CAP_PER_AGENT: i64 = 50_000;

/// The same constants as a RON document.
pub const CONSTANTS_RON: &str = r#"(
    roids: (max_capture_rate: 0.25, min_capture_rate: 0.12),
    numbers: (resource_cap_per_agent: 50000),
    access: {"galmate": 0, "member": 100, "admin": 1000},
)"#;

/// Capture constants used by tests.
#[must_use]
pub fn capture_constants() -> CaptureConstants {
    CaptureConstants {
        min_capture_rate: MIN_CAPTURE_RATE,
        max_capture_rate: MAX_CAPTURE_RATE,
        resource_cap_per_agent: RESOURCE_CAP_PER_AGENT,
    }
}

/// Timestamp of tick 0: midnight UTC on a Monday.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Tick record one hour after the previous tick.
#[must_use]
pub fn tick_record(id: TickId) -> TickRecord {
    TickRecord::new(id, epoch() + Duration::hours(i64::from(id)))
}

/// Stats with size, score and value set.
#[must_use]
pub fn stats(size: i64, score: i64, value: i64) -> Stats {
    Stats::new(size, score, value, 0)
}

/// A planet with headline stats.
#[must_use]
pub fn planet(id: &str, x: u32, y: u32, z: u32, size: i64, score: i64, value: i64) -> Planet {
    let mut planet = Planet::new(id, PlanetKey { x, y, z }, stats(size, score, value));
    planet.ruler_name = format!("Ruler {id}");
    planet.planet_name = format!("World {id}");
    planet.race = "Ter".to_string();
    planet
}

/// A galaxy with headline stats.
#[must_use]
pub fn galaxy(x: u32, y: u32, name: &str, score: i64) -> Galaxy {
    Galaxy::new(GalaxyKey { x, y }, name, stats(0, score, score))
}

/// A cluster with headline stats.
#[must_use]
pub fn cluster(x: u32, score: i64) -> Cluster {
    Cluster::new(ClusterKey(x), stats(0, score, score))
}

/// An alliance with an optional alias.
#[must_use]
pub fn alliance(name: &str, alias: Option<&str>, score: i64) -> Alliance {
    Alliance::new(
        AllianceKey(name.to_string()),
        alias.map(str::to_string),
        stats(0, score, score),
    )
}

/// Builder for a [`TickDump`].
///
/// Rank lists are derived from score (highest first) unless set explicitly.
#[derive(Debug, Clone)]
pub struct DumpBuilder {
    dump: TickDump,
    explicit_ranks: bool,
}

impl DumpBuilder {
    /// Start an empty dump.
    #[must_use]
    pub fn new(tick: TickRecord) -> Self {
        Self {
            dump: TickDump::new(tick),
            explicit_ranks: false,
        }
    }

    /// Start an empty dump for a tick id.
    #[must_use]
    pub fn at(tick: TickId) -> Self {
        Self::new(tick_record(tick))
    }

    /// Add a planet.
    #[must_use]
    pub fn planet(mut self, planet: Planet) -> Self {
        self.dump.planets.push(planet);
        self
    }

    /// Add a galaxy.
    #[must_use]
    pub fn galaxy(mut self, galaxy: Galaxy) -> Self {
        self.dump.galaxies.push(galaxy);
        self
    }

    /// Add a cluster.
    #[must_use]
    pub fn cluster(mut self, cluster: Cluster) -> Self {
        self.dump.clusters.push(cluster);
        self
    }

    /// Add an alliance.
    #[must_use]
    pub fn alliance(mut self, alliance: Alliance) -> Self {
        self.dump.alliances.push(alliance);
        self
    }

    /// Record a planet move at this dump's tick.
    #[must_use]
    pub fn movement(mut self, planet: &str, old: Option<PlanetKey>, new: Option<PlanetKey>) -> Self {
        self.dump.movements.push(MovementRecord {
            tick: self.dump.tick.id,
            planet: PlanetId::new(planet),
            old,
            new,
        });
        self
    }

    /// Record a planet event at this dump's tick.
    #[must_use]
    pub fn event(mut self, planet: &str, kind: PlanetEventKind, amount: i64) -> Self {
        self.dump.events.push(PlanetEvent {
            tick: self.dump.tick.id,
            planet: PlanetId::new(planet),
            kind,
            amount,
        });
        self
    }

    /// Use an explicit planet ranking instead of the score order.
    #[must_use]
    pub fn planet_ranking(mut self, keys: &[PlanetKey]) -> Self {
        self.dump.rankings.planets = keys
            .iter()
            .rev()
            .enumerate()
            .map(|(metric, &key)| RankedKey::new(key, metric as i64))
            .rev()
            .collect();
        self.explicit_ranks = true;
        self
    }

    /// Finish the dump.
    #[must_use]
    pub fn build(mut self) -> TickDump {
        if !self.explicit_ranks {
            let dump = &mut self.dump;
            dump.rankings.clusters = by_score(&dump.clusters, |c| (c.key, c.stats.score.amount));
            dump.rankings.galaxies = by_score(&dump.galaxies, |g| (g.key, g.stats.score.amount));
            dump.rankings.planets = by_score(&dump.planets, |p| (p.key, p.stats.score.amount));
            dump.rankings.alliances =
                by_score(&dump.alliances, |a| (a.name.clone(), a.stats.score.amount));
        }
        self.dump
    }
}

fn by_score<E, K: Ord>(entries: &[E], key_of: impl Fn(&E) -> (K, i64)) -> Vec<RankedKey<K>> {
    let mut ranked: Vec<RankedKey<K>> = entries
        .iter()
        .map(|entry| {
            let (key, metric) = key_of(entry);
            RankedKey::new(key, metric)
        })
        .collect();
    ranked.sort_by(|a, b| b.metric.cmp(&a.metric).then_with(|| a.key.cmp(&b.key)));
    ranked
}

/// Ingest a sequence of dumps into a fresh universe.
///
/// # Panics
///
/// Panics if any dump is rejected.
#[must_use]
pub fn universe_from(dumps: Vec<TickDump>) -> Universe {
    let mut universe = Universe::new();
    for dump in dumps {
        let tick = dump.tick.id;
        if let Err(e) = universe.ingest(dump) {
            panic!("fixture dump for tick {tick} rejected: {e}");
        }
    }
    universe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_ranks_by_score() {
        let dump = DumpBuilder::at(1)
            .planet(planet("a", 1, 1, 1, 10, 100, 10))
            .planet(planet("b", 1, 1, 2, 10, 300, 10))
            .build();
        assert_eq!(dump.rankings.planets[0].key, PlanetKey { x: 1, y: 1, z: 2 });
        assert_eq!(dump.rankings.planets[0].metric, 300);
    }

    #[test]
    fn test_explicit_ranking_keeps_order() {
        let a = PlanetKey { x: 1, y: 1, z: 1 };
        let b = PlanetKey { x: 1, y: 1, z: 2 };
        let dump = DumpBuilder::at(1)
            .planet(planet("a", 1, 1, 1, 10, 100, 10))
            .planet(planet("b", 1, 1, 2, 10, 300, 10))
            .planet_ranking(&[a, b])
            .build();
        assert_eq!(dump.rankings.planets[0].key, a);
        assert!(dump.rankings.planets[0].metric > dump.rankings.planets[1].metric);
    }

    #[test]
    fn test_universe_from_ingests_in_order() {
        let universe = universe_from(vec![
            DumpBuilder::at(1).planet(planet("a", 1, 1, 1, 1, 1, 1)).build(),
            DumpBuilder::at(2).planet(planet("a", 1, 1, 1, 2, 2, 2)).build(),
        ]);
        assert_eq!(universe.clock().current_tick(), Some(2));
    }
}
