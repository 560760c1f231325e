//! JSON reports printed by the CLI.

use serde::Serialize;

use starchart_core::catalog::Record;
use starchart_core::combat::{CombatMetrics, Combatant};
use starchart_core::entities::{EntityKind, UniverseEntity};
use starchart_core::history::Snapshot;
use starchart_core::tick::TickId;
use starchart_core::universe::Universe;

use crate::error::Result;

/// Overview of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    /// Number of ingested ticks.
    pub ticks: usize,
    /// Latest tick, if any.
    pub current_tick: Option<TickId>,
    /// Tick at the start of the current day.
    pub midday_offset_tick: Option<TickId>,
    /// Tick one week back.
    pub week_tick: Option<TickId>,
    /// Active records per entity type.
    pub active: Vec<(EntityKind, usize)>,
    /// Snapshots per entity type.
    pub snapshots: Vec<(EntityKind, usize)>,
    /// Movement rows, no-ops included.
    pub movements: usize,
    /// Tick of the published rank tables.
    pub ranked_tick: TickId,
}

impl ArchiveSummary {
    /// Summarize a universe.
    #[must_use]
    pub fn of(universe: &Universe) -> Self {
        let clock = universe.clock();
        Self {
            ticks: clock.len(),
            current_tick: clock.current_tick(),
            midday_offset_tick: clock.midday_offset_tick(),
            week_tick: clock.week_tick(),
            active: vec![
                (EntityKind::Cluster, universe.clusters().catalog().active_len()),
                (EntityKind::Galaxy, universe.galaxies().catalog().active_len()),
                (EntityKind::Planet, universe.planets().catalog().active_len()),
                (EntityKind::Alliance, universe.alliances().catalog().active_len()),
            ],
            snapshots: vec![
                (EntityKind::Cluster, universe.clusters().history().len()),
                (EntityKind::Galaxy, universe.galaxies().history().len()),
                (EntityKind::Planet, universe.planets().history().len()),
                (EntityKind::Alliance, universe.alliances().history().len()),
            ],
            movements: universe.ledger().movement_len(),
            ranked_tick: universe.rankings().tick(),
        }
    }
}

/// A resolved current record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    /// Entity type.
    pub kind: EntityKind,
    /// Natural key.
    pub key: String,
    /// Whether the record is active.
    pub active: bool,
    /// First sighting.
    pub created_tick: TickId,
    /// Retirement tick, if retired.
    pub retired_tick: Option<TickId>,
    /// Published rank.
    pub rank: Option<u32>,
    /// Display line.
    pub line: String,
}

impl RecordReport {
    /// Describe a record.
    #[must_use]
    pub fn of<E: UniverseEntity>(universe: &Universe, record: &Record<E>, line: String) -> Self {
        Self {
            kind: E::KIND,
            key: record.state.key().to_string(),
            active: record.active,
            created_tick: record.created_tick,
            retired_tick: record.retired_tick,
            rank: universe.rank_of(record),
            line,
        }
    }
}

/// A resolved snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotReport {
    /// Entity type.
    pub kind: EntityKind,
    /// Natural key.
    pub key: String,
    /// Requested tick.
    pub requested_tick: TickId,
    /// Tick the snapshot was taken at.
    pub resolved_tick: TickId,
    /// Whether the snapshot's own record still holds the key.
    pub active_owner: bool,
    /// Score, value and size at that tick.
    pub headline: String,
}

impl SnapshotReport {
    /// Describe a snapshot.
    #[must_use]
    pub fn of<E: UniverseEntity>(
        snapshot: &Snapshot<E>,
        requested_tick: TickId,
        active_owner: bool,
    ) -> Self {
        Self {
            kind: E::KIND,
            key: snapshot.key().to_string(),
            requested_tick,
            resolved_tick: snapshot.tick,
            active_owner,
            headline: snapshot.state.stats().headline(),
        }
    }
}

/// Attack metrics between two combatants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetReport {
    /// Attacker description.
    pub attacker: String,
    /// Target description.
    pub target: String,
    /// Bravery of the attack.
    pub bravery: f64,
    /// Capture rate against the target.
    pub capture_rate: f64,
    /// Roids the attack can capture.
    pub max_capture: i64,
    /// Experience for a full capture.
    pub estimated_xp: i64,
    /// Resources one agent can steal.
    pub resources_per_agent: i64,
}

impl TargetReport {
    /// Run every formula.
    ///
    /// # Errors
    ///
    /// Returns an error when a formula divides by zero.
    pub fn compute(
        metrics: &CombatMetrics,
        attacker: (&dyn Combatant, String),
        target: (&dyn Combatant, String),
    ) -> Result<Self> {
        let (attacker, attacker_name) = attacker;
        let (target, target_name) = target;
        Ok(Self {
            attacker: attacker_name,
            target: target_name,
            bravery: metrics.bravery(attacker, target)?,
            capture_rate: metrics.capture_rate(target, Some(attacker))?,
            max_capture: metrics.max_capture(target, Some(attacker))?,
            estimated_xp: metrics.estimated_xp(attacker, target, None)?,
            resources_per_agent: metrics.resources_per_agent(attacker, target)?,
        })
    }
}

/// Render any report as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json<T: Serialize>(report: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use starchart_core::keys::PlanetKey;
    use starchart_test_utils::fixtures::{capture_constants, planet, tick_record, DumpBuilder};

    #[test]
    fn test_summary_counts() {
        let mut universe = Universe::new();
        universe
            .ingest(
                DumpBuilder::new(tick_record(1))
                    .planet(planet("a", 1, 1, 1, 100, 1000, 500))
                    .planet(planet("b", 1, 1, 2, 100, 1500, 600))
                    .build(),
            )
            .unwrap();

        let summary = ArchiveSummary::of(&universe);
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.current_tick, Some(1));
        assert!(summary.active.contains(&(EntityKind::Planet, 2)));
        assert!(to_json(&summary).unwrap().contains("\"current_tick\": 1"));
    }

    #[test]
    fn test_target_report() {
        let metrics = CombatMetrics::new(capture_constants());
        let attacker = planet("a", 1, 1, 1, 100, 1000, 500);
        let target = planet("b", 1, 1, 2, 400, 1500, 600);

        let report = TargetReport::compute(
            &metrics,
            (&attacker, PlanetKey { x: 1, y: 1, z: 1 }.to_string()),
            (&target, "1:1:2".to_string()),
        )
        .unwrap();
        assert!((report.bravery - 1.43).abs() < 1e-9);
        assert_eq!(report.max_capture, 100);
        assert_eq!(report.estimated_xp, 1430);
    }
}
