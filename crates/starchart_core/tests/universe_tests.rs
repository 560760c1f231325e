//! End-to-end tests over several ingested ticks.
//!
//! These drive the universe only through `ingest` and the typed
//! repositories, the way a bot or web front end would.

use starchart_core::prelude::*;
use starchart_test_utils::fixtures::{
    alliance, galaxy, planet, universe_from, DumpBuilder, CONSTANTS_RON,
};

const HOME: PlanetKey = PlanetKey { x: 1, y: 1, z: 1 };
const AWAY: PlanetKey = PlanetKey { x: 2, y: 2, z: 2 };

// =============================================================================
// Current records
// =============================================================================

mod catalog {
    use super::*;

    #[test]
    fn test_require_active_never_returns_retired_record() {
        let universe = universe_from(vec![
            DumpBuilder::at(1).galaxy(galaxy(3, 3, "Gone", 100)).build(),
            DumpBuilder::at(2).build(),
        ]);
        let key = GalaxyKey { x: 3, y: 3 };

        let err = universe.galaxies().load_by_key(&key, true).unwrap_err();
        assert!(err.is_not_found());

        let retired = universe.galaxies().load_by_key(&key, false).unwrap();
        assert!(!retired.active);
        assert_eq!(retired.retired_tick, Some(2));
    }

    #[test]
    fn test_reused_coordinates_keep_both_records() {
        let universe = universe_from(vec![
            DumpBuilder::at(1).planet(planet("old", 1, 1, 1, 10, 10, 10)).build(),
            DumpBuilder::at(2).planet(planet("new", 1, 1, 1, 20, 20, 20)).build(),
        ]);

        let records = universe.planets().records_at(&HOME);
        assert_eq!(records.len(), 2);
        assert!(!records[0].active);
        assert!(records[1].active);
        assert_eq!(
            universe.planets().load_by_key(&HOME, true).unwrap().state.id,
            PlanetId::new("new")
        );
    }

    #[test]
    fn test_alliance_search_through_universe() {
        let universe = universe_from(vec![DumpBuilder::at(1)
            .alliance(alliance("Ascendancy", Some("asc"), 500))
            .alliance(alliance("Conspiracy", Some("cons"), 400))
            .build()]);

        let hit = universe.alliances().search("CONS", true, false).unwrap();
        assert_eq!(hit.state.name.name(), "Conspiracy");
        assert!(universe.alliances().search("", true, false).is_err());
        assert!(universe.alliances().search("zzz", false, false).unwrap_err().is_not_found());
    }
}

// =============================================================================
// History resolution
// =============================================================================

mod history {
    use super::*;

    #[test]
    fn test_exact_miss_is_not_found_for_every_owner() {
        let universe = universe_from(vec![
            DumpBuilder::at(1).planet(planet("a", 1, 1, 1, 10, 10, 10)).build(),
            DumpBuilder::at(3).planet(planet("a", 1, 1, 1, 10, 10, 10)).build(),
        ]);

        for require_active in [true, false] {
            let err = universe
                .planets()
                .load_snapshot(&HOME, 2, LookupMode::Exact, require_active)
                .unwrap_err();
            assert_eq!(err, StarchartError::not_found(EntityKind::Planet, HOME, Some(2)));
        }
    }

    #[test]
    fn test_snapshot_owner_accessors_after_reset() {
        let universe = universe_from(vec![
            DumpBuilder::at(1).planet(planet("first", 1, 1, 1, 10, 10, 10)).build(),
            DumpBuilder::at(2).planet(planet("second", 1, 1, 1, 5, 5, 5)).build(),
        ]);
        let planets = universe.planets();

        let old = planets.load_snapshot(&HOME, 1, LookupMode::Exact, false).unwrap();
        assert_eq!(planets.owner_as_of(old).unwrap().state.id, PlanetId::new("first"));
        assert_eq!(planets.current_owner(old).unwrap().state.id, PlanetId::new("second"));

        // Closest lookups stick with the planet that holds the slot today.
        let near = planets.load_snapshot(&HOME, 1, LookupMode::Closest, true).unwrap();
        assert_eq!(near.tick, 2);
        let entity = planets
            .load_entity_at_tick(&HOME, 1, LookupMode::Exact, false)
            .unwrap();
        assert_eq!(entity.id, PlanetId::new("first"));
    }

    #[test]
    fn test_planet_back_after_gap_keeps_its_history() {
        let universe = universe_from(vec![
            DumpBuilder::at(1).planet(planet("p", 1, 1, 1, 10, 10, 10)).build(),
            DumpBuilder::at(2).build(),
            DumpBuilder::at(3).planet(planet("p", 1, 1, 1, 12, 12, 12)).build(),
        ]);
        let planets = universe.planets();

        assert_eq!(planets.records_at(&HOME).len(), 1);
        let old = planets.load_snapshot(&HOME, 1, LookupMode::Exact, true).unwrap();
        assert_eq!(old.tick, 1);
        assert_eq!(old.state.stats.size.amount, 10);
        assert_eq!(
            planets.load_snapshot(&HOME, 1, LookupMode::Closest, true).unwrap().tick,
            1
        );

        let record = planets.load_by_key(&HOME, true).unwrap();
        assert_eq!(planets.owner_as_of(old).unwrap().id, record.id);
        assert_eq!(record.created_tick, 1);
        assert_eq!(record.retired_tick, None);
    }

    #[test]
    fn test_relocated_planet_history_stays_at_old_key() {
        let universe = universe_from(vec![
            DumpBuilder::at(1).planet(planet("p", 1, 1, 1, 10, 10, 10)).build(),
            DumpBuilder::at(2)
                .planet(planet("p", 2, 2, 2, 10, 10, 10))
                .movement("p", Some(HOME), Some(AWAY))
                .build(),
        ]);
        let planets = universe.planets();

        // The slot it left has no active owner any more.
        assert!(planets.load_snapshot(&HOME, 1, LookupMode::Exact, true).is_err());
        assert!(planets.load_snapshot(&HOME, 1, LookupMode::Exact, false).is_ok());
        assert_eq!(
            planets.load_snapshot(&AWAY, 1, LookupMode::Closest, true).unwrap().tick,
            2
        );
    }
}

// =============================================================================
// Movements and events
// =============================================================================

mod movements {
    use super::*;

    #[test]
    fn test_relocation_count_skips_noop_rows() {
        let universe = universe_from(vec![
            DumpBuilder::at(1)
                .planet(planet("p", 1, 1, 1, 10, 10, 10))
                .movement("p", Some(HOME), Some(HOME))
                .build(),
            DumpBuilder::at(2)
                .planet(planet("p", 2, 2, 2, 10, 10, 10))
                .movement("p", Some(HOME), Some(AWAY))
                .build(),
        ]);

        assert_eq!(universe.ledger().relocation_count(&PlanetId::new("p")), 1);
        assert_eq!(universe.planet_relocations(AWAY, true).unwrap(), 1);
        assert_eq!(universe.ledger().exile_count(GalaxyKey { x: 1, y: 1 }), 1);
    }

    #[test]
    fn test_idle_events_accumulate() {
        let universe = universe_from(
            (1..=4)
                .map(|tick| {
                    DumpBuilder::at(tick)
                        .planet(planet("p", 1, 1, 1, 10, 10, 10))
                        .event("p", PlanetEventKind::Idle, i64::from(tick))
                        .build()
                })
                .collect(),
        );
        assert_eq!(universe.ledger().total_idle(&PlanetId::new("p")), 4);
    }

    #[test]
    fn test_row_for_another_tick_rejected() {
        let mut universe = Universe::new();
        let mut dump = DumpBuilder::at(5).planet(planet("p", 1, 1, 1, 1, 1, 1)).build();
        dump.movements
            .push(MovementRecord::moved(4, PlanetId::new("p"), HOME, AWAY));

        assert!(matches!(universe.ingest(dump), Err(StarchartError::InvalidKey(_))));
        assert!(universe.clock().is_empty());
    }
}

// =============================================================================
// Rankings
// =============================================================================

mod rankings {
    use super::*;

    #[test]
    fn test_each_tick_replaces_whole_table() {
        let mut universe = universe_from(vec![DumpBuilder::at(1)
            .planet(planet("a", 1, 1, 1, 10, 300, 10))
            .planet(planet("b", 1, 1, 2, 10, 200, 10))
            .build()]);
        let a = universe.planets().load_by_key(&HOME, true).unwrap().id;
        assert_eq!(universe.rankings().rank_of(EntityRef::new(EntityKind::Planet, a)), Some(1));

        universe
            .ingest(
                DumpBuilder::at(2)
                    .planet(planet("a", 1, 1, 1, 10, 100, 10))
                    .planet(planet("b", 1, 1, 2, 10, 200, 10))
                    .build(),
            )
            .unwrap();

        let snapshot = universe.rankings().snapshot();
        assert_eq!(snapshot.tick, 2);
        assert_eq!(snapshot.rank_of(EntityRef::new(EntityKind::Planet, a)), Some(2));
        assert_eq!(snapshot.table(EntityKind::Planet).unwrap().len(), 2);
    }
}

// =============================================================================
// Combat against stored records
// =============================================================================

mod combat {
    use super::*;

    #[test]
    fn test_metrics_from_configured_constants() {
        let constants = GameConstants::from_ron_str(CONSTANTS_RON).unwrap();
        let metrics = CombatMetrics::new(constants.capture);
        let universe = universe_from(vec![DumpBuilder::at(1)
            .planet(planet("att", 1, 1, 1, 100, 1000, 500))
            .planet(planet("tgt", 2, 2, 2, 400, 1500, 600))
            .build()]);
        let attacker = universe.planets().load_by_key(&HOME, true).unwrap();
        let target = universe.planets().load_by_key(&AWAY, true).unwrap();

        let bravery = metrics.bravery(attacker, target).unwrap();
        assert!((bravery - 1.43).abs() < 1e-9);
        assert_eq!(metrics.max_capture(target, Some(attacker)).unwrap(), 100);

        let past = universe
            .planets()
            .load_snapshot(&AWAY, 1, LookupMode::Exact, true)
            .unwrap();
        assert_eq!(metrics.estimated_xp(attacker, past, None).unwrap(), 1430);
    }
}

// =============================================================================
// Archive
// =============================================================================

mod archive {
    use super::*;

    #[test]
    fn test_save_and_load_file() {
        let universe = universe_from(vec![
            DumpBuilder::at(1).planet(planet("a", 1, 1, 1, 10, 10, 10)).build(),
            DumpBuilder::at(2).planet(planet("a", 1, 1, 1, 11, 11, 11)).build(),
        ]);
        let path = std::env::temp_dir().join(format!("starchart-test-{}.bin", std::process::id()));

        universe.save(&path).unwrap();
        let restored = Universe::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.clock().current_tick(), Some(2));
        let snapshot = restored
            .planets()
            .load_snapshot(&HOME, 1, LookupMode::Exact, true)
            .unwrap();
        assert_eq!(snapshot.state.stats.size.amount, 10);
        let record = restored.planets().load_by_key(&HOME, true).unwrap();
        assert_eq!(restored.rank_of(record), Some(1));
    }
}
