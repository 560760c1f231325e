//! Proptest strategies for generating universe inputs.

use proptest::prelude::*;

use starchart_core::entities::Stats;
use starchart_core::keys::{GalaxyKey, PlanetKey};
use starchart_core::tick::TickId;

/// Generate a valid planet key in a small universe (collisions are likely).
pub fn arb_planet_key() -> impl Strategy<Value = PlanetKey> {
    (1u32..=3, 1u32..=3, 1u32..=6).prop_map(|(x, y, z)| PlanetKey { x, y, z })
}

/// Generate a valid galaxy key.
pub fn arb_galaxy_key() -> impl Strategy<Value = GalaxyKey> {
    (1u32..=3, 1u32..=3).prop_map(|(x, y)| GalaxyKey { x, y })
}

/// Generate a tick id (1-500).
pub fn arb_tick() -> impl Strategy<Value = TickId> {
    1u32..=500
}

/// Generate a set of distinct ticks, sorted ascending.
pub fn arb_tick_set(max_len: usize) -> impl Strategy<Value = Vec<TickId>> {
    proptest::collection::btree_set(arb_tick(), 1..=max_len)
        .prop_map(|ticks| ticks.into_iter().collect())
}

/// Generate a non-zero statistic (1-10 million).
pub fn arb_amount() -> impl Strategy<Value = i64> {
    1i64..10_000_000
}

/// Generate stats with non-zero size, score and value.
pub fn arb_stats() -> impl Strategy<Value = Stats> {
    (arb_amount(), arb_amount(), arb_amount())
        .prop_map(|(size, score, value)| Stats::new(size, score, value, 0))
}

/// Whether a planet is present at each of `len` ticks.
pub fn arb_presence(len: usize) -> impl Strategy<Value = Vec<bool>> {
    proptest::collection::vec(any::<bool>(), len)
}
