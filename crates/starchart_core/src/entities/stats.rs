//! Statistic columns shared by every entity type.

use serde::{Deserialize, Serialize};

use crate::tick::TickId;

/// A rank extreme together with the tick it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extremum {
    /// Rank reached.
    pub rank: u32,
    /// Tick at which it was reached.
    pub tick: TickId,
}

/// One ranked statistic with its tick-over-tick columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    /// Current amount.
    pub amount: i64,
    /// Rank by this statistic.
    #[serde(default)]
    pub rank: u32,
    /// Absolute change since the previous tick.
    #[serde(default)]
    pub growth: i64,
    /// Percentage change since the previous tick.
    #[serde(default)]
    pub growth_pc: f64,
    /// Rank change since the previous tick.
    #[serde(default)]
    pub rank_change: i32,
    /// Best rank ever held.
    #[serde(default)]
    pub highest_rank: Option<Extremum>,
    /// Worst rank ever held.
    #[serde(default)]
    pub lowest_rank: Option<Extremum>,
}

impl StatLine {
    /// A statistic with only its amount set.
    #[must_use]
    pub fn new(amount: i64) -> Self {
        Self {
            amount,
            ..Self::default()
        }
    }

    /// Same statistic with the rank set.
    #[must_use]
    pub fn ranked(mut self, rank: u32) -> Self {
        self.rank = rank;
        self
    }
}

/// Asteroid capture totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoidTotals {
    /// Asteroids captured this round.
    pub total_round_roids: i64,
    /// Asteroids lost this round.
    pub total_lost_roids: i64,
    /// Ticks spent capturing.
    pub ticks_roiding: u32,
    /// Ticks spent being captured from.
    pub ticks_roided: u32,
    /// Asteroids captured on the last tick.
    pub tick_roids: i64,
    /// Average asteroids per capturing tick.
    pub av_roids: f64,
    /// Experience gained per captured asteroid.
    pub roid_xp: f64,
}

/// Statistics block carried by every entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Ticks since first sighting.
    #[serde(default)]
    pub age: u32,
    /// Asteroid count.
    pub size: StatLine,
    /// Score.
    pub score: StatLine,
    /// Value.
    pub value: StatLine,
    /// Experience.
    pub xp: StatLine,
    /// Value-to-score ratio as published.
    #[serde(default)]
    pub ratio: f64,
    /// Consecutive ticks without growth.
    #[serde(default)]
    pub idle: u32,
    /// Asteroid capture totals.
    #[serde(default)]
    pub roids: RoidTotals,
}

impl Stats {
    /// Statistics with the four headline amounts set and everything else zero.
    #[must_use]
    pub fn new(size: i64, score: i64, value: i64, xp: i64) -> Self {
        Self {
            size: StatLine::new(size),
            score: StatLine::new(score),
            value: StatLine::new(value),
            xp: StatLine::new(xp),
            ..Self::default()
        }
    }

    /// `"Score: s (r) Value: v (r) Size: s (r) XP: x (r)"`.
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "Score: {} ({}) Value: {} ({}) Size: {} ({}) XP: {} ({})",
            self.score.amount,
            self.score.rank,
            self.value.amount,
            self.value.rank,
            self.size.amount,
            self.size.rank,
            self.xp.amount,
            self.xp.rank
        )
    }
}
