//! Tick records and the tick clock.
//!
//! A tick is one ingestion of the full universe dump. Tick ids increase
//! monotonically and are usually contiguous, but nothing here assumes the
//! absence of gaps: every lookup goes through the ordered tick map.

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarchartError};

/// Integer identifier of an ingestion event.
pub type TickId = u32;

/// One game day in ticks (one tick is roughly one hour).
pub const TICKS_PER_DAY: TickId = 24;

/// One game week in ticks.
pub const TICKS_PER_WEEK: TickId = TICKS_PER_DAY * 7;

/// How many entities the ingestion saw in a dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    /// Active clusters.
    pub clusters: u32,
    /// Active galaxies.
    pub galaxies: u32,
    /// Active planets.
    pub planets: u32,
    /// Active alliances.
    pub alliances: u32,
    /// Planets per race code, e.g. `"Ter" -> 212`.
    #[serde(default)]
    pub races: BTreeMap<String, u32>,
}

/// A single ingestion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Tick identifier (never zero).
    pub id: TickId,
    /// When the dump was taken.
    pub timestamp: DateTime<Utc>,
    /// HTTP entity tag of the dump, when the source reported one.
    #[serde(default)]
    pub etag: Option<String>,
    /// Last-modified header of the dump, when the source reported one.
    #[serde(default)]
    pub modified: Option<String>,
    /// Entity counts seen by the ingestion.
    #[serde(default)]
    pub counts: EntityCounts,
}

impl TickRecord {
    /// Create a tick record with empty metadata.
    #[must_use]
    pub fn new(id: TickId, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            etag: None,
            modified: None,
            counts: EntityCounts::default(),
        }
    }
}

/// Ordered registry of every ingested tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickClock {
    ticks: BTreeMap<TickId, TickRecord>,
}

impl TickClock {
    /// Create an empty clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest tick id present, or `None` when nothing has been ingested.
    #[must_use]
    pub fn current_tick(&self) -> Option<TickId> {
        self.ticks.keys().next_back().copied()
    }

    /// The tick that started the current tick's day.
    ///
    /// Subtracts the hour-of-day of the latest tick's timestamp, assuming one
    /// tick per hour. Saturates at zero.
    #[must_use]
    pub fn midday_offset_tick(&self) -> Option<TickId> {
        let latest = self.latest()?;
        Some(latest.id.saturating_sub(latest.timestamp.hour()))
    }

    /// The tick one week before the current tick. Saturates at zero.
    #[must_use]
    pub fn week_tick(&self) -> Option<TickId> {
        self.current_tick()
            .map(|tick| tick.saturating_sub(TICKS_PER_WEEK))
    }

    /// Latest tick record.
    #[must_use]
    pub fn latest(&self) -> Option<&TickRecord> {
        self.ticks.values().next_back()
    }

    /// Load a specific tick, or the latest one when `tick` is `None`.
    #[must_use]
    pub fn load(&self, tick: Option<TickId>) -> Option<&TickRecord> {
        match tick {
            Some(id) => self.ticks.get(&id),
            None => self.latest(),
        }
    }

    /// Check whether a tick has been ingested.
    #[must_use]
    pub fn contains(&self, tick: TickId) -> bool {
        self.ticks.contains_key(&tick)
    }

    /// Number of ingested ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Check if no tick has been ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Iterate over tick records in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &TickRecord> {
        self.ticks.values()
    }

    /// Reject a tick id that is zero or already present.
    pub fn check_vacant(&self, tick: TickId) -> Result<()> {
        if tick == 0 {
            return Err(StarchartError::InvalidKey("tick id must be non-zero".to_string()));
        }
        if self.ticks.contains_key(&tick) {
            return Err(StarchartError::DuplicateTick {
                tick,
                what: "tick record".to_string(),
            });
        }
        Ok(())
    }

    /// Record a new tick.
    pub fn record(&mut self, record: TickRecord) -> Result<()> {
        self.check_vacant(record.id)?;
        self.ticks.insert(record.id, record);
        Ok(())
    }

    /// Remove a tick record, returning it if it existed.
    pub fn purge(&mut self, tick: TickId) -> Option<TickRecord> {
        self.ticks.remove(&tick)
    }

    /// Elapsed time since a tick, as `"2d 3h 15m ago"`.
    ///
    /// Zero days and zero hours are omitted; minutes are always shown.
    /// Display only.
    #[must_use]
    pub fn age(&self, tick: TickId, now: DateTime<Utc>) -> Option<String> {
        self.ticks.get(&tick).map(|record| format_age(record.timestamp, now))
    }

    /// Human-readable summary of a tick relative to the current tick.
    ///
    /// ```text
    /// It is currently tick 120 (0m ago - Mon 03/06 14:00)
    /// Tick 100 was 20 ticks ago (20h 0m ago - Mon 02/06 18:00)
    /// ```
    #[must_use]
    pub fn describe(&self, tick: TickId, now: DateTime<Utc>) -> Option<String> {
        let record = self.ticks.get(&tick)?;
        let current = self.current_tick()?;
        let diff = current.saturating_sub(tick);
        let lead = match diff {
            0 => format!("It is currently tick {tick} "),
            1 => format!("Last tick was {tick} "),
            _ => format!("Tick {tick} was {diff} ticks ago "),
        };
        Some(format!(
            "{lead}({} - {})",
            format_age(record.timestamp, now),
            record.timestamp.format("%a %d/%m %H:%M")
        ))
    }
}

fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - then).num_seconds().max(0);
    let days = elapsed / 86_400;
    let hours = (elapsed % 86_400) / 3_600;
    let minutes = (elapsed % 3_600) / 60;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d "));
    }
    if hours > 0 {
        out.push_str(&format!("{hours}h "));
    }
    out.push_str(&format!("{minutes}m ago"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, 0, 0).unwrap()
    }

    fn clock_with(ticks: &[(TickId, u32)]) -> TickClock {
        let mut clock = TickClock::new();
        for &(id, hour) in ticks {
            clock.record(TickRecord::new(id, at(hour))).unwrap();
        }
        clock
    }

    #[test]
    fn test_empty_clock_has_no_tick() {
        let clock = TickClock::new();
        assert_eq!(clock.current_tick(), None);
        assert_eq!(clock.week_tick(), None);
        assert_eq!(clock.midday_offset_tick(), None);
        assert!(clock.load(None).is_none());
    }

    #[test]
    fn test_current_tick_is_highest_even_with_gaps() {
        let clock = clock_with(&[(1, 0), (2, 1), (5, 4)]);
        assert_eq!(clock.current_tick(), Some(5));
        assert_eq!(clock.load(None).map(|t| t.id), Some(5));
        assert_eq!(clock.load(Some(2)).map(|t| t.id), Some(2));
        assert!(clock.load(Some(3)).is_none());
    }

    #[test]
    fn test_midday_offset_subtracts_hour_of_day() {
        let clock = clock_with(&[(200, 14)]);
        assert_eq!(clock.midday_offset_tick(), Some(186));
    }

    #[test]
    fn test_week_tick_saturates() {
        let clock = clock_with(&[(200, 0)]);
        assert_eq!(clock.week_tick(), Some(32));

        let clock = clock_with(&[(10, 0)]);
        assert_eq!(clock.week_tick(), Some(0));
    }

    #[test]
    fn test_record_rejects_duplicate_and_zero() {
        let mut clock = clock_with(&[(3, 0)]);
        let dup = clock.record(TickRecord::new(3, at(1)));
        assert!(matches!(dup, Err(StarchartError::DuplicateTick { tick: 3, .. })));

        let zero = clock.record(TickRecord::new(0, at(1)));
        assert!(matches!(zero, Err(StarchartError::InvalidKey(_))));
        assert_eq!(clock.len(), 1);
    }

    #[test]
    fn test_age_omits_zero_units() {
        let clock = clock_with(&[(1, 10)]);
        let then = at(10);

        assert_eq!(clock.age(1, then + Duration::minutes(5)).unwrap(), "5m ago");
        assert_eq!(
            clock.age(1, then + Duration::hours(3) + Duration::minutes(2)).unwrap(),
            "3h 2m ago"
        );
        assert_eq!(
            clock.age(1, then + Duration::days(2) + Duration::minutes(1)).unwrap(),
            "2d 1m ago"
        );
        assert!(clock.age(9, then).is_none());
    }

    #[test]
    fn test_describe_relative_to_current() {
        let clock = clock_with(&[(1, 10), (2, 11), (5, 14)]);
        let now = at(14);

        assert_eq!(
            clock.describe(5, now).unwrap(),
            "It is currently tick 5 (0m ago - Mon 03/06 14:00)"
        );
        assert_eq!(
            clock.describe(2, now).unwrap(),
            "Tick 2 was 3 ticks ago (3h 0m ago - Mon 03/06 11:00)"
        );
    }

    #[test]
    fn test_describe_last_tick() {
        let clock = clock_with(&[(1, 10), (2, 11)]);
        assert!(clock
            .describe(1, at(11))
            .unwrap()
            .starts_with("Last tick was 1 "));
    }
}
