//! Combat-balance formulas.
//!
//! Pure functions over an attacker and a target, used to estimate how much
//! an attack can capture and how worthwhile it is. Any entity, current
//! record or snapshot can take part through [`Combatant`].
//!
//! All arithmetic is `f64`; a zero denominator is reported as
//! [`StarchartError::DivisionUndefined`] instead of producing infinity.

use crate::catalog::Record;
use crate::config::CaptureConstants;
use crate::entities::{Alliance, Cluster, Galaxy, Planet, Stats, UniverseEntity};
use crate::error::{Result, StarchartError};
use crate::history::Snapshot;

/// Lower bound of both bravery factors.
const BRAVERY_FLOOR: f64 = 0.2;
/// Cap on the score ratio before the bravery offset.
const SCORE_RATIO_CAP: f64 = 2.2;
/// Cap on the value ratio before the bravery offset.
const VALUE_RATIO_CAP: f64 = 1.8;
/// Resources an agent can move per point of target value, relative to the attacker.
const RESOURCES_PER_VALUE: i64 = 2000;

/// Anything carrying size, score and value.
pub trait Combatant {
    /// Asteroid count.
    fn size(&self) -> i64;
    /// Score.
    fn score(&self) -> i64;
    /// Value.
    fn value(&self) -> i64;
}

impl Combatant for Stats {
    fn size(&self) -> i64 {
        self.size.amount
    }

    fn score(&self) -> i64 {
        self.score.amount
    }

    fn value(&self) -> i64 {
        self.value.amount
    }
}

macro_rules! combatant_via_stats {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Combatant for $ty {
                fn size(&self) -> i64 {
                    self.stats().size()
                }

                fn score(&self) -> i64 {
                    self.stats().score()
                }

                fn value(&self) -> i64 {
                    self.stats().value()
                }
            }
        )*
    };
}

combatant_via_stats!(Cluster, Galaxy, Planet, Alliance);

impl<E: UniverseEntity> Combatant for Record<E> {
    fn size(&self) -> i64 {
        self.state.stats().size()
    }

    fn score(&self) -> i64 {
        self.state.stats().score()
    }

    fn value(&self) -> i64 {
        self.state.stats().value()
    }
}

impl<E: UniverseEntity> Combatant for Snapshot<E> {
    fn size(&self) -> i64 {
        self.state.stats().size()
    }

    fn score(&self) -> i64 {
        self.state.stats().score()
    }

    fn value(&self) -> i64 {
        self.state.stats().value()
    }
}

fn ratio(numerator: i64, denominator: i64, name: &'static str) -> Result<f64> {
    if denominator == 0 {
        return Err(StarchartError::DivisionUndefined(name));
    }
    Ok(numerator as f64 / denominator as f64)
}

/// Combat formulas bound to a set of capture constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatMetrics {
    constants: CaptureConstants,
}

impl CombatMetrics {
    /// Bind the formulas to configured constants.
    #[must_use]
    pub const fn new(constants: CaptureConstants) -> Self {
        Self { constants }
    }

    /// The constants in use.
    #[must_use]
    pub const fn constants(&self) -> &CaptureConstants {
        &self.constants
    }

    /// How brave an attack is: high when the target is bigger than the attacker.
    pub fn bravery(&self, attacker: &dyn Combatant, target: &dyn Combatant) -> Result<f64> {
        let score_ratio = ratio(target.score(), attacker.score(), "attacker score")?;
        let value_ratio = ratio(target.value(), attacker.value(), "attacker value")?;
        let attacker_ratio = ratio(attacker.score(), attacker.value(), "attacker value")?;

        let score_factor = (score_ratio.min(SCORE_RATIO_CAP) - 0.2).max(BRAVERY_FLOOR);
        let value_factor = (value_ratio.min(VALUE_RATIO_CAP) - 0.1).max(BRAVERY_FLOOR);
        let divisor = (6.0 + attacker_ratio.max(4.0)) / 10.0;

        Ok(score_factor * value_factor / divisor)
    }

    /// Fraction of the target's roids an attack can capture.
    ///
    /// Without an attacker, or against a target with no value, this is the
    /// configured maximum.
    pub fn capture_rate(&self, target: &dyn Combatant, attacker: Option<&dyn Combatant>) -> Result<f64> {
        let max = self.constants.max_capture_rate;
        let Some(attacker) = attacker else {
            return Ok(max);
        };
        if target.value() == 0 {
            return Ok(max);
        }

        let modifier = ratio(target.value(), attacker.value(), "attacker value")?.sqrt();
        Ok((max * modifier).min(max).max(self.constants.min_capture_rate))
    }

    /// Roids an attack can capture.
    pub fn max_capture(&self, target: &dyn Combatant, attacker: Option<&dyn Combatant>) -> Result<i64> {
        let rate = self.capture_rate(target, attacker)?;
        Ok((target.size() as f64 * rate).floor() as i64)
    }

    /// Experience gained for capturing `cap` roids, or the maximum capture
    /// when `cap` is absent or zero.
    pub fn estimated_xp(
        &self,
        attacker: &dyn Combatant,
        target: &dyn Combatant,
        cap: Option<i64>,
    ) -> Result<i64> {
        let cap = match cap.filter(|&c| c != 0) {
            Some(cap) => cap,
            None => self.max_capture(target, Some(attacker))?,
        };
        let bravery = self.bravery(attacker, target)?;
        Ok((cap as f64 * bravery * 10.0).floor() as i64)
    }

    /// Resources one agent can steal, capped by configuration.
    ///
    /// Fails when the attacker value is zero or the division overflows.
    pub fn resources_per_agent(&self, attacker: &dyn Combatant, target: &dyn Combatant) -> Result<i64> {
        let uncapped = target
            .value()
            .saturating_mul(RESOURCES_PER_VALUE)
            .checked_div_euclid(attacker.value())
            .ok_or(StarchartError::DivisionUndefined("attacker value"))?;
        Ok(uncapped.min(self.constants.resource_cap_per_agent))
    }
}
