//! Damage, healing and shield-boost rolls.
//!
//! A move's base value is turned into an inclusive [`RollRange`] by
//! [`calculate_range`], then [`roll`] draws a value inside it. The same pair of
//! functions serves damage, PP-steal, shield-boost and healing moves.
//!
//! - Higher mastery widens the spread below the maximum.
//! - Higher move level raises the maximum (and with it the whole range).
//! - Move level, mastery and actor level raise the roll floor inside the range.

use crate::config::RollTuning;
use crate::rng::{BattleRng, RollContext};

/// Inclusive range a roll is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollRange {
    pub min: u32,
    pub max: u32,
}

impl RollRange {
    pub const ZERO: Self = Self { min: 0, max: 0 };

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn spread(&self) -> u32 {
        self.max - self.min
    }
}

/// A rolled value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roll {
    pub value: u32,
    /// True exactly when `value` equals the range maximum.
    pub is_max_roll: bool,
}

fn percent_of(value: u32, percent: u32) -> u32 {
    (value as u64 * percent as u64 / 100).min(u32::MAX as u64) as u32
}

/// Compute the roll range for a base value.
pub fn calculate_range(
    base: u32,
    move_level: u32,
    mastery_level: u32,
    tuning: &RollTuning,
) -> RollRange {
    if base == 0 {
        return RollRange::ZERO;
    }

    let level_bonus = move_level
        .saturating_sub(1)
        .saturating_mul(tuning.move_level_bonus_percent);
    let max = base.saturating_add(percent_of(base, level_bonus));

    let spread_percent = mastery_level
        .saturating_mul(tuning.mastery_spread_percent)
        .saturating_add(tuning.base_spread_percent)
        .min(tuning.max_spread_percent)
        .min(100);
    let spread = percent_of(max, spread_percent);

    RollRange {
        min: max - spread,
        max,
    }
}

/// Lowest value [`roll`] can produce for the given levels.
pub fn roll_floor(
    range: RollRange,
    actor_level: u32,
    move_level: u32,
    mastery_level: u32,
    tuning: &RollTuning,
) -> u32 {
    let steps = move_level
        .saturating_sub(1)
        .saturating_add(mastery_level / 2)
        .saturating_add(actor_level / tuning.actor_levels_per_floor_step.max(1));
    let floor_percent = steps
        .saturating_mul(tuning.floor_step_percent)
        .min(tuning.max_floor_percent)
        .min(100);

    range.min + percent_of(range.spread(), floor_percent)
}

/// Roll a value inside `range`.
///
/// The result is always within `[range.min, range.max]`.
pub fn roll(
    range: RollRange,
    actor_level: u32,
    move_level: u32,
    mastery_level: u32,
    tuning: &RollTuning,
    rng: &mut BattleRng,
    context: RollContext,
) -> Roll {
    let floor = roll_floor(range, actor_level, move_level, mastery_level, tuning);
    let value = rng.range(context, floor, range.max);

    Roll {
        value,
        is_max_roll: value == range.max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> RollTuning {
        RollTuning::default()
    }

    #[test]
    fn zero_base_is_zero_range() {
        assert_eq!(calculate_range(0, 5, 5, &tuning()), RollRange::ZERO);
    }

    #[test]
    fn mastery_widens_spread() {
        let low = calculate_range(40, 1, 0, &tuning());
        let high = calculate_range(40, 1, 4, &tuning());

        assert_eq!(low.max, high.max);
        assert!(high.spread() > low.spread());
    }

    #[test]
    fn move_level_raises_range() {
        let base = calculate_range(40, 1, 1, &tuning());
        let upgraded = calculate_range(40, 4, 1, &tuning());

        assert!(upgraded.max > base.max);
        assert!(upgraded.min > base.min);
    }

    #[test]
    fn level_raises_floor() {
        let range = calculate_range(50, 1, 2, &tuning());
        let novice = roll_floor(range, 1, 1, 2, &tuning());
        let veteran = roll_floor(range, 30, 3, 2, &tuning());

        assert!(veteran > novice);
        assert!(veteran <= range.max);
    }

    #[test]
    fn rolls_stay_in_range_and_flag_max() {
        let mut rng = BattleRng::seeded(99);
        let t = tuning();

        for base in [1, 7, 20, 150] {
            for move_level in 1..5 {
                for mastery in 0..5 {
                    for actor_level in [1, 10, 60] {
                        let range = calculate_range(base, move_level, mastery, &t);
                        let rolled = roll(
                            range,
                            actor_level,
                            move_level,
                            mastery,
                            &t,
                            &mut rng,
                            RollContext::Damage,
                        );
                        assert!(range.contains(rolled.value));
                        assert_eq!(rolled.is_max_roll, rolled.value == range.max);
                    }
                }
            }
        }
    }
}
