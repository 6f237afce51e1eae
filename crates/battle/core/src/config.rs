/// Battle configuration constants and tunable balance parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Damage/heal/shield roll curve.
    pub roll: RollTuning,
    /// Percent of max health at or below which an awakening opponent fires its
    /// one-shot trigger.
    pub awakening_threshold_percent: u32,
    /// Trigger chance used by `confuse` effects that carry no chance of their own.
    pub confuse_chance_percent: u8,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of simultaneous effects tracked per combatant.
    pub const MAX_ACTIVE_EFFECTS: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_AWAKENING_THRESHOLD_PERCENT: u32 = 50;
    pub const DEFAULT_CONFUSE_CHANCE_PERCENT: u8 = 50;

    pub fn new() -> Self {
        Self {
            roll: RollTuning::default(),
            awakening_threshold_percent: Self::DEFAULT_AWAKENING_THRESHOLD_PERCENT,
            confuse_chance_percent: Self::DEFAULT_CONFUSE_CHANCE_PERCENT,
        }
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Balance curve for [`crate::roll`].
///
/// ```text
/// max    = base + base * (move_level - 1) * move_level_bonus_percent / 100
/// spread = max * min(base_spread + mastery * mastery_spread, max_spread) / 100
/// min    = max - spread
/// floor  = min + spread * min(steps * floor_step, max_floor) / 100
/// steps  = (move_level - 1) + mastery / 2 + actor_level / actor_levels_per_floor_step
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollTuning {
    pub move_level_bonus_percent: u32,
    pub base_spread_percent: u32,
    pub mastery_spread_percent: u32,
    pub max_spread_percent: u32,
    pub floor_step_percent: u32,
    pub actor_levels_per_floor_step: u32,
    pub max_floor_percent: u32,
}

impl Default for RollTuning {
    fn default() -> Self {
        Self {
            move_level_bonus_percent: 10,
            base_spread_percent: 20,
            mastery_spread_percent: 10,
            max_spread_percent: 80,
            floor_step_percent: 5,
            actor_levels_per_floor_step: 5,
            max_floor_percent: 50,
        }
    }
}
