//! Move definitions.
//!
//! A move may carry several effect fields at once (damage, PP steal, shield
//! boost, healing, status effects, a defensive stance). Resolution order is
//! fixed by the engine, not by the move.

use core::fmt;

use crate::combatant::CombatantId;
use crate::effects::{ActiveEffect, EffectKind};
use crate::stance::StanceSpec;

/// Stable identifier of a move definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct MoveId(pub String);

impl MoveId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MoveId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Broad category of a move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveKind {
    #[default]
    Attack,
    Defense,
    Support,
}

/// Who a status effect lands on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectTarget {
    #[default]
    Opponent,
    User,
}

/// Status effect carried by a move, applied when its success chance rolls.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatusEffectSpec {
    pub kind: EffectKind,
    pub duration: u32,
    /// Percent chance the effect lands (100 = always).
    pub success_chance: u8,
    pub damage_per_turn: u32,
    pub pp_loss_per_turn: u32,
    pub pp_steal_per_turn: u32,
    pub heal_per_turn: u32,
    pub trigger_chance: Option<u8>,
    pub target: EffectTarget,
}

impl StatusEffectSpec {
    pub fn new(kind: EffectKind, duration: u32) -> Self {
        Self {
            kind,
            duration,
            ..Self::default()
        }
    }

    pub fn with_chance(mut self, success_chance: u8) -> Self {
        self.success_chance = success_chance;
        self
    }

    pub fn with_damage_per_turn(mut self, amount: u32) -> Self {
        self.damage_per_turn = amount;
        self
    }

    pub fn with_pp_steal_per_turn(mut self, amount: u32) -> Self {
        self.pp_steal_per_turn = amount;
        self
    }

    pub fn with_heal_per_turn(mut self, amount: u32) -> Self {
        self.heal_per_turn = amount;
        self
    }

    pub fn on_user(mut self) -> Self {
        self.target = EffectTarget::User;
        self
    }

    /// Build the ledger entry this spec produces when it lands.
    pub fn instantiate(&self, source: &CombatantId) -> ActiveEffect {
        ActiveEffect {
            kind: self.kind,
            remaining_turns: self.duration,
            damage_per_turn: self.damage_per_turn,
            pp_loss_per_turn: self.pp_loss_per_turn,
            pp_steal_per_turn: self.pp_steal_per_turn,
            heal_per_turn: self.heal_per_turn,
            trigger_chance: self.trigger_chance,
            source: Some(source.clone()),
        }
    }
}

impl Default for StatusEffectSpec {
    fn default() -> Self {
        Self {
            kind: EffectKind::Burn,
            duration: 1,
            success_chance: 100,
            damage_per_turn: 0,
            pp_loss_per_turn: 0,
            pp_steal_per_turn: 0,
            heal_per_turn: 0,
            trigger_chance: None,
            target: EffectTarget::Opponent,
        }
    }
}

/// Definition of an action a combatant can take.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Move {
    pub id: MoveId,
    pub name: String,
    pub kind: MoveKind,
    pub damage: u32,
    pub pp_steal: u32,
    pub shield_boost: u32,
    pub healing: u32,
    pub level: u32,
    pub mastery_level: u32,
    /// Higher priority acts first in multiplayer rounds.
    pub priority: i32,
    pub status_effects: Vec<StatusEffectSpec>,
    /// Turns the move stays unavailable after use.
    pub cooldown: Option<u32>,
    pub stance: Option<StanceSpec>,
}

impl Move {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: MoveId::new(id),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Convenience constructor for a plain damaging move.
    pub fn attack(id: impl Into<String>, name: impl Into<String>, damage: u32) -> Self {
        Self::new(id, name).with_damage(damage)
    }

    pub fn with_kind(mut self, kind: MoveKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_pp_steal(mut self, amount: u32) -> Self {
        self.pp_steal = amount;
        self
    }

    pub fn with_shield_boost(mut self, amount: u32) -> Self {
        self.shield_boost = amount;
        self
    }

    pub fn with_healing(mut self, amount: u32) -> Self {
        self.healing = amount;
        self
    }

    pub fn with_levels(mut self, level: u32, mastery_level: u32) -> Self {
        self.level = level;
        self.mastery_level = mastery_level;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, spec: StatusEffectSpec) -> Self {
        self.status_effects.push(spec);
        self
    }

    pub fn with_cooldown(mut self, turns: u32) -> Self {
        self.cooldown = Some(turns);
        self
    }

    pub fn with_stance(mut self, stance: StanceSpec) -> Self {
        self.kind = MoveKind::Defense;
        self.stance = Some(stance);
        self
    }
}

impl Default for Move {
    fn default() -> Self {
        Self {
            id: MoveId::new(""),
            name: String::new(),
            kind: MoveKind::Attack,
            damage: 0,
            pp_steal: 0,
            shield_boost: 0,
            healing: 0,
            level: 1,
            mastery_level: 1,
            priority: 0,
            status_effects: Vec::new(),
            cooldown: None,
            stance: None,
        }
    }
}

/// A catalog value that may be stored either as a scalar or as a legacy range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum MoveValue {
    Scalar(u32),
    Range { min: u32, max: u32 },
}

impl MoveValue {
    /// Scalar form of the value. Ranges normalize to their maximum.
    pub fn normalized(&self) -> u32 {
        match *self {
            MoveValue::Scalar(value) => value,
            MoveValue::Range { min, max } => min.max(max),
        }
    }
}

impl Default for MoveValue {
    fn default() -> Self {
        MoveValue::Scalar(0)
    }
}

impl From<u32> for MoveValue {
    fn from(value: u32) -> Self {
        MoveValue::Scalar(value)
    }
}
