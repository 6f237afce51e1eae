//! Defensive stances granted by defense moves.
//!
//! A stance reduces incoming primary damage (flat first, then percentage) and
//! may strike back when the reduced attack matches its counter condition.

use crate::combatant::DamageReport;

/// When a stance's counter-attack fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CounterCondition {
    /// Any attack that reaches the defender.
    Always,
    /// The attack got through to the health pool.
    OnHealthDamage,
    /// The attack emptied the defender's shield.
    OnShieldBreak,
    /// The attacker rolled the maximum of its range.
    OnMaxRoll,
    /// Post-reduction damage was at least this much.
    DamageAtLeast(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CounterAttack {
    pub condition: CounterCondition,
    pub damage: u32,
}

/// Stance definition carried by a move.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StanceSpec {
    pub name: String,
    pub flat_reduction: u32,
    pub percent_reduction: u8,
    pub counter: Option<CounterAttack>,
    /// Number of opposing turns the stance protects for.
    pub duration: u32,
}

impl StanceSpec {
    pub fn new(name: impl Into<String>, duration: u32) -> Self {
        Self {
            name: name.into(),
            duration,
            ..Self::default()
        }
    }

    pub fn with_flat_reduction(mut self, amount: u32) -> Self {
        self.flat_reduction = amount;
        self
    }

    pub fn with_percent_reduction(mut self, percent: u8) -> Self {
        self.percent_reduction = percent.min(100);
        self
    }

    pub fn with_counter(mut self, condition: CounterCondition, damage: u32) -> Self {
        self.counter = Some(CounterAttack { condition, damage });
        self
    }
}

impl Default for StanceSpec {
    fn default() -> Self {
        Self {
            name: String::from("Guard"),
            flat_reduction: 0,
            percent_reduction: 0,
            counter: None,
            duration: 1,
        }
    }
}

/// What a stance saw of the attack it received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackOutcome {
    pub raw_damage: u32,
    pub reduced_damage: u32,
    pub report: DamageReport,
    pub is_max_roll: bool,
}

/// An active stance on a combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefensiveStance {
    pub name: String,
    pub flat_reduction: u32,
    pub percent_reduction: u8,
    pub counter: Option<CounterAttack>,
    pub remaining_turns: u32,
    /// Set while the turn that raised the stance is still resolving.
    fresh: bool,
}

impl DefensiveStance {
    pub fn from_spec(spec: &StanceSpec) -> Self {
        Self {
            name: spec.name.clone(),
            flat_reduction: spec.flat_reduction,
            percent_reduction: spec.percent_reduction.min(100),
            counter: spec.counter,
            remaining_turns: spec.duration.max(1),
            fresh: true,
        }
    }

    /// Damage left after flat then percentage reduction.
    pub fn reduce(&self, damage: u32) -> u32 {
        let after_flat = damage.saturating_sub(self.flat_reduction);
        let cut = (after_flat as u64 * self.percent_reduction as u64 / 100) as u32;
        after_flat - cut
    }

    /// Counter damage to deal back, if the outcome matches the condition.
    pub fn counter_for(&self, outcome: &AttackOutcome) -> Option<u32> {
        let counter = self.counter?;
        let matched = match counter.condition {
            CounterCondition::Always => true,
            CounterCondition::OnHealthDamage => outcome.report.health_damage > 0,
            CounterCondition::OnShieldBreak => outcome.report.shield_broken,
            CounterCondition::OnMaxRoll => outcome.is_max_roll,
            CounterCondition::DamageAtLeast(threshold) => outcome.reduced_damage >= threshold,
        };
        (matched && counter.damage > 0).then_some(counter.damage)
    }

    /// Record that the owning side finished a turn.
    ///
    /// Returns true when the stance has run out and should be removed.
    pub fn end_owner_turn(&mut self) -> bool {
        if self.fresh {
            self.fresh = false;
            return false;
        }
        self.remaining_turns = self.remaining_turns.saturating_sub(1);
        self.remaining_turns == 0
    }
}
