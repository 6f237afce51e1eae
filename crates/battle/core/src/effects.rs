//! Timed status effects and their per-turn ticks.
//!
//! # Stacking
//!
//! `poison` stacks: every application adds an independent entry. Every other
//! kind replaces an existing entry of the same kind. Applying `cleanse`
//! empties the ledger.
//!
//! # Ticks
//!
//! [`EffectLedger::tick`] runs once per owner turn-start and only *computes*
//! what happened; the engine applies the figures to the owner (clamped) and to
//! drain sources.

use arrayvec::ArrayVec;

use crate::combatant::CombatantId;
use crate::config::BattleConfig;
use crate::rng::{BattleRng, RollContext};

/// Types of status effects.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum EffectKind {
    /// Damage over time, absorbed by shields.
    Burn,
    /// Owner loses its action.
    Stun,
    /// Damage over time straight to the health pool.
    Bleed,
    /// Stacking damage over time, absorbed by shields.
    Poison,
    /// Chance to turn the owner's move on itself.
    Confuse,
    /// Steals resource from the owner and heals the effect's source.
    Drain,
    /// Removes every effect.
    Cleanse,
    /// Owner loses its action.
    Freeze,
}

impl EffectKind {
    /// Multiple simultaneous entries are allowed.
    pub const fn stacks(self) -> bool {
        matches!(self, EffectKind::Poison)
    }

    pub const fn skips_turn(self) -> bool {
        matches!(self, EffectKind::Stun | EffectKind::Freeze)
    }

    /// Damage applied through shields, combined per tick.
    pub const fn is_damage_over_time(self) -> bool {
        matches!(self, EffectKind::Burn | EffectKind::Poison)
    }
}

/// A timed modifier attached to one combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub remaining_turns: u32,
    pub damage_per_turn: u32,
    pub pp_loss_per_turn: u32,
    pub pp_steal_per_turn: u32,
    pub heal_per_turn: u32,
    pub trigger_chance: Option<u8>,
    /// Combatant that applied the effect (drain heals it).
    pub source: Option<CombatantId>,
}

impl ActiveEffect {
    pub fn new(kind: EffectKind, duration: u32) -> Self {
        Self {
            kind,
            remaining_turns: duration,
            damage_per_turn: 0,
            pp_loss_per_turn: 0,
            pp_steal_per_turn: 0,
            heal_per_turn: 0,
            trigger_chance: None,
            source: None,
        }
    }

    pub fn with_damage(mut self, amount: u32) -> Self {
        self.damage_per_turn = amount;
        self
    }

    pub fn with_pp_loss(mut self, amount: u32) -> Self {
        self.pp_loss_per_turn = amount;
        self
    }

    pub fn with_pp_steal(mut self, amount: u32) -> Self {
        self.pp_steal_per_turn = amount;
        self
    }

    pub fn with_heal(mut self, amount: u32) -> Self {
        self.heal_per_turn = amount;
        self
    }

    pub fn with_trigger_chance(mut self, percent: u8) -> Self {
        self.trigger_chance = Some(percent);
        self
    }

    pub fn from_source(mut self, source: CombatantId) -> Self {
        self.source = Some(source);
        self
    }

    /// Amount a drain tick takes from its owner.
    pub fn drain_amount(&self) -> u32 {
        if self.pp_steal_per_turn > 0 {
            self.pp_steal_per_turn
        } else {
            self.damage_per_turn
        }
    }
}

/// Result of adding an effect to a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Added,
    Replaced,
    /// A stacking effect pushed out the oldest entry because the ledger was full.
    Evicted,
    /// `cleanse` removed this many entries.
    Cleansed { removed: usize },
}

/// One effect's contribution to a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectTick {
    pub kind: EffectKind,
    /// Nominal damage attributed to this effect (burn, poison, bleed).
    pub damage: u32,
    /// Nominal resource taken by this effect (drain, PP loss).
    pub resource_loss: u32,
    /// The effect's trigger chance failed this tick.
    pub dormant: bool,
}

/// Drain transfer the engine must settle with the effect's source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrainTick {
    pub source: Option<CombatantId>,
    pub amount: u32,
    /// Explicit heal for the source; zero means "heal by the drained amount".
    pub heal: u32,
}

/// Everything one turn-start tick produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A `stun` or `freeze` is active: the owner's move must not run.
    pub skip_turn: bool,
    /// A `confuse` triggered: the owner's move is turned on itself.
    pub confused: bool,
    /// A `cleanse` entry wiped the ledger instead of ticking.
    pub cleansed: bool,
    pub ticks: Vec<EffectTick>,
    /// Burn + poison, applied once shield-first.
    pub combined_damage: u32,
    /// Bleed, applied straight to the health pool.
    pub bleed_damage: u32,
    /// PP loss without transfer.
    pub resource_loss: u32,
    pub drains: Vec<DrainTick>,
    /// Kinds that reached zero duration this tick.
    pub expired: Vec<EffectKind>,
}

/// Active effects on one combatant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectLedger {
    effects: ArrayVec<ActiveEffect, { BattleConfig::MAX_ACTIVE_EFFECTS }>,
}

impl EffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect following the stacking rules.
    pub fn apply(&mut self, effect: ActiveEffect) -> ApplyOutcome {
        if effect.kind == EffectKind::Cleanse {
            let removed = self.effects.len();
            self.effects.clear();
            return ApplyOutcome::Cleansed { removed };
        }

        if !effect.kind.stacks()
            && let Some(index) = self.effects.iter().position(|e| e.kind == effect.kind)
        {
            self.effects.remove(index);
            self.effects.push(effect);
            return ApplyOutcome::Replaced;
        }

        if self.effects.is_full() {
            self.effects.remove(0);
            self.effects.push(effect);
            return ApplyOutcome::Evicted;
        }

        self.effects.push(effect);
        ApplyOutcome::Added
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn count(&self, kind: EffectKind) -> usize {
        self.effects.iter().filter(|e| e.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    pub fn kinds(&self) -> Vec<EffectKind> {
        self.effects.iter().map(|e| e.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Run one turn-start tick.
    ///
    /// Every effect ticks, then loses one turn of duration; effects at zero
    /// are removed. An active `cleanse` instead removes everything.
    pub fn tick(&mut self, rng: &mut BattleRng, confuse_chance: u8) -> TickReport {
        let mut report = TickReport::default();

        if self.has(EffectKind::Cleanse) {
            self.effects.clear();
            report.cleansed = true;
            return report;
        }

        for effect in self.effects.iter_mut() {
            let chance = match effect.kind {
                EffectKind::Confuse => Some(effect.trigger_chance.unwrap_or(confuse_chance)),
                _ => effect.trigger_chance,
            };
            let triggered = chance.is_none_or(|c| rng.chance(RollContext::EffectTrigger, c));

            let mut tick = EffectTick {
                kind: effect.kind,
                damage: 0,
                resource_loss: 0,
                dormant: !triggered,
            };

            if triggered {
                match effect.kind {
                    EffectKind::Stun | EffectKind::Freeze => report.skip_turn = true,
                    EffectKind::Burn | EffectKind::Poison => {
                        tick.damage = effect.damage_per_turn;
                        report.combined_damage += effect.damage_per_turn;
                    }
                    EffectKind::Bleed => {
                        tick.damage = effect.damage_per_turn;
                        report.bleed_damage += effect.damage_per_turn;
                    }
                    EffectKind::Drain => {
                        let amount = effect.drain_amount();
                        tick.resource_loss = amount;
                        report.drains.push(DrainTick {
                            source: effect.source.clone(),
                            amount,
                            heal: effect.heal_per_turn,
                        });
                    }
                    EffectKind::Confuse => report.confused = true,
                    EffectKind::Cleanse => {}
                }

                if effect.pp_loss_per_turn > 0 {
                    tick.resource_loss += effect.pp_loss_per_turn;
                    report.resource_loss += effect.pp_loss_per_turn;
                }
            }

            effect.remaining_turns = effect.remaining_turns.saturating_sub(1);
            if effect.remaining_turns == 0 {
                report.expired.push(effect.kind);
            }
            report.ticks.push(tick);
        }

        self.effects.retain(|e| e.remaining_turns > 0);
        report
    }
}

impl FromIterator<ActiveEffect> for EffectLedger {
    fn from_iter<T: IntoIterator<Item = ActiveEffect>>(iter: T) -> Self {
        let mut ledger = Self::new();
        for effect in iter {
            ledger.apply(effect);
        }
        ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> BattleRng {
        BattleRng::seeded(5)
    }

    #[test]
    fn poison_stacks_burn_replaces() {
        let mut ledger = EffectLedger::new();

        ledger.apply(ActiveEffect::new(EffectKind::Poison, 3).with_damage(2));
        ledger.apply(ActiveEffect::new(EffectKind::Poison, 3).with_damage(2));
        assert_eq!(ledger.count(EffectKind::Poison), 2);

        ledger.apply(ActiveEffect::new(EffectKind::Burn, 3).with_damage(4));
        let outcome = ledger.apply(ActiveEffect::new(EffectKind::Burn, 5).with_damage(9));
        assert_eq!(outcome, ApplyOutcome::Replaced);
        assert_eq!(ledger.count(EffectKind::Burn), 1);

        let burn = ledger
            .iter()
            .find(|e| e.kind == EffectKind::Burn)
            .expect("burn present");
        assert_eq!(burn.damage_per_turn, 9);
        assert_eq!(burn.remaining_turns, 5);
    }

    #[test]
    fn cleanse_empties_any_ledger() {
        for n in 0..=BattleConfig::MAX_ACTIVE_EFFECTS {
            let mut ledger: EffectLedger = (0..n)
                .map(|_| ActiveEffect::new(EffectKind::Poison, 2))
                .collect();
            assert_eq!(ledger.len(), n);

            let outcome = ledger.apply(ActiveEffect::new(EffectKind::Cleanse, 1));
            assert_eq!(outcome, ApplyOutcome::Cleansed { removed: n });
            assert!(ledger.is_empty());
        }
    }

    #[test]
    fn full_ledger_evicts_oldest() {
        let mut ledger = EffectLedger::new();
        ledger.apply(ActiveEffect::new(EffectKind::Stun, 1));
        for _ in 1..BattleConfig::MAX_ACTIVE_EFFECTS {
            ledger.apply(ActiveEffect::new(EffectKind::Poison, 4));
        }

        let outcome = ledger.apply(ActiveEffect::new(EffectKind::Poison, 4));
        assert_eq!(outcome, ApplyOutcome::Evicted);
        assert!(!ledger.has(EffectKind::Stun));
        assert_eq!(ledger.len(), BattleConfig::MAX_ACTIVE_EFFECTS);
    }

    #[test]
    fn duration_counts_down_to_removal() {
        let mut ledger = EffectLedger::new();
        ledger.apply(ActiveEffect::new(EffectKind::Burn, 3).with_damage(1));
        let mut rng = rng();

        for expected in [2, 1] {
            let report = ledger.tick(&mut rng, 50);
            assert!(report.expired.is_empty());
            assert_eq!(ledger.iter().next().map(|e| e.remaining_turns), Some(expected));
        }

        let report = ledger.tick(&mut rng, 50);
        assert_eq!(report.expired, vec![EffectKind::Burn]);
        assert!(ledger.is_empty());
    }

    #[test]
    fn tick_combines_dot_and_separates_bleed() {
        let mut ledger = EffectLedger::new();
        ledger.apply(ActiveEffect::new(EffectKind::Burn, 2).with_damage(10));
        ledger.apply(ActiveEffect::new(EffectKind::Poison, 2).with_damage(3));
        ledger.apply(ActiveEffect::new(EffectKind::Poison, 2).with_damage(4));
        ledger.apply(ActiveEffect::new(EffectKind::Bleed, 2).with_damage(6));

        let report = ledger.tick(&mut rng(), 50);

        assert_eq!(report.combined_damage, 17);
        assert_eq!(report.bleed_damage, 6);
        assert_eq!(report.ticks.len(), 4);
        assert!(!report.skip_turn);
    }

    #[test]
    fn stun_and_freeze_skip() {
        for kind in [EffectKind::Stun, EffectKind::Freeze] {
            let mut ledger = EffectLedger::new();
            ledger.apply(ActiveEffect::new(kind, 1));
            let report = ledger.tick(&mut rng(), 50);
            assert!(report.skip_turn);
            assert_eq!(report.expired, vec![kind]);
        }
    }

    #[test]
    fn drain_reports_source() {
        let mut ledger = EffectLedger::new();
        ledger.apply(
            ActiveEffect::new(EffectKind::Drain, 2)
                .with_pp_steal(5)
                .with_heal(3)
                .from_source(CombatantId::from("vampire")),
        );

        let report = ledger.tick(&mut rng(), 50);
        assert_eq!(
            report.drains,
            vec![DrainTick {
                source: Some(CombatantId::from("vampire")),
                amount: 5,
                heal: 3,
            }]
        );
    }

    #[test]
    fn active_cleanse_wipes_instead_of_ticking() {
        let mut ledger = EffectLedger::new();
        ledger.apply(ActiveEffect::new(EffectKind::Burn, 2).with_damage(10));
        // Restored ledgers can carry a cleanse entry directly.
        ledger.effects.push(ActiveEffect::new(EffectKind::Cleanse, 2));

        let report = ledger.tick(&mut rng(), 50);
        assert!(report.cleansed);
        assert_eq!(report.combined_damage, 0);
        assert!(ledger.is_empty());
    }
}
