//! Resolution of a single combatant's turn.
//!
//! Fixed order: turn-start effect tick, then (unless skipped) primary damage
//! with stance reduction and counters, PP steal, shield boost, healing and
//! finally status effects. Victory is checked after every step that can
//! deplete a health pool.

use crate::combatant::Side;
use crate::effects::ApplyOutcome;
use crate::moves::{EffectTarget, Move, MoveId};
use crate::rng::RollContext;
use crate::roll::{Roll, calculate_range, roll};
use crate::stance::{AttackOutcome, DefensiveStance};

use super::{BattleEvent, BattleSession, Step};

impl BattleSession {
    /// Run one combatant's full turn against `target`.
    pub(super) fn take_turn(
        &mut self,
        actor: usize,
        move_id: &MoveId,
        target: usize,
        step: &mut Step,
    ) {
        let tick = self.tick_effects(actor, step);
        if self.check_outcome(step) {
            return;
        }
        if self.combatants[actor].is_defeated() {
            return;
        }

        if tick.skip_turn {
            let name = self.combatants[actor].name.clone();
            self.push_log(step, format!("{name} is unable to act!"));
            self.end_turn(actor, None, step);
            return;
        }

        let Some(mv) = self.combatants[actor].find_move(move_id).cloned() else {
            let name = self.combatants[actor].name.clone();
            self.push_log(step, format!("{name} hesitates."));
            self.end_turn(actor, None, step);
            return;
        };

        let target = if tick.confused {
            let name = self.combatants[actor].name.clone();
            self.push_log(step, format!("{name} is confused and turns on itself!"));
            actor
        } else {
            target
        };

        self.resolve_move(actor, target, &mv, step);
        self.end_turn(actor, Some(&mv), step);
    }

    fn roll_value(&mut self, actor: usize, base: u32, mv: &Move, context: RollContext) -> Roll {
        let range = calculate_range(base, mv.level, mv.mastery_level, &self.config.roll);
        roll(
            range,
            self.combatants[actor].level,
            mv.level,
            mv.mastery_level,
            &self.config.roll,
            &mut self.rng,
            context,
        )
    }

    /// Apply a move's numeric effects. Returns early if the battle ends.
    pub(super) fn resolve_move(&mut self, actor: usize, target: usize, mv: &Move, step: &mut Step) {
        let actor_name = self.combatants[actor].name.clone();
        let target_name = self.combatants[target].name.clone();
        self.push_log(step, format!("{actor_name} uses {}!", mv.name));

        if let Some(spec) = &mv.stance {
            self.combatants[actor].stance = Some(DefensiveStance::from_spec(spec));
            self.touch(step, actor);
            self.push_log(step, format!("{actor_name} takes a {} stance.", spec.name));
        }

        // (a) primary damage
        if mv.damage > 0 {
            let rolled = self.roll_value(actor, mv.damage, mv, RollContext::Damage);
            let reduced = match &self.combatants[target].stance {
                Some(stance) if target != actor => stance.reduce(rolled.value),
                _ => rolled.value,
            };
            let report = self.combatants[target].take_damage(reduced);
            self.touch(step, target);

            let flair = if rolled.is_max_roll { " MAX DAMAGE!" } else { "" };
            self.push_log(
                step,
                format!(
                    "{actor_name}'s {} deals {} damage to {target_name}.{flair}",
                    mv.name,
                    report.total()
                ),
            );
            if reduced < rolled.value {
                self.push_log(
                    step,
                    format!("{target_name}'s stance blocks {}.", rolled.value - reduced),
                );
            }
            if report.shield_damage > 0 {
                self.push_log(
                    step,
                    format!("{target_name}'s shield absorbs {}.", report.shield_damage),
                );
            }
            if report.shield_broken {
                self.push_log(step, format!("{target_name}'s shield shatters!"));
            }
            self.check_awakening(step);

            let outcome = AttackOutcome {
                raw_damage: rolled.value,
                reduced_damage: reduced,
                report,
                is_max_roll: rolled.is_max_roll,
            };
            let counter = match &self.combatants[target].stance {
                Some(stance) if target != actor && !self.combatants[target].is_defeated() => {
                    stance.counter_for(&outcome).map(|dmg| (stance.name.clone(), dmg))
                }
                _ => None,
            };
            if let Some((stance_name, damage)) = counter {
                let dealt = self.combatants[actor].take_damage(damage).total();
                self.touch(step, actor);
                self.push_log(
                    step,
                    format!("{target_name}'s {stance_name} counters for {dealt} damage!"),
                );
                self.check_awakening(step);
            }

            if self.check_outcome(step) {
                return;
            }
        }

        // (b) PP steal
        if mv.pp_steal > 0 {
            let rolled = self.roll_value(actor, mv.pp_steal, mv, RollContext::PpSteal);
            let stolen = self.combatants[target].drain_resource(rolled.value);
            self.touch(step, target);
            if stolen > 0 {
                self.push_log(
                    step,
                    format!("{actor_name} steals {stolen} PP from {target_name}."),
                );
                self.credit_steal(actor, stolen, step);
            }
            self.check_awakening(step);
            if self.check_outcome(step) {
                return;
            }
        }

        // (c) shield boost
        if mv.shield_boost > 0 {
            let rolled = self.roll_value(actor, mv.shield_boost, mv, RollContext::ShieldBoost);
            let added = self.combatants[actor].boost_shield(rolled.value);
            self.touch(step, actor);
            self.push_log(step, format!("{actor_name}'s shield grows by {added}."));
        }

        // (d) healing
        if mv.healing > 0 {
            let rolled = self.roll_value(actor, mv.healing, mv, RollContext::Healing);
            let healed = self.combatants[actor].heal(rolled.value);
            self.touch(step, actor);
            self.push_log(step, format!("{actor_name} recovers {healed} health."));
        }

        // (e) status effects
        for spec in &mv.status_effects {
            let recipient = match spec.target {
                EffectTarget::Opponent => target,
                EffectTarget::User => actor,
            };
            let recipient_name = self.combatants[recipient].name.clone();

            if !self.rng.chance(RollContext::StatusChance, spec.success_chance) {
                self.push_log(step, format!("{recipient_name} resisted {}!", spec.kind));
                continue;
            }

            let source = self.combatants[actor].id.clone();
            let outcome = self.combatants[recipient]
                .effects
                .apply(spec.instantiate(&source));
            self.touch(step, recipient);
            let line = match outcome {
                ApplyOutcome::Cleansed { removed } => {
                    format!("{recipient_name} is cleansed of {removed} effect(s).")
                }
                _ => format!("{recipient_name} is afflicted with {}!", spec.kind),
            };
            self.push_log(step, line);
        }
    }

    /// Stolen PP: banked until victory for the local side, kept by anyone else.
    fn credit_steal(&mut self, actor: usize, amount: u32, step: &mut Step) {
        if self.combatants[actor].side == Side::Ally {
            self.state.pending_pp = self.state.pending_pp.saturating_add(amount);
            step.events.push(BattleEvent::RewardBanked {
                amount,
                total: self.state.pending_pp,
            });
        } else {
            self.combatants[actor].gain_power_points(amount);
            self.touch(step, actor);
        }
    }

    /// Bookkeeping once the actor's turn has fully resolved.
    pub(super) fn end_turn(&mut self, actor: usize, used: Option<&Move>, step: &mut Step) {
        let combatant = &mut self.combatants[actor];
        combatant.tick_cooldowns();
        if let Some(mv) = used {
            combatant.start_cooldown(mv);
        }

        let held = combatant.stance.is_some();
        let expired = match combatant.stance.as_mut() {
            Some(stance) => stance.end_owner_turn().then(|| stance.name.clone()),
            None => None,
        };
        if let Some(stance_name) = expired {
            combatant.stance = None;
            let name = combatant.name.clone();
            self.push_log(step, format!("{name}'s {stance_name} stance fades."));
        }
        // The countdown changed even when the stance holds.
        if held {
            self.touch(step, actor);
        }
    }
}
