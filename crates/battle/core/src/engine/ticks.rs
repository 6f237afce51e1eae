//! Turn-start effect ticks applied to combatants.

use crate::combatant::CombatantId;
use crate::effects::{EffectKind, TickReport};
use crate::error::BattleError;

use super::{BattleSession, Step, TurnReport};

impl BattleSession {
    /// Tick one combatant's effects outside the normal turn flow.
    ///
    /// The regular transitions already tick every actor exactly once before
    /// its move; this is for hosts driving their own sequencing.
    pub fn apply_turn_start_effects(
        &mut self,
        combatant: &CombatantId,
    ) -> Result<TurnReport, BattleError> {
        self.ensure_active()?;
        let index = self
            .index_of(combatant)
            .ok_or_else(|| BattleError::UnknownCombatant(combatant.clone()))?;

        let mut step = Step::default();
        self.tick_effects(index, &mut step);
        self.check_outcome(&mut step);
        Ok(self.finish(step))
    }

    /// Run the ledger tick and settle its figures against the pools.
    pub(super) fn tick_effects(&mut self, index: usize, step: &mut Step) -> TickReport {
        if self.combatants[index].effects.is_empty() {
            return TickReport::default();
        }

        let confuse_chance = self.config.confuse_chance_percent;
        let report = self.combatants[index]
            .effects
            .tick(&mut self.rng, confuse_chance);
        self.touch(step, index);
        let name = self.combatants[index].name.clone();

        if report.cleansed {
            self.push_log(step, format!("{name}'s effects are washed away."));
            return report;
        }

        let mut seen: Vec<EffectKind> = Vec::with_capacity(report.ticks.len());
        for tick in &report.ticks {
            seen.push(tick.kind);
            if tick.dormant || tick.damage == 0 {
                continue;
            }
            // Stacked entries of one kind get an ordinal so each line survives dedupe.
            let ordinal = seen.iter().filter(|&&kind| kind == tick.kind).count();
            let stack = if ordinal > 1 {
                format!(" (#{ordinal})")
            } else {
                String::new()
            };
            match tick.kind {
                EffectKind::Burn | EffectKind::Poison => {
                    self.push_log(
                        step,
                        format!("{name} takes {} {} damage{stack}.", tick.damage, tick.kind),
                    );
                }
                EffectKind::Bleed => {
                    self.push_log(step, format!("{name} bleeds for {} damage{stack}.", tick.damage));
                }
                _ => {}
            }
        }

        if report.combined_damage > 0 {
            self.combatants[index].take_damage(report.combined_damage);
        }
        if report.bleed_damage > 0 {
            self.combatants[index].take_direct_damage(report.bleed_damage);
        }
        if report.resource_loss > 0 {
            let lost = self.combatants[index].drain_resource(report.resource_loss);
            if lost > 0 {
                self.push_log(step, format!("{name} loses {lost} PP."));
            }
        }

        for drain in &report.drains {
            let taken = self.combatants[index].drain_resource(drain.amount);
            let heal = if drain.heal > 0 { drain.heal } else { taken };
            let source = drain
                .source
                .as_ref()
                .and_then(|id| self.index_of(id))
                .filter(|&i| !self.combatants[i].is_defeated());
            match source {
                Some(source) => {
                    let healed = self.combatants[source].heal(heal);
                    self.touch(step, source);
                    let source_name = self.combatants[source].name.clone();
                    self.push_log(
                        step,
                        format!("{source_name} drains {taken} from {name} and recovers {healed}."),
                    );
                }
                None => self.push_log(step, format!("{name} is drained of {taken}.")),
            }
        }

        for kind in &report.expired {
            self.push_log(step, format!("{name}'s {kind} has worn off."));
        }

        self.check_awakening(step);
        report
    }
}

#[cfg(test)]
mod tests {
    use crate::combatant::CombatantId;
    use crate::effects::{ActiveEffect, EffectKind};
    use crate::engine::fixtures::cpu_session;

    #[test]
    fn burn_ticks_shield_first_and_counts_down() {
        let mut session = cpu_session();
        let goblin = CombatantId::from("goblin");
        let index = session.index_of(&goblin).expect("goblin");
        session.combatants[index]
            .effects
            .apply(ActiveEffect::new(EffectKind::Burn, 2).with_damage(10));

        let report = session
            .apply_turn_start_effects(&goblin)
            .expect("active battle");

        let goblin = session.combatant(&goblin).expect("goblin");
        assert_eq!(goblin.shield(), 5);
        assert_eq!(goblin.health(), 100);
        assert_eq!(goblin.effects.iter().next().map(|e| e.remaining_turns), Some(1));
        assert_eq!(
            report
                .log_lines
                .iter()
                .filter(|l| l.contains("burn damage"))
                .count(),
            1
        );
        assert!(!report.log_lines.iter().any(|l| l.contains("worn off")));
    }

    #[test]
    fn equal_poison_stacks_each_get_a_line() {
        let mut session = cpu_session();
        let goblin = CombatantId::from("goblin");
        let index = session.index_of(&goblin).expect("goblin");
        for _ in 0..2 {
            session.combatants[index]
                .effects
                .apply(ActiveEffect::new(EffectKind::Poison, 3).with_damage(3));
        }

        let report = session.apply_turn_start_effects(&goblin).expect("active");

        let poison: Vec<_> = report
            .log_lines
            .iter()
            .filter(|l| l.contains("poison damage"))
            .collect();
        assert_eq!(
            poison,
            vec![
                "[Turn 1] Goblin takes 3 poison damage.",
                "[Turn 1] Goblin takes 3 poison damage (#2).",
            ]
        );
        assert_eq!(session.combatant(&goblin).map(|c| c.shield()), Some(9));
    }

    #[test]
    fn drain_heals_its_source() {
        let mut session = cpu_session();
        let hero = CombatantId::from("hero");
        let goblin = CombatantId::from("goblin");
        let hero_index = session.index_of(&hero).expect("hero");
        let goblin_index = session.index_of(&goblin).expect("goblin");

        session.combatants[hero_index].take_damage(30);
        session.combatants[goblin_index].effects.apply(
            ActiveEffect::new(EffectKind::Drain, 1)
                .with_pp_steal(8)
                .from_source(hero.clone()),
        );

        session.apply_turn_start_effects(&goblin).expect("active");

        // CPU opponents pay drains with health.
        assert_eq!(session.combatant(&goblin).map(|c| c.health()), Some(92));
        assert_eq!(session.combatant(&hero).map(|c| c.health()), Some(78));
    }

    #[test]
    fn lethal_poison_ends_battle() {
        let mut session = cpu_session();
        let goblin = CombatantId::from("goblin");
        let index = session.index_of(&goblin).expect("goblin");
        session.combatants[index]
            .effects
            .apply(ActiveEffect::new(EffectKind::Bleed, 1).with_damage(500));

        let report = session.apply_turn_start_effects(&goblin).expect("active");
        assert_eq!(report.ended(), Some(crate::state::BattleResult::Victory));
        assert!(session.is_over());
    }
}
