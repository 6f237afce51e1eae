//! Multiplayer rounds: every living participant submits, then all act in
//! priority/speed order.

use crate::combatant::{CombatantId, Controller};
use crate::error::BattleError;
use crate::moves::MoveId;
use crate::state::{BattleMode, BattlePhase, Selection};
use crate::turn_order::{OrderCandidate, compute_order};

use super::{BattleSession, Step, TurnReport};

impl BattleSession {
    /// Record a participant's move and target for the current round.
    ///
    /// AI participants are filled in automatically by [`Self::resolve_round`].
    pub fn submit_selection(
        &mut self,
        actor: impl Into<CombatantId>,
        move_id: impl Into<MoveId>,
        target: impl Into<CombatantId>,
    ) -> Result<(), BattleError> {
        self.ensure_active()?;
        self.ensure_mode(&[BattleMode::Multiplayer])?;
        if self.state.phase != BattlePhase::Selection {
            return Err(BattleError::TurnInFlight {
                phase: self.state.phase,
            });
        }

        let (actor, move_id, target) = (actor.into(), move_id.into(), target.into());
        let combatant = self
            .combatant(&actor)
            .ok_or_else(|| BattleError::UnknownCombatant(actor.clone()))?;
        if combatant.controller == Controller::Ai {
            return Err(BattleError::NotLocallyControlled(actor));
        }
        if combatant.is_defeated() {
            return Err(BattleError::ActorDefeated(actor));
        }
        if combatant.find_move(&move_id).is_none() {
            return Err(BattleError::UnknownMove { actor, move_id });
        }
        let turns = combatant.cooldown(&move_id);
        if turns > 0 {
            return Err(BattleError::MoveOnCooldown { move_id, turns });
        }
        if self.index_of(&target).is_none() {
            return Err(BattleError::InvalidTarget(target));
        }

        self.state
            .selections
            .insert(actor, Selection { move_id, target });
        Ok(())
    }

    /// Living non-AI participants that have not submitted yet.
    pub fn pending_selections(&self) -> Vec<CombatantId> {
        self.combatants
            .iter()
            .filter(|c| !c.is_defeated() && c.controller != Controller::Ai)
            .filter(|c| !self.state.selections.contains_key(&c.id))
            .map(|c| c.id.clone())
            .collect()
    }

    /// Close the submission barrier and play out the round.
    pub fn resolve_round(&mut self) -> Result<TurnReport, BattleError> {
        self.ensure_active()?;
        self.ensure_mode(&[BattleMode::Multiplayer])?;
        if self.state.phase != BattlePhase::Selection || !self.pending_selections().is_empty() {
            return Err(BattleError::NotReady {
                phase: self.state.phase,
            });
        }

        for actor in 0..self.combatants.len() {
            let combatant = &self.combatants[actor];
            if combatant.controller != Controller::Ai
                || combatant.is_defeated()
                || self.state.selections.contains_key(&combatant.id)
            {
                continue;
            }
            if let Some((move_id, target)) = self.choose_ai_move(actor) {
                let id = self.combatants[actor].id.clone();
                let target = self.combatants[target].id.clone();
                self.state
                    .selections
                    .insert(id, Selection { move_id, target });
            }
        }

        let candidates: Vec<OrderCandidate> = self
            .state
            .selections
            .iter()
            .filter_map(|(id, selection)| {
                let combatant = self.combatant(id)?;
                let priority = combatant
                    .find_move(&selection.move_id)
                    .map_or(0, |m| m.priority);
                Some(OrderCandidate {
                    id: id.clone(),
                    speed: combatant.speed,
                    priority,
                    is_player: combatant.controller != Controller::Ai,
                })
            })
            .collect();
        self.state.turn_order = compute_order(&candidates, &mut self.rng);
        self.state.phase = BattlePhase::Execution;

        let mut step = Step::default();
        for index in 0..self.state.turn_order.len() {
            self.state.turn_index = index;
            if self.check_outcome(&mut step) {
                break;
            }
            let actor_id = self.state.turn_order[index].id.clone();
            let (Some(actor), Some(selection)) = (
                self.index_of(&actor_id),
                self.state.selections.get(&actor_id).cloned(),
            ) else {
                continue;
            };
            if self.combatants[actor].is_defeated() {
                continue;
            }

            match self.retarget(actor, &selection.target) {
                Some(target) => self.take_turn(actor, &selection.move_id, target, &mut step),
                None => {
                    let name = self.combatants[actor].name.clone();
                    self.push_log(&mut step, format!("{name} has no target left."));
                    self.end_turn(actor, None, &mut step);
                }
            }
        }

        self.state.selections.clear();
        self.state.turn_index = 0;
        if !self.check_outcome(&mut step) {
            self.state.turn += 1;
            self.state.phase = BattlePhase::Selection;
        }
        Ok(self.finish(step))
    }

    /// The chosen target, or the first living combatant on its side if it fell
    /// earlier in the round.
    fn retarget(&self, actor: usize, target: &CombatantId) -> Option<usize> {
        let index = self.index_of(target)?;
        if !self.combatants[index].is_defeated() || index == actor {
            return Some(index);
        }
        let side = self.combatants[index].side;
        self.combatants
            .iter()
            .position(|c| c.side == side && !c.is_defeated())
    }
}

#[cfg(test)]
mod tests {
    use crate::combatant::{Combatant, Controller, HealthPool, Side};
    use crate::engine::fixtures::{goblin, player};
    use crate::engine::{BattleSession, SessionSetup};
    use crate::error::BattleError;
    use crate::moves::Move;
    use crate::state::{BattleMode, BattlePhase};

    fn party_session() -> BattleSession {
        let ally = Combatant::new("mage", "Mage", 4, Side::Ally, HealthPool::vault(80, 80))
            .with_controller(Controller::Remote)
            .with_speed(30)
            .with_move(Move::attack("bolt", "Bolt", 8).with_priority(1));
        let setup = SessionSetup::new(BattleMode::Multiplayer, "hero", 11)
            .with_combatant(player())
            .with_combatant(ally)
            .with_combatant(goblin().with_speed(20));
        BattleSession::new(setup).expect("valid setup")
    }

    #[test]
    fn round_waits_for_every_submission() {
        let mut session = party_session();
        session
            .submit_selection("hero", "strike", "goblin")
            .expect("hero submits");
        assert_eq!(session.pending_selections(), vec!["mage".into()]);
        assert!(matches!(
            session.resolve_round(),
            Err(BattleError::NotReady { .. })
        ));
    }

    #[test]
    fn ai_cannot_be_submitted_for() {
        let mut session = party_session();
        assert!(matches!(
            session.submit_selection("goblin", "bite", "hero"),
            Err(BattleError::NotLocallyControlled(_))
        ));
    }

    #[test]
    fn round_orders_by_priority_then_speed() {
        let mut session = party_session();
        session
            .submit_selection("hero", "strike", "goblin")
            .expect("hero");
        session
            .submit_selection("mage", "bolt", "goblin")
            .expect("mage");

        session.resolve_round().expect("round");

        let order: Vec<_> = session
            .state()
            .turn_order
            .iter()
            .map(|e| e.id.as_str().to_owned())
            .collect();
        assert_eq!(order, ["mage", "goblin", "hero"]);
        assert_eq!(session.phase(), BattlePhase::Selection);
        assert_eq!(session.turn(), 2);
        assert!(session.state().selections.is_empty());
    }

    #[test]
    fn single_player_calls_are_refused() {
        let mut session = party_session();
        assert!(matches!(
            session.select_move("strike"),
            Err(BattleError::WrongMode { .. })
        ));
    }
}
