//! Single-opponent turn loop: selection, execution, opponent turn.

use crate::combatant::{CombatantId, Controller, Side};
use crate::error::BattleError;
use crate::moves::{MoveId, MoveKind};
use crate::rng::RollContext;
use crate::state::{BattleMode, BattlePhase, BattleResult};

use super::{BattleEvent, BattleSession, Step, TurnReport};

impl BattleSession {
    fn ensure_selecting(&self) -> Result<(), BattleError> {
        self.ensure_active()?;
        self.ensure_mode(&[BattleMode::Cpu, BattleMode::Pvp])?;
        match self.state.phase {
            BattlePhase::Selection => Ok(()),
            phase => Err(BattleError::TurnInFlight { phase }),
        }
    }

    fn arm_if_ready(&mut self) -> BattlePhase {
        if self.state.selected_move.is_some() && self.state.selected_target.is_some() {
            self.state.phase = BattlePhase::Execution;
        }
        self.state.phase
    }

    /// Choose the local player's move. Returns the resulting phase.
    pub fn select_move(&mut self, move_id: impl Into<MoveId>) -> Result<BattlePhase, BattleError> {
        self.ensure_selecting()?;
        let move_id = move_id.into();
        let player = self
            .local_player()
            .ok_or_else(|| BattleError::UnknownCombatant(self.local_player.clone()))?;

        if player.find_move(&move_id).is_none() {
            return Err(BattleError::UnknownMove {
                actor: player.id.clone(),
                move_id,
            });
        }
        let turns = player.cooldown(&move_id);
        if turns > 0 {
            return Err(BattleError::MoveOnCooldown { move_id, turns });
        }

        self.state.selected_move = Some(move_id);
        Ok(self.arm_if_ready())
    }

    /// Choose the local player's target. Returns the resulting phase.
    pub fn select_target(
        &mut self,
        target: impl Into<CombatantId>,
    ) -> Result<BattlePhase, BattleError> {
        self.ensure_selecting()?;
        let target = target.into();
        if self.index_of(&target).is_none() {
            return Err(BattleError::InvalidTarget(target));
        }

        self.state.selected_target = Some(target);
        Ok(self.arm_if_ready())
    }

    /// Resolve the armed selection for the local player.
    ///
    /// A target that no longer resolves to a living combatant aborts the turn
    /// without touching any pool and returns the session to selection.
    pub fn execute(&mut self) -> Result<TurnReport, BattleError> {
        self.ensure_active()?;
        match self.state.phase {
            BattlePhase::Execution => {}
            BattlePhase::Selection => {
                return Err(BattleError::NotReady {
                    phase: BattlePhase::Selection,
                });
            }
            phase => return Err(BattleError::TurnInFlight { phase }),
        }

        let (Some(move_id), Some(target_id)) = (
            self.state.selected_move.clone(),
            self.state.selected_target.clone(),
        ) else {
            self.state.phase = BattlePhase::Selection;
            return Err(BattleError::NotReady {
                phase: BattlePhase::Selection,
            });
        };

        let Some(target) = self
            .index_of(&target_id)
            .filter(|&i| !self.combatants[i].is_defeated())
        else {
            self.state.phase = BattlePhase::Selection;
            self.state.selected_target = None;
            return Err(BattleError::InvalidTarget(target_id));
        };
        let actor = self
            .index_of(&self.local_player)
            .ok_or_else(|| BattleError::UnknownCombatant(self.local_player.clone()))?;

        self.state.clear_selection();
        let mut step = Step::default();
        self.take_turn(actor, &move_id, target, &mut step);

        if !self.check_outcome(&mut step) {
            self.state.phase = BattlePhase::OpponentTurn;
            self.state.whose_turn = Side::Opponent;
        }
        if self.state.mode == BattleMode::Pvp {
            self.queue_record(actor, Some(move_id), &step);
        }
        Ok(self.finish(step))
    }

    /// Abandon the armed selection before anything is computed.
    ///
    /// Used when an external check (move quota) refuses the move.
    pub fn abort_turn(&mut self, reason: &str) -> Result<TurnReport, BattleError> {
        self.ensure_active()?;
        if self.state.phase != BattlePhase::Execution {
            return Err(BattleError::NotReady {
                phase: self.state.phase,
            });
        }

        self.state.clear_selection();
        self.state.phase = BattlePhase::Selection;
        let mut step = Step::default();
        self.push_log(&mut step, reason);
        Ok(self.finish(step))
    }

    /// Let every living AI opponent act, then start the next turn.
    pub fn run_opponent_turn(&mut self) -> Result<TurnReport, BattleError> {
        self.ensure_active()?;
        self.ensure_mode(&[BattleMode::Cpu])?;
        if self.state.phase != BattlePhase::OpponentTurn {
            return Err(BattleError::NotReady {
                phase: self.state.phase,
            });
        }

        let mut step = Step::default();
        let acting: Vec<usize> = (0..self.combatants.len())
            .filter(|&i| {
                let c = &self.combatants[i];
                c.side == Side::Opponent && c.controller == Controller::Ai && !c.is_defeated()
            })
            .collect();

        for actor in acting {
            if self.state.is_over() {
                break;
            }
            if self.combatants[actor].is_defeated() {
                continue;
            }
            match self.choose_ai_move(actor) {
                Some((move_id, target)) => self.take_turn(actor, &move_id, target, &mut step),
                None => {
                    let name = self.combatants[actor].name.clone();
                    self.tick_effects(actor, &mut step);
                    self.push_log(&mut step, format!("{name} has no moves available."));
                    self.end_turn(actor, None, &mut step);
                }
            }
            self.check_outcome(&mut step);
        }

        if !self.state.is_over() {
            self.state.turn += 1;
            self.state.phase = BattlePhase::Selection;
            self.state.whose_turn = Side::Ally;
        }
        Ok(self.finish(step))
    }

    /// Uniform choice among available moves; attacks aim at a random living enemy.
    pub(super) fn choose_ai_move(&mut self, actor: usize) -> Option<(MoveId, usize)> {
        let available: Vec<(MoveId, MoveKind)> = self.combatants[actor]
            .available_moves()
            .map(|m| (m.id.clone(), m.kind))
            .collect();
        let pick = self.rng.pick(RollContext::AiMove, available.len())?;
        let (move_id, kind) = available.get(pick)?.clone();

        if kind != MoveKind::Attack {
            return Some((move_id, actor));
        }

        let enemy_side = self.combatants[actor].side.opposite();
        let enemies: Vec<usize> = (0..self.combatants.len())
            .filter(|&i| {
                self.combatants[i].side == enemy_side && !self.combatants[i].is_defeated()
            })
            .collect();
        let target = self.rng.pick(RollContext::AiTarget, enemies.len())?;
        Some((move_id, *enemies.get(target)?))
    }

    /// Leave the battle immediately, whatever the phase.
    pub fn escape(&mut self) -> Result<TurnReport, BattleError> {
        self.ensure_active()?;

        let mut step = Step::default();
        let name = self
            .local_player()
            .map_or_else(|| self.local_player.to_string(), |p| p.name.clone());
        self.push_log(&mut step, format!("{name} escaped from battle."));

        self.state.outcome = Some(BattleResult::Escape);
        self.state.pending_pp = 0;
        self.state.clear_selection();
        self.state.selections.clear();
        step.events.push(BattleEvent::BattleEnded {
            result: BattleResult::Escape,
            winners: Vec::new(),
            losers: Vec::new(),
            reward: 0,
        });
        Ok(self.finish(step))
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::fixtures::cpu_session;
    use crate::error::BattleError;
    use crate::state::{BattlePhase, BattleResult};

    #[test]
    fn selecting_both_arms_execution() {
        let mut session = cpu_session();
        assert_eq!(session.select_move("strike"), Ok(BattlePhase::Selection));
        assert_eq!(session.select_target("goblin"), Ok(BattlePhase::Execution));

        assert!(matches!(
            session.select_move("strike"),
            Err(BattleError::TurnInFlight { .. })
        ));
    }

    #[test]
    fn unknown_move_and_target_are_rejected() {
        let mut session = cpu_session();
        assert!(matches!(
            session.select_move("fireball"),
            Err(BattleError::UnknownMove { .. })
        ));
        assert!(matches!(
            session.select_target("dragon"),
            Err(BattleError::InvalidTarget(_))
        ));
        assert_eq!(session.phase(), BattlePhase::Selection);
    }

    #[test]
    fn execute_then_opponent_turn_advances_turn() {
        let mut session = cpu_session();
        session.select_move("strike").expect("move");
        session.select_target("goblin").expect("target");

        let report = session.execute().expect("execute");
        assert!(!report.log_lines.is_empty());
        assert_eq!(session.phase(), BattlePhase::OpponentTurn);
        assert!(matches!(
            session.execute(),
            Err(BattleError::TurnInFlight { .. })
        ));

        session.run_opponent_turn().expect("opponent");
        assert_eq!(session.phase(), BattlePhase::Selection);
        assert_eq!(session.turn(), 2);
    }

    #[test]
    fn abort_returns_to_selection_without_damage() {
        let mut session = cpu_session();
        session.select_move("strike").expect("move");
        session.select_target("goblin").expect("target");

        let report = session.abort_turn("Out of moves for today.").expect("abort");
        assert_eq!(session.phase(), BattlePhase::Selection);
        assert_eq!(report.log_lines, vec!["[Turn 1] Out of moves for today."]);
        let goblin = session.combatant(&"goblin".into()).expect("goblin");
        assert_eq!(goblin.shield(), 15);
        assert_eq!(goblin.health(), 100);
    }

    #[test]
    fn escape_is_terminal() {
        let mut session = cpu_session();
        let report = session.escape().expect("escape");
        assert_eq!(report.ended(), Some(BattleResult::Escape));
        assert_eq!(session.escape(), Err(BattleError::BattleOver));
        assert_eq!(session.select_move("strike"), Err(BattleError::BattleOver));
    }
}
