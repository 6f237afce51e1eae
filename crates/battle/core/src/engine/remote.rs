//! PvP move records: building the outgoing record for a local step and
//! applying records reported by the other client.

use crate::combatant::Side;
use crate::error::BattleError;
use crate::moves::MoveId;
use crate::record::{CombatantDelta, MoveRecord, RecordId};
use crate::state::{BattleMode, BattlePhase};

use super::{BattleSession, Step, TurnReport};

impl BattleSession {
    /// Next record produced by a local step, oldest first.
    pub fn take_outgoing_record(&mut self) -> Option<MoveRecord> {
        self.outgoing.pop_front()
    }

    /// The record [`take_outgoing_record`](Self::take_outgoing_record) would return.
    pub fn peek_outgoing_record(&self) -> Option<&MoveRecord> {
        self.outgoing.front()
    }

    pub(super) fn queue_record(&mut self, actor: usize, move_id: Option<MoveId>, step: &Step) {
        self.record_seq += 1;
        let actor_id = self.combatants[actor].id.clone();
        let id = RecordId::new(format!(
            "{}:{}:{}:{}",
            self.room_id, actor_id, self.state.turn, self.record_seq
        ));

        let mut record = MoveRecord {
            id: id.clone(),
            room_id: self.room_id.clone(),
            actor_id,
            move_id,
            turn_number: self.state.turn,
            deltas: step
                .touched
                .iter()
                .filter_map(|id| self.combatant(id))
                .map(CombatantDelta::capture)
                .collect(),
            log_lines: step.lines.clone(),
            ..MoveRecord::default()
        };
        record.mark_processed(self.local_player.as_str());
        self.state.applied_records.insert(id);
        self.outgoing.push_back(record);
    }

    /// Apply a record reported by the other client.
    ///
    /// Reported values are taken as-is; nothing is re-rolled. Applying the
    /// same record twice changes nothing the second time.
    pub fn apply_remote_record(&mut self, record: &MoveRecord) -> Result<TurnReport, BattleError> {
        self.ensure_active()?;
        self.ensure_mode(&[BattleMode::Pvp])?;

        let mut step = Step::default();
        if !self.state.applied_records.insert(record.id.clone()) {
            return Ok(self.finish(step));
        }

        if record.is_malformed() {
            self.push_log(&mut step, format!("{} attacked for 0 damage.", record.actor_id));
        } else {
            for delta in &record.deltas {
                let Some(index) = self.index_of(&delta.combatant_id) else {
                    continue;
                };
                let combatant = &mut self.combatants[index];
                combatant.restore_vitals(
                    delta.health,
                    delta.shield,
                    delta.overshield,
                    delta.power_points,
                );
                if let Some(effects) = &delta.effects {
                    combatant.effects = effects.iter().cloned().collect();
                }
                if let Some(stance) = &delta.stance {
                    combatant.stance = stance.clone().into_stance();
                }
                self.touch(&mut step, index);
            }
            for line in &record.log_lines {
                self.merge_line(&mut step, line.clone());
            }
        }

        self.check_awakening(&mut step);
        let from_opponent = self
            .combatant(&record.actor_id)
            .is_some_and(|c| c.side == Side::Opponent);
        if !self.check_outcome(&mut step) && from_opponent {
            self.state.turn = self.state.turn.max(record.turn_number) + 1;
            self.state.phase = BattlePhase::Selection;
            self.state.whose_turn = Side::Ally;
        }
        Ok(self.finish(step))
    }
}
