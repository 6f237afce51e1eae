//! Top-level mutable battle state.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::combatant::{CombatantId, Side};
use crate::moves::MoveId;
use crate::record::RecordId;
use crate::turn_order::TurnOrderEntry;

/// Where the turn state machine currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlePhase {
    /// Waiting for a move and target (or, in multiplayer, for every submission).
    #[default]
    Selection,
    /// A selection is armed and the local side's move is resolving.
    Execution,
    /// The opposing side is acting (AI turn, or waiting for the remote record).
    OpponentTurn,
    Victory,
    Defeat,
}

impl BattlePhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, BattlePhase::Victory | BattlePhase::Defeat)
    }

    /// A resolution step owns the session; new selections are refused.
    pub const fn is_in_flight(self) -> bool {
        matches!(self, BattlePhase::Execution | BattlePhase::OpponentTurn)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleMode {
    /// One local player against AI opponents.
    Cpu,
    /// Two players; the opponent's moves arrive through the shared move log.
    Pvp,
    /// Allies and opponents submit moves, then act in speed/priority order.
    Multiplayer,
}

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleResult {
    Victory,
    Defeat,
    Escape,
}

/// Ordered, append-only battle log. Appending a line already present is a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BattleLog {
    lines: Vec<String>,
    seen: HashSet<String>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line; returns false if the exact line was already logged.
    pub fn push(&mut self, line: impl Into<String>) -> bool {
        let line = line.into();
        if self.seen.contains(&line) {
            return false;
        }
        self.seen.insert(line.clone());
        self.lines.push(line);
        true
    }

    pub fn contains(&self, line: &str) -> bool {
        self.seen.contains(line)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A submitted move and target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    pub move_id: MoveId,
    pub target: CombatantId,
}

/// Session-level state owned by [`crate::engine::BattleSession`].
#[derive(Clone, Debug)]
pub struct BattleState {
    pub phase: BattlePhase,
    pub mode: BattleMode,
    pub selected_move: Option<MoveId>,
    pub selected_target: Option<CombatantId>,
    pub log: BattleLog,
    /// Completed full turns (one local + one opposing turn, or one round).
    pub turn: u32,
    pub whose_turn: Side,
    /// PP stolen by the local side, paid out on victory.
    pub pending_pp: u32,
    pub turn_order: Vec<TurnOrderEntry>,
    pub turn_index: usize,
    pub selections: BTreeMap<CombatantId, Selection>,
    /// Latched once the awakening trigger has fired.
    pub awakened: bool,
    pub outcome: Option<BattleResult>,
    pub applied_records: BTreeSet<RecordId>,
}

impl BattleState {
    pub fn new(mode: BattleMode) -> Self {
        Self {
            phase: BattlePhase::Selection,
            mode,
            selected_move: None,
            selected_target: None,
            log: BattleLog::new(),
            turn: 1,
            whose_turn: Side::Ally,
            pending_pp: 0,
            turn_order: Vec::new(),
            turn_index: 0,
            selections: BTreeMap::new(),
            awakened: false,
            outcome: None,
            applied_records: BTreeSet::new(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn clear_selection(&mut self) {
        self.selected_move = None;
        self.selected_target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_append_is_idempotent() {
        let mut log = BattleLog::new();
        assert!(log.push("Hero uses Strike!"));
        assert!(!log.push("Hero uses Strike!"));
        assert!(log.push("Goblin uses Bite!"));
        assert_eq!(log.lines(), ["Hero uses Strike!", "Goblin uses Bite!"]);
    }

    #[test]
    fn terminal_phases() {
        assert!(BattlePhase::Victory.is_terminal());
        assert!(BattlePhase::Defeat.is_terminal());
        assert!(!BattlePhase::OpponentTurn.is_terminal());
        assert!(BattlePhase::Execution.is_in_flight());
        assert!(!BattlePhase::Selection.is_in_flight());
    }
}
