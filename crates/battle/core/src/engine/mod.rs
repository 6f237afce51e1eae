//! Turn resolution state machine.
//!
//! [`BattleSession`] owns the battle state, the combatants and the random
//! source. Every transition is a method on the session and returns a
//! [`TurnReport`] listing the log lines it appended and the events the host
//! should forward (log updates, combatant snapshots, battle end, story hooks).
//!
//! The session never performs I/O. Store writes, quota checks and pacing are
//! the runtime's job; the session only exposes the state they need.

mod flow;
mod remote;
mod resolve;
mod round;
mod ticks;

use std::collections::{BTreeSet, VecDeque};

use crate::combatant::{Combatant, CombatantId, Controller, Side};
use crate::config::BattleConfig;
use crate::effects::EffectKind;
use crate::error::BattleError;
use crate::record::MoveRecord;
use crate::rng::BattleRng;
use crate::state::{BattleLog, BattleMode, BattlePhase, BattleResult, BattleState};

/// Everything needed to start a battle.
#[derive(Clone, Debug)]
pub struct SessionSetup {
    pub mode: BattleMode,
    /// The combatant driven by this client.
    pub local_player: CombatantId,
    pub combatants: Vec<Combatant>,
    pub seed: u64,
    pub config: BattleConfig,
    /// Shared move-log room (PvP only).
    pub room_id: Option<String>,
}

impl SessionSetup {
    pub fn new(mode: BattleMode, local_player: impl Into<CombatantId>, seed: u64) -> Self {
        Self {
            mode,
            local_player: local_player.into(),
            combatants: Vec::new(),
            seed,
            config: BattleConfig::default(),
            room_id: None,
        }
    }

    pub fn with_combatant(mut self, combatant: Combatant) -> Self {
        self.combatants.push(combatant);
        self
    }

    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }
}

/// Read-only view of a combatant handed to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub health: u32,
    pub max_health: u32,
    pub shield: u32,
    pub max_shield: u32,
    pub overshield: u32,
    pub power_points: u32,
    pub effects: Vec<EffectKind>,
    pub stance: Option<String>,
    pub defeated: bool,
}

impl From<&Combatant> for CombatantSnapshot {
    fn from(combatant: &Combatant) -> Self {
        Self {
            id: combatant.id.clone(),
            name: combatant.name.clone(),
            side: combatant.side,
            health: combatant.health(),
            max_health: combatant.max_health(),
            shield: combatant.shield(),
            max_shield: combatant.max_shield(),
            overshield: combatant.overshield(),
            power_points: combatant.power_points(),
            effects: combatant.effects.kinds(),
            stance: combatant.stance.as_ref().map(|s| s.name.clone()),
            defeated: combatant.is_defeated(),
        }
    }
}

/// Notifications produced by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleEvent {
    /// New lines were appended to the battle log.
    LogUpdated { lines: Vec<String> },
    /// A combatant's pools, effects or stance changed.
    CombatantUpdated(CombatantSnapshot),
    BattleEnded {
        result: BattleResult,
        winners: Vec<CombatantId>,
        losers: Vec<CombatantId>,
        /// PP credited to the local player (victory only).
        reward: u32,
    },
    /// One-shot awakening of an opponent that crossed its health threshold.
    BossAwakened { combatant: CombatantId, name: String },
    /// PP stolen by the local side, held until the battle is won.
    RewardBanked { amount: u32, total: u32 },
}

/// Result of one transition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub log_lines: Vec<String>,
    pub events: Vec<BattleEvent>,
}

impl TurnReport {
    pub fn is_empty(&self) -> bool {
        self.log_lines.is_empty() && self.events.is_empty()
    }

    /// The outcome, if this transition ended the battle.
    pub fn ended(&self) -> Option<BattleResult> {
        self.events.iter().find_map(|event| match event {
            BattleEvent::BattleEnded { result, .. } => Some(*result),
            _ => None,
        })
    }

    pub fn awakened(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, BattleEvent::BossAwakened { .. }))
    }
}

/// Accumulator for one transition.
#[derive(Debug, Default)]
struct Step {
    lines: Vec<String>,
    touched: BTreeSet<CombatantId>,
    events: Vec<BattleEvent>,
}

/// A running battle.
#[derive(Debug)]
pub struct BattleSession {
    state: BattleState,
    combatants: Vec<Combatant>,
    local_player: CombatantId,
    config: BattleConfig,
    rng: BattleRng,
    room_id: String,
    outgoing: VecDeque<MoveRecord>,
    record_seq: u64,
}

impl BattleSession {
    /// Start a battle with the default PCG random source.
    pub fn new(setup: SessionSetup) -> Result<Self, BattleError> {
        let rng = BattleRng::seeded(setup.seed);
        Self::with_rng(setup, rng)
    }

    /// Start a battle with a caller-supplied random source.
    pub fn with_rng(setup: SessionSetup, rng: BattleRng) -> Result<Self, BattleError> {
        let SessionSetup {
            mode,
            local_player,
            combatants,
            config,
            room_id,
            ..
        } = setup;

        let mut seen = BTreeSet::new();
        if !combatants.iter().all(|c| seen.insert(c.id.clone())) {
            return Err(BattleError::InvalidSetup("combatant ids must be unique"));
        }

        let player = combatants
            .iter()
            .find(|c| c.id == local_player)
            .ok_or(BattleError::InvalidSetup("local player is not a combatant"))?;
        if player.side != Side::Ally || player.controller != Controller::Human {
            return Err(BattleError::InvalidSetup(
                "local player must be a human-controlled ally",
            ));
        }
        if !combatants.iter().any(|c| c.side == Side::Opponent) {
            return Err(BattleError::InvalidSetup("battle needs at least one opponent"));
        }
        if mode == BattleMode::Pvp
            && !combatants
                .iter()
                .any(|c| c.side == Side::Opponent && c.controller == Controller::Remote)
        {
            return Err(BattleError::InvalidSetup("pvp battles need a remote opponent"));
        }

        Ok(Self {
            state: BattleState::new(mode),
            combatants,
            local_player,
            config,
            rng,
            room_id: room_id.unwrap_or_else(|| "local".to_owned()),
            outgoing: VecDeque::new(),
            record_seq: 0,
        })
    }

    // ===== accessors =====

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn mode(&self) -> BattleMode {
        self.state.mode
    }

    pub fn turn(&self) -> u32 {
        self.state.turn
    }

    pub fn log(&self) -> &BattleLog {
        &self.state.log
    }

    pub fn outcome(&self) -> Option<BattleResult> {
        self.state.outcome
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn pending_pp(&self) -> u32 {
        self.state.pending_pp
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn local_player_id(&self) -> &CombatantId {
        &self.local_player
    }

    pub fn local_player(&self) -> Option<&Combatant> {
        self.combatant(&self.local_player)
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| &c.id == id)
    }

    pub fn snapshot(&self, id: &CombatantId) -> Option<CombatantSnapshot> {
        self.combatant(id).map(CombatantSnapshot::from)
    }

    /// Living combatants on one side, in setup order.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.combatants
            .iter()
            .filter(move |c| c.side == side && !c.is_defeated())
    }

    // ===== internals shared by the transitions =====

    fn index_of(&self, id: &CombatantId) -> Option<usize> {
        self.combatants.iter().position(|c| &c.id == id)
    }

    fn ensure_active(&self) -> Result<(), BattleError> {
        if self.state.is_over() {
            return Err(BattleError::BattleOver);
        }
        Ok(())
    }

    fn ensure_mode(&self, allowed: &[BattleMode]) -> Result<(), BattleError> {
        if allowed.contains(&self.state.mode) {
            Ok(())
        } else {
            Err(BattleError::WrongMode {
                mode: self.state.mode,
            })
        }
    }

    /// Append a turn-stamped line to the battle log.
    fn push_log(&mut self, step: &mut Step, line: impl AsRef<str>) {
        let line = format!("[Turn {}] {}", self.state.turn, line.as_ref());
        self.merge_line(step, line);
    }

    /// Append a line verbatim (remote lines are already stamped).
    fn merge_line(&mut self, step: &mut Step, line: String) {
        if self.state.log.push(line.clone()) {
            step.lines.push(line);
        }
    }

    fn touch(&self, step: &mut Step, index: usize) {
        step.touched.insert(self.combatants[index].id.clone());
    }

    fn finish(&self, step: Step) -> TurnReport {
        let Step {
            lines,
            touched,
            events,
        } = step;

        let mut report = TurnReport {
            log_lines: lines.clone(),
            events: Vec::with_capacity(events.len() + touched.len() + 1),
        };
        if !lines.is_empty() {
            report.events.push(BattleEvent::LogUpdated { lines });
        }
        report.events.extend(
            touched
                .iter()
                .filter_map(|id| self.snapshot(id))
                .map(BattleEvent::CombatantUpdated),
        );
        report.events.extend(events);
        report
    }

    /// Fire the one-shot awakening once a flagged opponent drops to the threshold.
    fn check_awakening(&mut self, step: &mut Step) {
        if self.state.awakened {
            return;
        }
        let threshold = self.config.awakening_threshold_percent;
        let Some(index) = self.combatants.iter().position(|c| {
            c.awakens && c.side == Side::Opponent && c.health_percent() <= threshold
        }) else {
            return;
        };

        self.state.awakened = true;
        let combatant = self.combatants[index].id.clone();
        let name = self.combatants[index].name.clone();
        self.push_log(step, format!("{name} awakens!"));
        step.events.push(BattleEvent::BossAwakened { combatant, name });
    }

    /// Settle victory or defeat. Returns true once the battle is over.
    ///
    /// Victory takes precedence when both sides are down at once.
    fn check_outcome(&mut self, step: &mut Step) -> bool {
        if self.state.is_over() {
            return true;
        }
        if self.living(Side::Opponent).next().is_none() {
            self.declare_victory(step);
            return true;
        }
        if self.living(Side::Ally).next().is_none() {
            self.declare_defeat(step);
            return true;
        }
        false
    }

    fn side_ids(&self, side: Side) -> Vec<CombatantId> {
        self.combatants
            .iter()
            .filter(|c| c.side == side)
            .map(|c| c.id.clone())
            .collect()
    }

    fn declare_victory(&mut self, step: &mut Step) {
        let spoils: u32 = self
            .combatants
            .iter()
            .filter(|c| c.side == Side::Opponent && c.is_defeated())
            .map(|c| c.power_points())
            .fold(0u32, u32::saturating_add);
        let total = self.state.pending_pp.saturating_add(spoils);
        self.state.pending_pp = 0;

        let reward = match self.index_of(&self.local_player) {
            Some(index) => {
                self.touch(step, index);
                self.combatants[index].gain_power_points(total)
            }
            None => 0,
        };

        self.state.phase = BattlePhase::Victory;
        self.state.outcome = Some(BattleResult::Victory);
        self.state.clear_selection();
        self.push_log(step, format!("Victory! {reward} PP earned."));
        step.events.push(BattleEvent::BattleEnded {
            result: BattleResult::Victory,
            winners: self.side_ids(Side::Ally),
            losers: self.side_ids(Side::Opponent),
            reward,
        });
    }

    fn declare_defeat(&mut self, step: &mut Step) {
        self.state.phase = BattlePhase::Defeat;
        self.state.outcome = Some(BattleResult::Defeat);
        self.state.pending_pp = 0;
        self.state.clear_selection();
        self.push_log(step, "Defeat...");
        step.events.push(BattleEvent::BattleEnded {
            result: BattleResult::Defeat,
            winners: self.side_ids(Side::Opponent),
            losers: self.side_ids(Side::Ally),
            reward: 0,
        });
    }
}
