//! Battle worker that owns the authoritative [`BattleSession`].
//!
//! Receives commands from [`crate::BattleHandle`], drives the session, publishes
//! the resulting events and persists vault checkpoints and PvP records.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use battle_core::{
    BattleMode, BattlePhase, BattleResult, BattleSession, CombatantId, CombatantSnapshot, MoveId,
    MoveRecord, TurnReport,
};

use crate::error::Result;
use crate::events::EventBus;
use crate::repository::{MoveLogStore, MoveQuota, VaultStore};

/// Commands accepted by the battle worker.
pub enum Command {
    SelectMove {
        move_id: MoveId,
        reply: oneshot::Sender<Result<BattlePhase>>,
    },
    SelectTarget {
        target: CombatantId,
        reply: oneshot::Sender<Result<BattlePhase>>,
    },
    /// Resolve the armed selection, after the quota check.
    Execute {
        reply: oneshot::Sender<Result<TurnReport>>,
    },
    RunOpponentTurn {
        reply: oneshot::Sender<Result<TurnReport>>,
    },
    SubmitSelection {
        actor: CombatantId,
        move_id: MoveId,
        target: CombatantId,
        reply: oneshot::Sender<Result<()>>,
    },
    ResolveRound {
        reply: oneshot::Sender<Result<TurnReport>>,
    },
    Escape {
        reply: oneshot::Sender<Result<TurnReport>>,
    },
    ApplyRemote {
        record: MoveRecord,
        reply: oneshot::Sender<Result<TurnReport>>,
    },
    /// Read-only view of the session.
    Query { reply: oneshot::Sender<BattleView> },
    /// Stop the worker even while handles are still alive.
    Shutdown,
}

/// Snapshot of the session handed to hosts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleView {
    pub room_id: String,
    pub local_player: CombatantId,
    pub mode: BattleMode,
    pub phase: BattlePhase,
    pub turn: u32,
    pub outcome: Option<BattleResult>,
    pub pending_pp: u32,
    pub selected_move: Option<MoveId>,
    pub selected_target: Option<CombatantId>,
    pub log: Vec<String>,
    pub combatants: Vec<CombatantSnapshot>,
}

impl BattleView {
    fn capture(session: &BattleSession) -> Self {
        let state = session.state();
        Self {
            room_id: session.room_id().to_owned(),
            local_player: session.local_player_id().clone(),
            mode: session.mode(),
            phase: session.phase(),
            turn: session.turn(),
            outcome: session.outcome(),
            pending_pp: session.pending_pp(),
            selected_move: state.selected_move.clone(),
            selected_target: state.selected_target.clone(),
            log: session.log().lines().to_vec(),
            combatants: session.combatants().iter().map(CombatantSnapshot::from).collect(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn combatant(&self, id: &CombatantId) -> Option<&CombatantSnapshot> {
        self.combatants.iter().find(|c| &c.id == id)
    }
}

/// Stores the worker persists through.
#[derive(Clone)]
pub struct Stores {
    pub vaults: Arc<dyn VaultStore>,
    pub move_log: Option<Arc<dyn MoveLogStore>>,
    pub quota: Arc<dyn MoveQuota>,
}

/// Background task that processes battle commands.
pub struct BattleWorker {
    session: BattleSession,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    stores: Stores,
}

impl BattleWorker {
    pub fn new(
        session: BattleSession,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        stores: Stores,
    ) -> Self {
        info!(
            "BattleWorker initialized for room {} ({} mode, {} combatants)",
            session.room_id(),
            session.mode(),
            session.combatants().len()
        );
        Self {
            session,
            command_rx,
            event_bus,
            stores,
        }
    }

    /// Main worker loop. Ends on shutdown or when every handle is dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            if matches!(cmd, Command::Shutdown) {
                break;
            }
            self.handle_command(cmd).await;
        }
        debug!("BattleWorker for room {} stopped", self.session.room_id());
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SelectMove { move_id, reply } => {
                let result = self.session.select_move(move_id).map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("SelectMove reply channel closed (caller dropped)");
                }
            }
            Command::SelectTarget { target, reply } => {
                let result = self.session.select_target(target).map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("SelectTarget reply channel closed (caller dropped)");
                }
            }
            Command::Execute { reply } => {
                let result = self.handle_execute().await;
                if reply.send(result).is_err() {
                    debug!("Execute reply channel closed (caller dropped)");
                }
            }
            Command::RunOpponentTurn { reply } => {
                let result = self.session.run_opponent_turn().map_err(Into::into);
                let result = self.settle(result, true).await;
                if reply.send(result).is_err() {
                    debug!("RunOpponentTurn reply channel closed (caller dropped)");
                }
            }
            Command::SubmitSelection {
                actor,
                move_id,
                target,
                reply,
            } => {
                let result = self
                    .session
                    .submit_selection(actor, move_id, target)
                    .map_err(Into::into);
                if reply.send(result).is_err() {
                    debug!("SubmitSelection reply channel closed (caller dropped)");
                }
            }
            Command::ResolveRound { reply } => {
                let result = self.session.resolve_round().map_err(Into::into);
                let result = self.settle(result, true).await;
                if reply.send(result).is_err() {
                    debug!("ResolveRound reply channel closed (caller dropped)");
                }
            }
            Command::Escape { reply } => {
                let result = self.session.escape().map_err(Into::into);
                let result = self.settle(result, false).await;
                if reply.send(result).is_err() {
                    debug!("Escape reply channel closed (caller dropped)");
                }
            }
            Command::ApplyRemote { record, reply } => {
                let result = self.session.apply_remote_record(&record).map_err(Into::into);
                let result = self.settle(result, false).await;
                if reply.send(result).is_err() {
                    debug!("ApplyRemote reply channel closed (caller dropped)");
                }
            }
            Command::Query { reply } => {
                if reply.send(BattleView::capture(&self.session)).is_err() {
                    debug!("Query reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown => {}
        }
    }

    /// Quota check, then resolution of the armed selection.
    ///
    /// A denied move is abandoned before anything is rolled and the reason is
    /// logged to the battle.
    async fn handle_execute(&mut self) -> Result<TurnReport> {
        if self.session.phase() == BattlePhase::Execution
            && !self.session.is_over()
            && let Some(move_id) = self.session.state().selected_move.clone()
        {
            let player = self.session.local_player_id().clone();
            if let Err(reason) = self.stores.quota.try_consume(&player, &move_id).await {
                warn!("Move {} denied for {}: {}", move_id, player, reason);
                let result = self.session.abort_turn(&reason).map_err(Into::into);
                return self.settle(result, false).await;
            }
        }

        let result = self.session.execute().map_err(Into::into);
        self.settle(result, true).await
    }

    /// Publish a transition's events, then persist what it changed.
    ///
    /// Store failures are logged and cut the persistence short; the in-memory
    /// session keeps the transition either way.
    async fn settle(&mut self, result: Result<TurnReport>, checkpoint: bool) -> Result<TurnReport> {
        let report = result?;
        debug!(
            "Turn {} ({}): {} log line(s), {} event(s)",
            self.session.turn(),
            self.session.phase(),
            report.log_lines.len(),
            report.events.len()
        );
        self.event_bus.publish_all(report.events.iter().cloned());

        let ended = report.ended();
        if let Some(outcome) = ended {
            info!(
                "Battle in room {} ended: {} ({} PP pending)",
                self.session.room_id(),
                outcome,
                self.session.pending_pp()
            );
        }

        if (checkpoint || ended.is_some())
            && let Err(err) = self.checkpoint().await
        {
            warn!("Vault checkpoint failed: {}", err);
            return Ok(report);
        }
        self.flush_records().await;
        Ok(report)
    }

    /// Write every vault this client is responsible for.
    ///
    /// The local player always; in PvP also the remote opponent, whose vault
    /// the attacking client updates.
    async fn checkpoint(&self) -> crate::repository::Result<()> {
        let pvp = self.session.mode() == BattleMode::Pvp;
        let local = self.session.local_player_id();
        for combatant in self.session.combatants() {
            if &combatant.id != local && !pvp {
                continue;
            }
            if let Some(patch) = combatant.vault_patch() {
                self.stores.vaults.write(&combatant.id, patch).await?;
            }
        }
        Ok(())
    }

    /// Append queued records oldest first. A record leaves the queue only once
    /// the store accepted it, so a failed append is retried on the next flush.
    async fn flush_records(&mut self) {
        while let Some(record) = self.session.peek_outgoing_record().cloned() {
            let Some(move_log) = &self.stores.move_log else {
                debug!("No move log configured; dropping record {}", record.id);
                self.session.take_outgoing_record();
                continue;
            };
            let room = record.room_id.clone();
            match move_log.append(&room, record).await {
                Ok(id) => {
                    self.session.take_outgoing_record();
                    debug!("Appended record {} to room {}", id, room);
                }
                Err(err) => {
                    warn!("Failed to append move record to room {}: {}", room, err);
                    break;
                }
            }
        }
    }
}
