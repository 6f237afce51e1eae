//! Cloneable façade for issuing commands to the battle worker.
//!
//! [`BattleHandle`] hides channel plumbing and offers async helpers for
//! driving a turn or streaming events from specific topics.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};

use battle_core::{BattleMode, BattlePhase, CombatantId, MoveId, MoveRecord, TurnReport};

use crate::error::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::worker::{BattleView, Command};

/// Client-facing handle to a running battle.
#[derive(Clone)]
pub struct BattleHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    opponent_turn_delay: Duration,
}

impl BattleHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        opponent_turn_delay: Duration,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            opponent_turn_delay,
        }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    pub async fn select_move(&self, move_id: impl Into<MoveId>) -> Result<BattlePhase> {
        let move_id = move_id.into();
        self.request(|reply| Command::SelectMove { move_id, reply })
            .await?
    }

    pub async fn select_target(&self, target: impl Into<CombatantId>) -> Result<BattlePhase> {
        let target = target.into();
        self.request(|reply| Command::SelectTarget { target, reply })
            .await?
    }

    /// Resolve the armed selection for the local player.
    pub async fn execute(&self) -> Result<TurnReport> {
        self.request(|reply| Command::Execute { reply }).await?
    }

    pub async fn run_opponent_turn(&self) -> Result<TurnReport> {
        self.request(|reply| Command::RunOpponentTurn { reply })
            .await?
    }

    /// Select, execute and, against a CPU opponent, let it answer after the
    /// configured pause.
    ///
    /// Returns the reports of every transition that ran.
    pub async fn play_turn(
        &self,
        move_id: impl Into<MoveId>,
        target: impl Into<CombatantId>,
    ) -> Result<Vec<TurnReport>> {
        self.select_move(move_id).await?;
        self.select_target(target).await?;

        let mut reports = vec![self.execute().await?];
        let view = self.view().await?;
        if view.mode == BattleMode::Cpu && view.phase == BattlePhase::OpponentTurn {
            if !self.opponent_turn_delay.is_zero() {
                tokio::time::sleep(self.opponent_turn_delay).await;
            }
            reports.push(self.run_opponent_turn().await?);
        }
        Ok(reports)
    }

    pub async fn submit_selection(
        &self,
        actor: impl Into<CombatantId>,
        move_id: impl Into<MoveId>,
        target: impl Into<CombatantId>,
    ) -> Result<()> {
        let (actor, move_id, target) = (actor.into(), move_id.into(), target.into());
        self.request(|reply| Command::SubmitSelection {
            actor,
            move_id,
            target,
            reply,
        })
        .await?
    }

    pub async fn resolve_round(&self) -> Result<TurnReport> {
        self.request(|reply| Command::ResolveRound { reply }).await?
    }

    /// End the battle immediately, whatever the phase.
    pub async fn escape(&self) -> Result<TurnReport> {
        self.request(|reply| Command::Escape { reply }).await?
    }

    pub async fn apply_remote_record(&self, record: MoveRecord) -> Result<TurnReport> {
        self.request(|reply| Command::ApplyRemote { record, reply })
            .await?
    }

    /// Ask the worker to stop. Later requests fail with a closed channel.
    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    pub async fn view(&self) -> Result<BattleView> {
        self.request(|reply| Command::Query { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Log` - battle log lines
    /// - `Topic::Opponent` - combatant snapshots
    /// - `Topic::Outcome` - battle end and banked rewards
    /// - `Topic::Story` - boss awakening
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }
}
