//! High-level battle orchestrator.
//!
//! The runtime owns the battle worker and, for PvP battles with a move log,
//! the synchronizer task. Clients drive it through a [`BattleHandle`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use battle_core::{
    BattleMode, BattleSession, Combatant, CombatantId, Controller, Move, SessionSetup, Side,
};

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::handle::BattleHandle;
use crate::repository::{
    InMemoryVaultStore, MoveLogStore, MoveQuota, RepositoryError, Unlimited, VaultStore,
};
use crate::sync::PvpSync;
use crate::worker::{BattleWorker, Stores};

/// A running battle.
pub struct BattleRuntime {
    handle: BattleHandle,
    worker: JoinHandle<()>,
    sync: Option<JoinHandle<()>>,
}

impl BattleRuntime {
    pub fn builder() -> BattleRuntimeBuilder {
        BattleRuntimeBuilder::new()
    }

    /// Cloneable handle for clients and tasks.
    pub fn handle(&self) -> BattleHandle {
        self.handle.clone()
    }

    /// Stop the synchronizer and the worker.
    ///
    /// Commands queued before the call are still processed.
    pub async fn shutdown(self) {
        if let Some(sync) = self.sync {
            sync.abort();
        }
        if self.handle.shutdown().await.is_err() {
            tracing::debug!("Battle worker already stopped");
        }
        if let Err(err) = self.worker.await {
            tracing::warn!("Battle worker ended abnormally: {}", err);
        }
    }
}

/// Builder for [`BattleRuntime`].
pub struct BattleRuntimeBuilder {
    config: RuntimeConfig,
    vaults: Option<Arc<dyn VaultStore>>,
    move_log: Option<Arc<dyn MoveLogStore>>,
    quota: Option<Arc<dyn MoveQuota>>,
    auto_sync: bool,
}

impl BattleRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            vaults: None,
            move_log: None,
            quota: None,
            auto_sync: true,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn vaults(mut self, vaults: Arc<dyn VaultStore>) -> Self {
        self.vaults = Some(vaults);
        self
    }

    /// Shared move log; required for PvP records to leave this client.
    pub fn move_log(mut self, move_log: Arc<dyn MoveLogStore>) -> Self {
        self.move_log = Some(move_log);
        self
    }

    pub fn quota(mut self, quota: Arc<dyn MoveQuota>) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Whether a PvP battle spawns its poller (default: true).
    pub fn auto_sync(mut self, enabled: bool) -> Self {
        self.auto_sync = enabled;
        self
    }

    /// Start the battle described by `setup`.
    ///
    /// The session runs with the configured [`battle_core::BattleConfig`].
    /// Must be called inside a tokio runtime.
    pub fn start(self, setup: SessionSetup) -> Result<BattleRuntime> {
        let session = BattleSession::new(setup.with_config(self.config.battle.clone()))?;
        let room = session.room_id().to_owned();
        let self_id = session.local_player_id().clone();
        let pvp = session.mode() == BattleMode::Pvp;

        let stores = Stores {
            vaults: self
                .vaults
                .unwrap_or_else(|| Arc::new(InMemoryVaultStore::new())),
            move_log: self.move_log,
            quota: self.quota.unwrap_or_else(|| Arc::new(Unlimited)),
        };
        let move_log = stores.move_log.clone();

        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size.max(1));
        let handle = BattleHandle::new(
            command_tx,
            event_bus.clone(),
            self.config.opponent_turn_delay,
        );

        let worker = BattleWorker::new(session, command_rx, event_bus, stores);
        let worker = tokio::spawn(worker.run());

        let sync = match move_log {
            Some(move_log) if pvp && self.auto_sync => Some(
                PvpSync::new(handle.clone(), move_log, room, self_id, self.config.poll_interval)
                    .spawn(),
            ),
            _ => None,
        };

        Ok(BattleRuntime {
            handle,
            worker,
            sync,
        })
    }
}

/// Build a vault-backed combatant from its stored vault.
pub async fn load_vault_combatant(
    vaults: &dyn VaultStore,
    id: impl Into<CombatantId>,
    name: impl Into<String>,
    level: u32,
    side: Side,
    controller: Controller,
    moves: Vec<Move>,
) -> Result<Combatant> {
    let id = id.into();
    let vault = vaults
        .read(&id)
        .await?
        .ok_or_else(|| RepositoryError::VaultNotFound(id.to_string()))?;
    Ok(Combatant::from_vault(id, name, level, side, &vault)
        .with_controller(controller)
        .with_moves(moves))
}
