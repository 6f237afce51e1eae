//! In-memory store implementations for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use battle_core::{CombatantId, MoveRecord, RecordId, VaultPatch, VaultSnapshot};

use super::{MoveLogStore, RepositoryError, Result, VaultStore};

/// Vault snapshots keyed by player id.
#[derive(Default)]
pub struct InMemoryVaultStore {
    vaults: RwLock<HashMap<CombatantId, VaultSnapshot>>,
}

impl InMemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vault(self, player: impl Into<CombatantId>, vault: VaultSnapshot) -> Self {
        if let Ok(mut vaults) = self.vaults.write() {
            vaults.insert(player.into(), vault);
        }
        self
    }
}

#[async_trait]
impl VaultStore for InMemoryVaultStore {
    async fn read(&self, player: &CombatantId) -> Result<Option<VaultSnapshot>> {
        let vaults = self
            .vaults
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(vaults.get(player).copied())
    }

    async fn write(&self, player: &CombatantId, patch: VaultPatch) -> Result<()> {
        let mut vaults = self
            .vaults
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let vault = vaults
            .get_mut(player)
            .ok_or_else(|| RepositoryError::VaultNotFound(player.to_string()))?;
        patch.apply_to(vault);
        Ok(())
    }
}

/// One room's records plus the last timestamp handed out.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct RoomLog {
    records: Vec<MoveRecord>,
    last_timestamp: u64,
}

impl RoomLog {
    pub(crate) fn append(&mut self, room: &str, mut record: MoveRecord) -> RecordId {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let timestamp = now.max(self.last_timestamp + 1);
        self.last_timestamp = timestamp;

        record.room_id = room.to_owned();
        record.timestamp = timestamp;
        if record.id.as_str().is_empty() {
            record.id = RecordId::new(format!("{room}:{timestamp}"));
        }
        let id = record.id.clone();
        self.records.push(record);
        id
    }

    pub(crate) fn unprocessed(&self, exclude_actor: &CombatantId, self_id: &str) -> Vec<MoveRecord> {
        let mut pending: Vec<_> = self
            .records
            .iter()
            .filter(|r| &r.actor_id != exclude_actor && !r.is_processed_by(self_id))
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.timestamp);
        pending
    }

    pub(crate) fn mark(&mut self, room: &str, record: &RecordId, self_id: &str) -> Result<()> {
        let entry = self
            .records
            .iter_mut()
            .find(|r| &r.id == record)
            .ok_or_else(|| RepositoryError::RecordNotFound {
                room: room.to_owned(),
                record: record.to_string(),
            })?;
        entry.mark_processed(self_id);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// Move log kept in process memory, shared by both clients of a local PvP run.
#[derive(Default)]
pub struct InMemoryMoveLog {
    rooms: RwLock<HashMap<String, RoomLog>>,
}

impl InMemoryMoveLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a room.
    pub fn len(&self, room: &str) -> usize {
        self.rooms
            .read()
            .map(|rooms| rooms.get(room).map_or(0, RoomLog::len))
            .unwrap_or(0)
    }
}

#[async_trait]
impl MoveLogStore for InMemoryMoveLog {
    async fn append(&self, room: &str, record: MoveRecord) -> Result<RecordId> {
        let mut rooms = self
            .rooms
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(rooms.entry(room.to_owned()).or_default().append(room, record))
    }

    async fn query_unprocessed(
        &self,
        room: &str,
        exclude_actor: &CombatantId,
        self_id: &str,
    ) -> Result<Vec<MoveRecord>> {
        let rooms = self
            .rooms
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(rooms
            .get(room)
            .map(|log| log.unprocessed(exclude_actor, self_id))
            .unwrap_or_default())
    }

    async fn mark_processed(&self, room: &str, record: &RecordId, self_id: &str) -> Result<()> {
        let mut rooms = self
            .rooms
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        match rooms.get_mut(room) {
            Some(log) => log.mark(room, record, self_id),
            None => Err(RepositoryError::RecordNotFound {
                room: room.to_owned(),
                record: record.to_string(),
            }),
        }
    }
}
