//! Store contracts consumed by the battle worker and the PvP synchronizer.

use async_trait::async_trait;

use battle_core::{CombatantId, MoveId, MoveRecord, RecordId, VaultPatch, VaultSnapshot};

use super::Result;

/// Persistent per-player vault.
#[async_trait]
pub trait VaultStore: Send + Sync {
    async fn read(&self, player: &CombatantId) -> Result<Option<VaultSnapshot>>;

    /// Merge a partial write into the stored vault.
    async fn write(&self, player: &CombatantId, patch: VaultPatch) -> Result<()>;
}

/// Shared, ordered move log keyed by battle-room id.
#[async_trait]
pub trait MoveLogStore: Send + Sync {
    /// Append a record. The store assigns its timestamp (strictly increasing
    /// per room) and, when the record has none, its id.
    async fn append(&self, room: &str, record: MoveRecord) -> Result<RecordId>;

    /// Records not authored by `exclude_actor` that `self_id` has not yet
    /// processed, oldest first.
    async fn query_unprocessed(
        &self,
        room: &str,
        exclude_actor: &CombatantId,
        self_id: &str,
    ) -> Result<Vec<MoveRecord>>;

    /// Add `self_id` to the record's processed set. Idempotent.
    async fn mark_processed(&self, room: &str, record: &RecordId, self_id: &str) -> Result<()>;
}

/// External check gating whether a player may spend a move.
#[async_trait]
pub trait MoveQuota: Send + Sync {
    /// `Err` carries the reason shown in the battle log.
    async fn try_consume(
        &self,
        player: &CombatantId,
        move_id: &MoveId,
    ) -> std::result::Result<(), String>;
}
