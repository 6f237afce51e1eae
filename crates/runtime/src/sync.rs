//! PvP move-log synchronizer.
//!
//! Polls the shared move log on a fixed interval and feeds the other client's
//! records, oldest first, to the local battle. Each applied record is marked
//! processed so it is never fetched again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use battle_core::CombatantId;

use crate::error::{Result, RuntimeError};
use crate::handle::BattleHandle;
use crate::repository::MoveLogStore;

pub struct PvpSync {
    handle: BattleHandle,
    move_log: Arc<dyn MoveLogStore>,
    room: String,
    self_id: CombatantId,
    poll_interval: Duration,
}

impl PvpSync {
    pub fn new(
        handle: BattleHandle,
        move_log: Arc<dyn MoveLogStore>,
        room: impl Into<String>,
        self_id: CombatantId,
        poll_interval: Duration,
    ) -> Self {
        Self {
            handle,
            move_log,
            room: room.into(),
            self_id,
            poll_interval,
        }
    }

    /// Run one poll cycle. Returns how many records were handed to the battle.
    ///
    /// A record the battle rejects (it already ended, say) is still marked
    /// processed so the cycle never stalls on it.
    pub async fn poll_once(&self) -> Result<usize> {
        let records = self
            .move_log
            .query_unprocessed(&self.room, &self.self_id, self.self_id.as_str())
            .await?;

        let mut applied = 0;
        for record in records {
            let id = record.id.clone();
            match self.handle.apply_remote_record(record).await {
                Ok(report) => {
                    debug!("Applied record {} ({} new line(s))", id, report.log_lines.len());
                    applied += 1;
                }
                Err(RuntimeError::Battle(err)) => {
                    warn!("Record {} rejected by battle: {}", id, err);
                }
                Err(err) => return Err(err),
            }
            self.move_log
                .mark_processed(&self.room, &id, self.self_id.as_str())
                .await?;
        }
        Ok(applied)
    }

    /// Poll until the battle ends or its worker goes away.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                match self.poll_once().await {
                    Ok(_) => {}
                    Err(RuntimeError::CommandChannelClosed | RuntimeError::ReplyChannelClosed(_)) => {
                        break;
                    }
                    Err(err) => warn!("Move log poll failed for room {}: {}", self.room, err),
                }

                match self.handle.view().await {
                    Ok(view) if view.is_over() => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            debug!("PvP sync for room {} stopped", self.room);
        })
    }
}
