//! Move quota implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use battle_core::{CombatantId, MoveId};

use super::MoveQuota;

/// Quota that never denies.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unlimited;

#[async_trait]
impl MoveQuota for Unlimited {
    async fn try_consume(&self, _: &CombatantId, _: &MoveId) -> Result<(), String> {
        Ok(())
    }
}

/// Fixed number of uses per player and move.
pub struct LimitedQuota {
    uses_per_move: u32,
    spent: Mutex<HashMap<(CombatantId, MoveId), u32>>,
}

impl LimitedQuota {
    pub fn new(uses_per_move: u32) -> Self {
        Self {
            uses_per_move,
            spent: Mutex::new(HashMap::new()),
        }
    }

    pub fn remaining(&self, player: &CombatantId, move_id: &MoveId) -> u32 {
        self.spent
            .lock()
            .map(|spent| {
                let used = spent
                    .get(&(player.clone(), move_id.clone()))
                    .copied()
                    .unwrap_or(0);
                self.uses_per_move.saturating_sub(used)
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl MoveQuota for LimitedQuota {
    async fn try_consume(&self, player: &CombatantId, move_id: &MoveId) -> Result<(), String> {
        let mut spent = self
            .spent
            .lock()
            .map_err(|_| String::from("move quota is unavailable"))?;
        let used = spent.entry((player.clone(), move_id.clone())).or_insert(0);
        if *used >= self.uses_per_move {
            return Err(format!("no uses of {move_id} left"));
        }
        *used += 1;
        Ok(())
    }
}
