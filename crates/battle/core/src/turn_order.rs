//! Multiplayer turn ordering.
//!
//! Participants are ordered by move priority, then speed, then a fresh random
//! tie-break drawn per participant per round. The three keys are packed into a
//! single composite score so a plain descending sort reproduces the chain.

use crate::combatant::CombatantId;
use crate::rng::{BattleRng, RollContext};

/// Input to [`compute_order`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderCandidate {
    pub id: CombatantId,
    pub speed: u32,
    /// Priority of the selected move (0 when the move has none).
    pub priority: i32,
    pub is_player: bool,
}

/// One slot in a round's computed order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnOrderEntry {
    pub id: CombatantId,
    pub speed: u32,
    pub priority: i32,
    pub random: u32,
    pub order_score: i128,
}

/// `priority` in the high bits, `speed` in the middle 32, `random` in the low 32.
pub fn order_score(priority: i32, speed: u32, random: u32) -> i128 {
    ((priority as i128) << 64) + ((speed as i128) << 32) + random as i128
}

/// Compute the acting order for one round, fastest first.
pub fn compute_order(candidates: &[OrderCandidate], rng: &mut BattleRng) -> Vec<TurnOrderEntry> {
    let mut entries: Vec<TurnOrderEntry> = candidates
        .iter()
        .map(|candidate| {
            let random = rng.next_u32(RollContext::TieBreak);
            TurnOrderEntry {
                id: candidate.id.clone(),
                speed: candidate.speed,
                priority: candidate.priority,
                random,
                order_score: order_score(candidate.priority, candidate.speed, random),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.order_score
            .cmp(&a.order_score)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries
}
