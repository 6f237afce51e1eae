//! PvP move records exchanged through the shared move log.
//!
//! A record carries the *post-step* values of every combatant the step
//! touched, so the receiving client re-derives state from reported values
//! instead of re-rolling.

use core::fmt;
use std::collections::BTreeSet;

use crate::combatant::{Combatant, CombatantId};
use crate::effects::ActiveEffect;
use crate::moves::MoveId;
use crate::stance::DefensiveStance;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stance slot reported for a combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum StanceState {
    Cleared,
    Held(DefensiveStance),
}

impl StanceState {
    pub fn into_stance(self) -> Option<DefensiveStance> {
        match self {
            StanceState::Cleared => None,
            StanceState::Held(stance) => Some(stance),
        }
    }
}

/// Absolute post-step values for one combatant. Missing fields are left alone.
///
/// `effects` is the whole ledger, not the entries added by the step, so the
/// receiver replaces its copy and ticks it on the owner's next turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatantDelta {
    pub combatant_id: CombatantId,
    pub health: Option<u32>,
    pub shield: Option<u32>,
    pub overshield: Option<u32>,
    pub power_points: Option<u32>,
    pub effects: Option<Vec<ActiveEffect>>,
    pub stance: Option<StanceState>,
}

impl CombatantDelta {
    pub fn capture(combatant: &Combatant) -> Self {
        Self {
            combatant_id: combatant.id.clone(),
            health: Some(combatant.health()),
            shield: Some(combatant.shield()),
            overshield: Some(combatant.overshield()),
            power_points: Some(combatant.power_points()),
            effects: Some(combatant.effects.iter().cloned().collect()),
            stance: Some(match &combatant.stance {
                Some(stance) => StanceState::Held(stance.clone()),
                None => StanceState::Cleared,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.health.is_none()
            && self.shield.is_none()
            && self.overshield.is_none()
            && self.power_points.is_none()
            && self.effects.is_none()
            && self.stance.is_none()
    }
}

impl Default for CombatantDelta {
    fn default() -> Self {
        Self {
            combatant_id: CombatantId::new(""),
            health: None,
            shield: None,
            overshield: None,
            power_points: None,
            effects: None,
            stance: None,
        }
    }
}

/// One resolved step, as appended to the move log.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MoveRecord {
    pub id: RecordId,
    pub room_id: String,
    pub actor_id: CombatantId,
    pub move_id: Option<MoveId>,
    pub turn_number: u32,
    pub deltas: Vec<CombatantDelta>,
    pub log_lines: Vec<String>,
    /// Clients that have applied this record. Only ever grows.
    pub processed_by: BTreeSet<String>,
    /// Assigned by the store on append; orders records across clients.
    pub timestamp: u64,
}

impl MoveRecord {
    pub fn is_processed_by(&self, client: &str) -> bool {
        self.processed_by.contains(client)
    }

    pub fn mark_processed(&mut self, client: &str) -> bool {
        self.processed_by.insert(client.to_owned())
    }

    /// A record with nothing to apply and nothing to show.
    pub fn is_malformed(&self) -> bool {
        self.deltas.iter().all(CombatantDelta::is_empty) && self.log_lines.is_empty()
    }
}

impl Default for MoveRecord {
    fn default() -> Self {
        Self {
            id: RecordId::new(""),
            room_id: String::new(),
            actor_id: CombatantId::new(""),
            move_id: None,
            turn_number: 0,
            deltas: Vec::new(),
            log_lines: Vec::new(),
            processed_by: BTreeSet::new(),
            timestamp: 0,
        }
    }
}
