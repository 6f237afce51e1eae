//! Error types surfaced by battle operations.
//!
//! Nothing here is fatal to the host: every error leaves the session in a
//! navigable phase, and callers decide whether to log or show it.

use crate::combatant::CombatantId;
use crate::moves::MoveId;
use crate::state::{BattleMode, BattlePhase};

/// Severity level of an error, used for logging priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The caller can act again (pick another move, wait for the turn).
    Recoverable,
    /// Invalid input, reject without retry.
    Validation,
    /// The session setup or a record is inconsistent.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

/// Errors raised by [`crate::engine::BattleSession`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    #[error("the battle is already over")]
    BattleOver,

    #[error("a turn is already being resolved (phase: {phase})")]
    TurnInFlight { phase: BattlePhase },

    #[error("no turn is ready to resolve (phase: {phase})")]
    NotReady { phase: BattlePhase },

    #[error("operation is not available in {mode} battles")]
    WrongMode { mode: BattleMode },

    #[error("combatant {0} is not part of this battle")]
    UnknownCombatant(CombatantId),

    #[error("target {0} is not part of this battle")]
    InvalidTarget(CombatantId),

    #[error("{actor} does not know move {move_id}")]
    UnknownMove { actor: CombatantId, move_id: MoveId },

    #[error("{move_id} is on cooldown for {turns} more turn(s)")]
    MoveOnCooldown { move_id: MoveId, turns: u32 },

    #[error("{0} is defeated and cannot act")]
    ActorDefeated(CombatantId),

    #[error("{0} is not controlled locally")]
    NotLocallyControlled(CombatantId),

    #[error("invalid battle setup: {0}")]
    InvalidSetup(&'static str),
}

impl BattleError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BattleError::TurnInFlight { .. }
            | BattleError::NotReady { .. }
            | BattleError::MoveOnCooldown { .. } => ErrorSeverity::Recoverable,
            BattleError::BattleOver
            | BattleError::WrongMode { .. }
            | BattleError::UnknownCombatant(_)
            | BattleError::InvalidTarget(_)
            | BattleError::UnknownMove { .. }
            | BattleError::ActorDefeated(_)
            | BattleError::NotLocallyControlled(_) => ErrorSeverity::Validation,
            BattleError::InvalidSetup(_) => ErrorSeverity::Internal,
        }
    }
}
