//! Deterministic battle rules shared by every client.
//!
//! `battle-core` holds the roll calculator, effect ledger, combatant pools,
//! turn-order scheduler and the [`engine::BattleSession`] state machine. It
//! performs no I/O: the runtime feeds it selections and remote move records
//! and forwards the [`engine::TurnReport`]s it returns.
pub mod combatant;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod moves;
pub mod record;
pub mod rng;
pub mod roll;
pub mod stance;
pub mod state;
pub mod turn_order;

pub use combatant::{
    Absorption, Combatant, CombatantId, Controller, DamageReport, HealthPool, OpponentTemplate,
    Side, VaultPatch, VaultSnapshot, absorb,
};
pub use config::{BattleConfig, RollTuning};
pub use effects::{ActiveEffect, ApplyOutcome, EffectKind, EffectLedger, TickReport};
pub use engine::{BattleEvent, BattleSession, CombatantSnapshot, SessionSetup, TurnReport};
pub use error::{BattleError, ErrorSeverity};
pub use moves::{EffectTarget, Move, MoveId, MoveKind, MoveValue, StatusEffectSpec};
pub use record::{CombatantDelta, MoveRecord, RecordId, StanceState};
pub use rng::{BattleRng, PcgRng, RngOracle, RollContext, compute_seed};
pub use roll::{Roll, RollRange, calculate_range, roll};
pub use stance::{CounterAttack, CounterCondition, DefensiveStance, StanceSpec};
pub use state::{BattleLog, BattleMode, BattlePhase, BattleResult, BattleState, Selection};
pub use turn_order::{OrderCandidate, TurnOrderEntry, compute_order, order_score};
