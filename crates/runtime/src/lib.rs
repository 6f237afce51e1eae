//! Async orchestration around the battle rules.
//!
//! The runtime runs a [`battle_core::BattleSession`] on a worker task and
//! connects it to its collaborators:
//! - vault store, move log and move quota ([`repository`])
//! - move catalog with admin overrides ([`catalog`])
//! - topic event bus for the UI and story layers ([`events`])
//! - PvP move-log poller ([`sync`])
//!
//! Hosts hold a [`BattleHandle`] and never touch the session directly.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod repository;
pub mod sync;

mod handle;
mod runtime;
mod worker;

pub use catalog::{CatalogOverride, ContentCatalog, MoveCatalog};
pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use events::{Event, EventBus, OutcomeEvent, StoryEvent, Topic};
pub use handle::BattleHandle;
pub use repository::{
    FileMoveLog, InMemoryMoveLog, InMemoryVaultStore, LimitedQuota, MoveLogStore, MoveQuota,
    RepositoryError, Unlimited, VaultStore,
};
pub use runtime::{BattleRuntime, BattleRuntimeBuilder, load_vault_combatant};
pub use sync::PvpSync;
pub use worker::BattleView;
