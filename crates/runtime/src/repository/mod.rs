//! Persistence boundaries for the battle runtime.
//!
//! The vault store and move log are the two stores a battle talks to: the
//! vault holds each player's persistent pools, the move log carries PvP
//! records between clients. Quota checks gate move consumption.

mod error;
mod file;
mod memory;
mod quota;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileMoveLog;
pub use memory::{InMemoryMoveLog, InMemoryVaultStore};
pub use quota::{LimitedQuota, Unlimited};
pub use traits::{MoveLogStore, MoveQuota, VaultStore};

pub(crate) use memory::RoomLog;
