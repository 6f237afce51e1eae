//! Data-driven battle content.
//!
//! This crate houses the move catalog and the CPU opponent roster, both
//! authored as RON files under `data/` and embedded at compile time:
//! - Move catalog entries (base values, status effects, stances)
//! - Opponent templates (stats and move lists by catalog id)
//!
//! Content is consumed by the runtime's catalog oracle and by the binary when
//! it assembles a battle; it never appears in battle state directly.

pub mod catalog;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::{CatalogEntry, MoveBook, OpponentSpec};

#[cfg(feature = "loaders")]
pub use loaders::{ContentFactory, LoadResult, MoveLoader, OpponentLoader};
