//! Content loaders for reading battle data from RON files.
//!
//! The embedded loaders read the files under `data/` compiled into the crate;
//! the path loaders read the same formats from disk.

pub mod factory;
pub mod moves;
pub mod opponents;

pub use factory::ContentFactory;
pub use moves::MoveLoader;
pub use opponents::OpponentLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
