//! Move catalog loader.

use std::path::Path;

use crate::catalog::{CatalogEntry, MoveBook};
use crate::loaders::{LoadResult, read_file};

const EMBEDDED_MOVES: &str = include_str!("../../data/moves.ron");

/// Loader for the move catalog.
///
/// RON format: `Vec<CatalogEntry>`
pub struct MoveLoader;

impl MoveLoader {
    /// Load the catalog compiled into the crate.
    pub fn load_embedded() -> LoadResult<MoveBook> {
        Self::parse(EMBEDDED_MOVES, "embedded moves.ron")
    }

    /// Load a catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<MoveBook> {
        let content = read_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn parse(content: &str, origin: &str) -> LoadResult<MoveBook> {
        let entries: Vec<CatalogEntry> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse move catalog {}: {}", origin, e))?;

        if let Some(entry) = entries.iter().find(|e| e.id.is_empty()) {
            anyhow::bail!("Move '{}' in {} has no id", entry.name, origin);
        }
        let book = MoveBook::new(entries.iter().cloned());
        if book.len() != entries.len() {
            anyhow::bail!("Duplicate move ids in {}", origin);
        }
        Ok(book)
    }
}
