//! CPU opponent roster loader.

use std::path::Path;

use crate::catalog::OpponentSpec;
use crate::loaders::{LoadResult, read_file};

const EMBEDDED_OPPONENTS: &str = include_str!("../../data/opponents.ron");

/// Loader for opponent specs.
///
/// RON format: `Vec<OpponentSpec>`
pub struct OpponentLoader;

impl OpponentLoader {
    pub fn load_embedded() -> LoadResult<Vec<OpponentSpec>> {
        Self::parse(EMBEDDED_OPPONENTS, "embedded opponents.ron")
    }

    pub fn load(path: &Path) -> LoadResult<Vec<OpponentSpec>> {
        let content = read_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn parse(content: &str, origin: &str) -> LoadResult<Vec<OpponentSpec>> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse opponent roster {}: {}", origin, e))
    }
}
