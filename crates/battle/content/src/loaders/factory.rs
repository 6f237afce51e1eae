//! Assembled content: catalog plus resolved opponent templates.

use std::collections::BTreeMap;

use battle_core::OpponentTemplate;

use crate::catalog::MoveBook;
use crate::loaders::{LoadResult, MoveLoader, OpponentLoader};

/// Content ready for the runtime: every opponent's moves resolved.
#[derive(Clone, Debug)]
pub struct ContentFactory {
    moves: MoveBook,
    opponents: BTreeMap<String, OpponentTemplate>,
}

impl ContentFactory {
    /// Build from the embedded data files.
    pub fn load_embedded() -> LoadResult<Self> {
        let moves = MoveLoader::load_embedded()?;
        let specs = OpponentLoader::load_embedded()?;

        let mut opponents = BTreeMap::new();
        for spec in specs {
            let template = spec.to_template(&moves).map_err(|missing| {
                anyhow::anyhow!("Opponent '{}' uses unknown move '{}'", spec.id, missing)
            })?;
            opponents.insert(spec.id.clone(), template);
        }

        Ok(Self { moves, opponents })
    }

    pub fn moves(&self) -> &MoveBook {
        &self.moves
    }

    pub fn opponent(&self, id: &str) -> Option<&OpponentTemplate> {
        self.opponents.get(id)
    }

    pub fn opponents(&self) -> impl Iterator<Item = &OpponentTemplate> {
        self.opponents.values()
    }
}
