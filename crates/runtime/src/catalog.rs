//! Move catalog oracle with admin overrides.
//!
//! Hosts resolve moves by id or display name. Overrides replace display names
//! and base values without touching the authored catalog, so balance changes
//! can ship as a JSON document.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use battle_content::{CatalogEntry, MoveBook};
use battle_core::{Move, MoveValue, StatusEffectSpec};

use crate::error::{Result, RuntimeError};

/// Lookup of current move definitions.
pub trait MoveCatalog: Send + Sync {
    /// Resolve a move by id or display name, with overrides applied.
    fn lookup(&self, name: &str) -> Option<CatalogEntry>;

    /// Build moves for a loadout. Fails on the first unknown name.
    fn loadout(&self, names: &[&str], level: u32, mastery_level: u32) -> Result<Vec<Move>> {
        names
            .iter()
            .map(|name| {
                self.lookup(name)
                    .map(|entry| entry.to_move(level, mastery_level))
                    .ok_or_else(|| RuntimeError::UnknownCatalogMove((*name).to_owned()))
            })
            .collect()
    }
}

/// Admin override for one catalog entry. Unset fields keep the authored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogOverride {
    pub name: Option<String>,
    pub damage: Option<MoveValue>,
    pub pp_steal: Option<MoveValue>,
    pub shield_boost: Option<MoveValue>,
    pub healing: Option<MoveValue>,
    pub status_effects: Option<Vec<StatusEffectSpec>>,
}

impl CatalogOverride {
    fn apply(&self, entry: &mut CatalogEntry) {
        if let Some(name) = &self.name {
            entry.name = name.clone();
        }
        if let Some(damage) = self.damage {
            entry.damage = damage;
        }
        if let Some(pp_steal) = self.pp_steal {
            entry.pp_steal = pp_steal;
        }
        if let Some(shield_boost) = self.shield_boost {
            entry.shield_boost = shield_boost;
        }
        if let Some(healing) = self.healing {
            entry.healing = healing;
        }
        if let Some(effects) = &self.status_effects {
            entry.status_effects = effects.clone();
        }
    }
}

/// Catalog backed by the embedded content, plus an override table keyed by move id.
pub struct ContentCatalog {
    book: MoveBook,
    overrides: RwLock<HashMap<String, CatalogOverride>>,
}

impl ContentCatalog {
    pub fn new(book: MoveBook) -> Self {
        Self {
            book,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_override(&self, move_id: impl Into<String>, patch: CatalogOverride) -> Result<()> {
        let mut overrides = self
            .overrides
            .write()
            .map_err(|_| crate::repository::RepositoryError::LockPoisoned)?;
        overrides.insert(move_id.into(), patch);
        Ok(())
    }

    /// Load overrides from a JSON object of `{ "<move id>": { ... } }`.
    ///
    /// Returns how many entries were loaded. Ids not in the catalog are skipped.
    pub fn load_overrides_json(&self, json: &str) -> Result<usize> {
        let parsed: HashMap<String, CatalogOverride> = serde_json::from_str(json)
            .map_err(crate::repository::RepositoryError::from)?;

        let mut loaded = 0;
        for (id, patch) in parsed {
            if self.book.get(&id).is_none() {
                tracing::warn!("Ignoring override for unknown move '{}'", id);
                continue;
            }
            self.set_override(id, patch)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    fn find_overridden(&self, name: &str) -> Option<CatalogEntry> {
        let overrides = self.overrides.read().ok()?;
        overrides.iter().find_map(|(id, patch)| {
            let renamed = patch.name.as_deref()?;
            if !renamed.eq_ignore_ascii_case(name) {
                return None;
            }
            let mut entry = self.book.get(id)?.clone();
            patch.apply(&mut entry);
            Some(entry)
        })
    }
}

impl MoveCatalog for ContentCatalog {
    fn lookup(&self, name: &str) -> Option<CatalogEntry> {
        let Some(base) = self.book.find(name) else {
            // A renamed move is still reachable by its new display name.
            return self.find_overridden(name);
        };

        let mut entry = base.clone();
        if let Ok(overrides) = self.overrides.read()
            && let Some(patch) = overrides.get(&entry.id)
        {
            patch.apply(&mut entry);
        }
        Some(entry)
    }
}
