//! Catalog formats shared by the loaders and the runtime oracle.

use std::collections::BTreeMap;

use battle_core::{
    Move, MoveKind, MoveValue, OpponentTemplate, StanceSpec, StatusEffectSpec,
};

/// A move as stored in the catalog.
///
/// Numeric fields accept either a scalar or a legacy `{ min, max }` range;
/// a range is normalized to its maximum when a move is built from the entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub kind: MoveKind,
    pub damage: MoveValue,
    pub pp_steal: MoveValue,
    pub shield_boost: MoveValue,
    pub healing: MoveValue,
    pub priority: i32,
    pub cooldown: Option<u32>,
    pub status_effects: Vec<StatusEffectSpec>,
    pub stance: Option<StanceSpec>,
}

impl CatalogEntry {
    /// Build a move at the given level and mastery.
    pub fn to_move(&self, level: u32, mastery_level: u32) -> Move {
        let mut mv = Move::new(self.id.clone(), self.name.clone())
            .with_kind(self.kind)
            .with_damage(self.damage.normalized())
            .with_pp_steal(self.pp_steal.normalized())
            .with_shield_boost(self.shield_boost.normalized())
            .with_healing(self.healing.normalized())
            .with_levels(level.max(1), mastery_level)
            .with_priority(self.priority);
        if let Some(turns) = self.cooldown {
            mv = mv.with_cooldown(turns);
        }
        if let Some(stance) = &self.stance {
            mv = mv.with_stance(stance.clone());
        }
        mv.status_effects = self.status_effects.clone();
        mv
    }
}

impl Default for CatalogEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            kind: MoveKind::Attack,
            damage: MoveValue::default(),
            pp_steal: MoveValue::default(),
            shield_boost: MoveValue::default(),
            healing: MoveValue::default(),
            priority: 0,
            cooldown: None,
            status_effects: Vec::new(),
            stance: None,
        }
    }
}

/// Catalog entries keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveBook {
    entries: BTreeMap<String, CatalogEntry>,
}

impl MoveBook {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// Look an entry up by id, falling back to a case-insensitive display-name match.
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.get(name).or_else(|| {
            self.entries
                .values()
                .find(|e| e.name.eq_ignore_ascii_case(name))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A CPU opponent as authored; moves are catalog ids.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpponentSpec {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub speed: u32,
    pub health: u32,
    pub shield: u32,
    pub power_points: u32,
    pub moves: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub move_level: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub awakens: bool,
}

impl OpponentSpec {
    /// Resolve move ids against the catalog. Unknown ids are returned as the error.
    pub fn to_template(&self, book: &MoveBook) -> Result<OpponentTemplate, String> {
        let level = self.move_level.unwrap_or(1);
        let moves = self
            .moves
            .iter()
            .map(|id| {
                book.get(id)
                    .map(|entry| entry.to_move(level, 1))
                    .ok_or_else(|| id.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OpponentTemplate {
            id: self.id.clone(),
            name: self.name.clone(),
            level: self.level,
            speed: self.speed,
            health: self.health,
            shield: self.shield,
            max_shield: self.shield,
            power_points: self.power_points,
            moves,
            awakens: self.awakens,
        })
    }
}
