//! Combatant state: health pool, shields, power points and per-battle
//! modifiers.
//!
//! Every decrement is clamped to the pool's current value, so no pool ever
//! goes negative, and every increment is capped at the pool's maximum.

use core::fmt;
use std::collections::BTreeMap;

use crate::effects::EffectLedger;
use crate::moves::{Move, MoveId};
use crate::stance::DefensiveStance;

/// Identifier of a battle participant (player id, opponent template id, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct CombatantId(pub String);

impl CombatantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CombatantId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for CombatantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Ally,
    Opponent,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Side::Ally => Side::Opponent,
            Side::Opponent => Side::Ally,
        }
    }
}

/// Who decides a combatant's moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Controller {
    /// Local input.
    #[default]
    Human,
    /// Uniform random choice by the engine.
    Ai,
    /// Another client; moves arrive through the move log.
    Remote,
}

/// The pool whose depletion defeats a combatant.
///
/// CPU opponents are defeated through `health` (which also serves as their
/// PP). Players and PvP opponents are defeated through their vault health.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HealthPool {
    Cpu { health: u32, max_health: u32 },
    Vault { vault_health: u32, max_vault_health: u32 },
}

impl HealthPool {
    pub fn cpu(health: u32, max_health: u32) -> Self {
        HealthPool::Cpu {
            health: health.min(max_health),
            max_health,
        }
    }

    pub fn vault(vault_health: u32, max_vault_health: u32) -> Self {
        HealthPool::Vault {
            vault_health: vault_health.min(max_vault_health),
            max_vault_health,
        }
    }

    pub fn current(&self) -> u32 {
        match *self {
            HealthPool::Cpu { health, .. } => health,
            HealthPool::Vault { vault_health, .. } => vault_health,
        }
    }

    pub fn max(&self) -> u32 {
        match *self {
            HealthPool::Cpu { max_health, .. } => max_health,
            HealthPool::Vault {
                max_vault_health, ..
            } => max_vault_health,
        }
    }

    pub fn is_cpu(&self) -> bool {
        matches!(self, HealthPool::Cpu { .. })
    }

    pub fn is_depleted(&self) -> bool {
        self.current() == 0
    }

    fn current_mut(&mut self) -> &mut u32 {
        match self {
            HealthPool::Cpu { health, .. } => health,
            HealthPool::Vault { vault_health, .. } => vault_health,
        }
    }

    /// Set the current value, clamped to the pool maximum.
    pub fn set(&mut self, value: u32) {
        let max = self.max();
        *self.current_mut() = value.min(max);
    }

    /// Remove up to `amount`; returns what was actually removed.
    pub fn reduce(&mut self, amount: u32) -> u32 {
        let current = self.current_mut();
        let taken = amount.min(*current);
        *current -= taken;
        taken
    }

    /// Add up to `amount` without exceeding the maximum; returns what was added.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let max = self.max();
        let current = self.current_mut();
        let added = amount.min(max - (*current).min(max));
        *current += added;
        added
    }
}

/// Shield-first split of incoming damage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Absorption {
    pub shield_damage: u32,
    pub health_damage: u32,
}

/// Split `incoming` into the part the shield absorbs and the remainder.
pub fn absorb(incoming: u32, shield: u32) -> Absorption {
    let shield_damage = incoming.min(shield);
    Absorption {
        shield_damage,
        health_damage: incoming - shield_damage,
    }
}

/// What a damage application did to a combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageReport {
    pub overshield_damage: u32,
    pub shield_damage: u32,
    /// Damage actually removed from the health pool (after clamping).
    pub health_damage: u32,
    /// The shield was up before the hit and is empty after it.
    pub shield_broken: bool,
    pub health_before: u32,
    pub health_after: u32,
}

impl DamageReport {
    pub fn total(&self) -> u32 {
        self.overshield_damage + self.shield_damage + self.health_damage
    }
}

/// Persistent vault fields a battle starts from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VaultSnapshot {
    pub current_pp: u32,
    pub shield_strength: u32,
    pub max_shield_strength: u32,
    pub vault_health: u32,
    pub capacity: u32,
    pub overshield: u32,
}

/// Partial vault write. `None` leaves the stored field untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VaultPatch {
    pub current_pp: Option<u32>,
    pub shield_strength: Option<u32>,
    pub vault_health: Option<u32>,
    pub overshield: Option<u32>,
}

impl VaultPatch {
    pub fn is_empty(&self) -> bool {
        self.current_pp.is_none()
            && self.shield_strength.is_none()
            && self.vault_health.is_none()
            && self.overshield.is_none()
    }

    /// Merge this patch into a stored snapshot.
    pub fn apply_to(&self, snapshot: &mut VaultSnapshot) {
        if let Some(pp) = self.current_pp {
            snapshot.current_pp = pp;
        }
        if let Some(shield) = self.shield_strength {
            snapshot.shield_strength = shield.min(snapshot.max_shield_strength);
        }
        if let Some(health) = self.vault_health {
            snapshot.vault_health = health;
        }
        if let Some(overshield) = self.overshield {
            snapshot.overshield = overshield;
        }
    }
}

/// Template a CPU opponent is instantiated from.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpponentTemplate {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub speed: u32,
    pub health: u32,
    pub shield: u32,
    pub max_shield: u32,
    /// PP handed to the winner on defeat.
    pub power_points: u32,
    pub moves: Vec<Move>,
    /// Fires the one-shot awakening notification at the configured threshold.
    pub awakens: bool,
}

/// Mutable view of one battle participant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub level: u32,
    pub speed: u32,
    pub side: Side,
    pub controller: Controller,
    pool: HealthPool,
    shield: u32,
    max_shield: u32,
    overshield: u32,
    power_points: u32,
    capacity: Option<u32>,
    pub moves: Vec<Move>,
    cooldowns: BTreeMap<MoveId, u32>,
    pub effects: EffectLedger,
    pub stance: Option<DefensiveStance>,
    pub awakens: bool,
}

impl Combatant {
    pub fn new(
        id: impl Into<CombatantId>,
        name: impl Into<String>,
        level: u32,
        side: Side,
        pool: HealthPool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            speed: 0,
            side,
            controller: Controller::Human,
            pool,
            shield: 0,
            max_shield: 0,
            overshield: 0,
            power_points: 0,
            capacity: None,
            moves: Vec::new(),
            cooldowns: BTreeMap::new(),
            effects: EffectLedger::new(),
            stance: None,
            awakens: false,
        }
    }

    /// Build a vault-backed combatant (the local player or a PvP opponent).
    pub fn from_vault(
        id: impl Into<CombatantId>,
        name: impl Into<String>,
        level: u32,
        side: Side,
        vault: &VaultSnapshot,
    ) -> Self {
        let max_vault_health = vault.capacity.max(vault.vault_health);
        Self::new(
            id,
            name,
            level,
            side,
            HealthPool::vault(vault.vault_health, max_vault_health),
        )
        .with_shield(vault.shield_strength, vault.max_shield_strength)
        .with_overshield(vault.overshield)
        .with_power_points(vault.current_pp, Some(vault.capacity))
    }

    /// Build an AI-controlled CPU opponent.
    pub fn from_template(template: &OpponentTemplate) -> Self {
        let mut combatant = Self::new(
            template.id.as_str(),
            template.name.clone(),
            template.level,
            Side::Opponent,
            HealthPool::cpu(template.health, template.health),
        )
        .with_speed(template.speed)
        .with_controller(Controller::Ai)
        .with_shield(template.shield, template.max_shield)
        .with_power_points(template.power_points, None)
        .with_moves(template.moves.clone());
        combatant.awakens = template.awakens;
        combatant
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_shield(mut self, shield: u32, max_shield: u32) -> Self {
        self.max_shield = max_shield;
        self.shield = shield.min(max_shield);
        self
    }

    pub fn with_overshield(mut self, overshield: u32) -> Self {
        self.overshield = overshield;
        self
    }

    pub fn with_power_points(mut self, power_points: u32, capacity: Option<u32>) -> Self {
        self.capacity = capacity;
        self.power_points = capacity.map_or(power_points, |cap| power_points.min(cap));
        self
    }

    pub fn with_moves(mut self, moves: Vec<Move>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_move(mut self, mv: Move) -> Self {
        self.moves.push(mv);
        self
    }

    pub fn awakening(mut self) -> Self {
        self.awakens = true;
        self
    }

    // ===== pools =====

    pub fn pool(&self) -> &HealthPool {
        &self.pool
    }

    pub fn health(&self) -> u32 {
        self.pool.current()
    }

    pub fn max_health(&self) -> u32 {
        self.pool.max()
    }

    pub fn shield(&self) -> u32 {
        self.shield
    }

    pub fn max_shield(&self) -> u32 {
        self.max_shield
    }

    pub fn overshield(&self) -> u32 {
        self.overshield
    }

    pub fn power_points(&self) -> u32 {
        self.power_points
    }

    pub fn capacity(&self) -> Option<u32> {
        self.capacity
    }

    pub fn is_defeated(&self) -> bool {
        self.pool.is_depleted()
    }

    /// Health as a percentage of maximum (0 when the maximum is 0).
    pub fn health_percent(&self) -> u32 {
        match self.pool.max() {
            0 => 0,
            max => (self.pool.current() as u64 * 100 / max as u64) as u32,
        }
    }

    /// Apply damage: overshield first, then shield, then the health pool.
    pub fn take_damage(&mut self, amount: u32) -> DamageReport {
        let health_before = self.pool.current();
        let shield_before = self.shield;

        let overshield_damage = amount.min(self.overshield);
        self.overshield -= overshield_damage;

        let split = absorb(amount - overshield_damage, self.shield);
        self.shield -= split.shield_damage;
        let health_damage = self.pool.reduce(split.health_damage);

        DamageReport {
            overshield_damage,
            shield_damage: split.shield_damage,
            health_damage,
            shield_broken: shield_before > 0 && self.shield == 0,
            health_before,
            health_after: self.pool.current(),
        }
    }

    /// Damage that bypasses overshield and shield.
    pub fn take_direct_damage(&mut self, amount: u32) -> u32 {
        self.pool.reduce(amount)
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        self.pool.restore(amount)
    }

    pub fn boost_shield(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.max_shield.saturating_sub(self.shield));
        self.shield += added;
        added
    }

    /// Take resource from this combatant. CPU opponents pay with health.
    pub fn drain_resource(&mut self, amount: u32) -> u32 {
        if self.pool.is_cpu() {
            return self.pool.reduce(amount);
        }
        let taken = amount.min(self.power_points);
        self.power_points -= taken;
        taken
    }

    /// Add PP, capped at capacity when the combatant has one.
    pub fn gain_power_points(&mut self, amount: u32) -> u32 {
        let room = self
            .capacity
            .map_or(u32::MAX, |cap| cap.saturating_sub(self.power_points));
        let added = amount.min(room);
        self.power_points += added;
        added
    }

    /// Overwrite pools with absolute values reported by another client.
    pub fn restore_vitals(
        &mut self,
        health: Option<u32>,
        shield: Option<u32>,
        overshield: Option<u32>,
        power_points: Option<u32>,
    ) {
        if let Some(health) = health {
            self.pool.set(health);
        }
        if let Some(shield) = shield {
            self.shield = shield.min(self.max_shield);
        }
        if let Some(overshield) = overshield {
            self.overshield = overshield;
        }
        if let Some(pp) = power_points {
            self.power_points = self.capacity.map_or(pp, |cap| pp.min(cap));
        }
    }

    /// Fields to write back to the vault store (vault-backed combatants only).
    pub fn vault_patch(&self) -> Option<VaultPatch> {
        match self.pool {
            HealthPool::Vault { vault_health, .. } => Some(VaultPatch {
                current_pp: Some(self.power_points),
                shield_strength: Some(self.shield),
                vault_health: Some(vault_health),
                overshield: Some(self.overshield),
            }),
            HealthPool::Cpu { .. } => None,
        }
    }

    // ===== moves =====

    pub fn find_move(&self, id: &MoveId) -> Option<&Move> {
        self.moves.iter().find(|m| &m.id == id)
    }

    pub fn cooldown(&self, id: &MoveId) -> u32 {
        self.cooldowns.get(id).copied().unwrap_or(0)
    }

    /// Moves not currently on cooldown.
    pub fn available_moves(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter().filter(|m| self.cooldown(&m.id) == 0)
    }

    pub fn start_cooldown(&mut self, mv: &Move) {
        if let Some(turns) = mv.cooldown.filter(|t| *t > 0) {
            self.cooldowns.insert(mv.id.clone(), turns);
        }
    }

    /// Count cooldowns down by one owner turn.
    pub fn tick_cooldowns(&mut self) {
        for turns in self.cooldowns.values_mut() {
            *turns = turns.saturating_sub(1);
        }
        self.cooldowns.retain(|_, turns| *turns > 0);
    }
}
