//! Headless CPU battle driven from the content catalog.
//!
//! Environment variables (a `.env` file is loaded if present):
//! - `BATTLE_OPPONENT` - opponent template id (default: `ember_wolf`)
//! - `BATTLE_MAX_TURNS` - escape after this many turns (default: 40)
//! - `BATTLE_CATALOG_OVERRIDES` - path to a JSON override table
//! - everything [`RuntimeConfig::from_env`] reads
use std::env;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use battle_content::ContentFactory;
use battle_core::{
    BattleError, BattleMode, Combatant, Controller, Move, MoveKind, SessionSetup, Side,
    VaultSnapshot,
};
use battle_runtime::{
    BattleHandle, BattleRuntime, ContentCatalog, InMemoryVaultStore, MoveCatalog, RuntimeConfig,
    RuntimeError, load_vault_combatant, logging,
};

const PLAYER_ID: &str = "player";
const LOADOUT: [&str; 5] = ["strike", "siphon", "flame_lash", "iron_guard", "mend"];

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    logging::init()?;

    let config = RuntimeConfig::from_env();
    let opponent_id = env::var("BATTLE_OPPONENT").unwrap_or_else(|_| "ember_wolf".to_owned());
    let max_turns: u32 = env::var("BATTLE_MAX_TURNS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(40);

    let content = ContentFactory::load_embedded()?;
    let catalog = ContentCatalog::new(content.moves().clone());
    if let Ok(path) = env::var("BATTLE_CATALOG_OVERRIDES") {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read overrides {path}"))?;
        let loaded = catalog.load_overrides_json(&json)?;
        tracing::info!("Loaded {} catalog override(s) from {}", loaded, path);
    }

    let template = content
        .opponent(&opponent_id)
        .ok_or_else(|| anyhow!("Unknown opponent '{}'", opponent_id))?;
    let moves = catalog.loadout(&LOADOUT, 2, 1)?;

    let vaults = Arc::new(InMemoryVaultStore::new().with_vault(PLAYER_ID, starter_vault()));
    let player = load_vault_combatant(
        vaults.as_ref(),
        PLAYER_ID,
        "Player",
        5,
        Side::Ally,
        Controller::Human,
        moves.clone(),
    )
    .await?
    .with_speed(15);

    let seed = config.seed_or_random();
    tracing::info!("Battle seed: {}", seed);
    let setup = SessionSetup::new(BattleMode::Cpu, PLAYER_ID, seed)
        .with_combatant(player)
        .with_combatant(Combatant::from_template(template));

    let runtime = BattleRuntime::builder()
        .config(config)
        .vaults(vaults)
        .start(setup)?;
    let handle = runtime.handle();

    let result = fight(&handle, &moves, &template.id, max_turns).await;
    runtime.shutdown().await;
    result
}

fn starter_vault() -> VaultSnapshot {
    VaultSnapshot {
        current_pp: 50,
        shield_strength: 30,
        max_shield_strength: 60,
        vault_health: 120,
        capacity: 500,
        overshield: 0,
    }
}

/// Round-robin over the loadout that notices when every move was refused in a row.
#[derive(Debug, Default)]
struct Rotation {
    next: usize,
    refused: usize,
}

impl Rotation {
    /// The move to try next, or `None` once the whole loadout is on cooldown.
    fn pick<'a>(&mut self, moves: &'a [Move]) -> Option<&'a Move> {
        if moves.is_empty() || self.refused >= moves.len() {
            return None;
        }
        let mv = &moves[self.next % moves.len()];
        self.next += 1;
        Some(mv)
    }

    fn refused(&mut self) {
        self.refused += 1;
    }

    fn played(&mut self) {
        self.refused = 0;
    }
}

/// Rotate through the loadout, skipping moves on cooldown.
///
/// Escapes when the turn limit is hit or no move in the loadout is usable.
async fn fight(handle: &BattleHandle, moves: &[Move], opponent: &str, max_turns: u32) -> Result<()> {
    let mut rotation = Rotation::default();
    loop {
        let view = handle.view().await?;
        if let Some(outcome) = view.outcome {
            println!("Battle over: {outcome}");
            return Ok(());
        }
        if view.turn > max_turns {
            print_lines(&handle.escape().await?.log_lines);
            continue;
        }

        let Some(mv) = rotation.pick(moves) else {
            tracing::warn!("No usable move left in the loadout; escaping");
            print_lines(&handle.escape().await?.log_lines);
            continue;
        };
        let target = match mv.kind {
            MoveKind::Attack => opponent,
            MoveKind::Defense | MoveKind::Support => PLAYER_ID,
        };

        match handle.play_turn(mv.id.clone(), target).await {
            Ok(reports) => {
                rotation.played();
                reports.iter().for_each(|r| print_lines(&r.log_lines));
            }
            Err(RuntimeError::Battle(BattleError::MoveOnCooldown { .. })) => rotation.refused(),
            Err(err) => return Err(err.into()),
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loadout() -> Vec<Move> {
        vec![
            Move::attack("strike", "Strike", 10),
            Move::attack("flame_lash", "Flame Lash", 15),
        ]
    }

    #[test]
    fn rotation_cycles_the_loadout() {
        let moves = loadout();
        let mut rotation = Rotation::default();
        let picked: Vec<_> = (0..3)
            .filter_map(|_| rotation.pick(&moves).map(|m| m.id.as_str().to_owned()))
            .collect();
        assert_eq!(picked, vec!["strike", "flame_lash", "strike"]);
    }

    #[test]
    fn rotation_gives_up_when_every_move_is_refused() {
        let moves = loadout();
        let mut rotation = Rotation::default();
        for _ in 0..moves.len() {
            assert!(rotation.pick(&moves).is_some());
            rotation.refused();
        }
        assert!(rotation.pick(&moves).is_none());

        rotation.played();
        assert!(rotation.pick(&moves).is_some());
    }

    #[test]
    fn empty_loadout_has_nothing_to_pick() {
        assert!(Rotation::default().pick(&[]).is_none());
    }
}
