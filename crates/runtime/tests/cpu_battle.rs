use std::sync::Arc;
use std::time::Duration;

use battle_core::{
    BattleConfig, BattleError, BattleMode, BattlePhase, BattleResult, Combatant, CombatantId,
    Controller, HealthPool, Move, RollTuning, SessionSetup, Side, VaultSnapshot,
};
use battle_runtime::{
    BattleRuntime, Event, InMemoryVaultStore, LimitedQuota, OutcomeEvent, RuntimeConfig,
    RuntimeError, Topic, VaultStore, load_vault_combatant,
};

fn config() -> RuntimeConfig {
    RuntimeConfig {
        opponent_turn_delay: Duration::ZERO,
        battle: BattleConfig {
            roll: RollTuning {
                base_spread_percent: 0,
                mastery_spread_percent: 0,
                ..RollTuning::default()
            },
            ..BattleConfig::default()
        },
        ..RuntimeConfig::default()
    }
}

fn hero_vault() -> VaultSnapshot {
    VaultSnapshot {
        current_pp: 20,
        shield_strength: 0,
        max_shield_strength: 50,
        vault_health: 100,
        capacity: 200,
        overshield: 0,
    }
}

fn goblin(health: u32, shield: u32) -> Combatant {
    Combatant::new("goblin", "Goblin", 3, Side::Opponent, HealthPool::cpu(health, health))
        .with_controller(Controller::Ai)
        .with_shield(shield, shield)
        .with_power_points(30, None)
        .with_move(Move::attack("bite", "Bite", 5))
}

async fn setup(vaults: &InMemoryVaultStore, mode: BattleMode, opponent: Combatant) -> SessionSetup {
    let hero = load_vault_combatant(
        vaults,
        "hero",
        "Hero",
        5,
        Side::Ally,
        Controller::Human,
        vec![Move::attack("strike", "Strike", 20)],
    )
    .await
    .expect("hero vault");
    SessionSetup::new(mode, "hero", 42)
        .with_combatant(hero)
        .with_combatant(opponent)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn play_turn_runs_both_sides_and_checkpoints_the_vault() {
    let vaults = Arc::new(InMemoryVaultStore::new().with_vault("hero", hero_vault()));
    let setup = setup(&vaults, BattleMode::Cpu, goblin(100, 15)).await;
    let runtime = BattleRuntime::builder()
        .config(config())
        .vaults(vaults.clone())
        .start(setup)
        .expect("runtime");
    let handle = runtime.handle();
    let mut log_rx = handle.subscribe(Topic::Log);
    let mut opponent_rx = handle.subscribe(Topic::Opponent);

    let reports = handle.play_turn("strike", "goblin").await.expect("turn");
    assert_eq!(reports.len(), 2);

    let view = handle.view().await.expect("view");
    assert_eq!(view.phase, BattlePhase::Selection);
    assert_eq!(view.turn, 2);
    let goblin = view.combatant(&CombatantId::new("goblin")).expect("goblin");
    assert_eq!((goblin.shield, goblin.health), (0, 95));
    let hero = view.combatant(&CombatantId::new("hero")).expect("hero");
    assert_eq!(hero.health, 95);

    let vault = vaults
        .read(&CombatantId::new("hero"))
        .await
        .expect("read")
        .expect("vault");
    assert_eq!(vault.vault_health, 95);

    let logs = drain(&mut log_rx);
    assert_eq!(logs.len(), 2);
    assert!(matches!(
        &logs[0],
        Event::Log { lines } if lines.iter().any(|l| l.contains("Hero uses Strike!"))
    ));
    assert!(drain(&mut opponent_rx).iter().any(|event| matches!(
        event,
        Event::Combatant(snapshot) if snapshot.id.as_str() == "goblin" && snapshot.health == 95
    )));

    runtime.shutdown().await;
}

#[tokio::test]
async fn victory_pays_out_and_locks_the_battle() {
    let vaults = Arc::new(InMemoryVaultStore::new().with_vault("hero", hero_vault()));
    let setup = setup(&vaults, BattleMode::Cpu, goblin(10, 0)).await;
    let runtime = BattleRuntime::builder()
        .config(config())
        .vaults(vaults.clone())
        .start(setup)
        .expect("runtime");
    let handle = runtime.handle();
    let mut outcome_rx = handle.subscribe(Topic::Outcome);

    let reports = handle.play_turn("strike", "goblin").await.expect("turn");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].ended(), Some(BattleResult::Victory));

    let ended = outcome_rx.recv().await.expect("outcome");
    assert!(matches!(
        ended,
        Event::Outcome(OutcomeEvent::Ended {
            result: BattleResult::Victory,
            reward: 30,
            ..
        })
    ));

    let vault = vaults
        .read(&CombatantId::new("hero"))
        .await
        .expect("read")
        .expect("vault");
    assert_eq!(vault.current_pp, 50);

    let err = handle.select_move("strike").await.expect_err("battle is over");
    assert!(matches!(err, RuntimeError::Battle(BattleError::BattleOver)));

    runtime.shutdown().await;
}

#[tokio::test]
async fn denied_quota_returns_to_selection_untouched() {
    let vaults = Arc::new(InMemoryVaultStore::new().with_vault("hero", hero_vault()));
    let setup = setup(&vaults, BattleMode::Cpu, goblin(100, 15)).await;
    let runtime = BattleRuntime::builder()
        .config(config())
        .vaults(vaults)
        .quota(Arc::new(LimitedQuota::new(1)))
        .start(setup)
        .expect("runtime");
    let handle = runtime.handle();

    handle.play_turn("strike", "goblin").await.expect("first turn");

    handle.select_move("strike").await.expect("select");
    let phase = handle.select_target("goblin").await.expect("target");
    assert_eq!(phase, BattlePhase::Execution);

    let report = handle.execute().await.expect("denial is not an error");
    assert!(report.log_lines.iter().any(|l| l.contains("no uses of strike left")));

    let view = handle.view().await.expect("view");
    assert_eq!(view.phase, BattlePhase::Selection);
    assert_eq!(view.selected_move, None);
    let goblin = view.combatant(&CombatantId::new("goblin")).expect("goblin");
    assert_eq!(goblin.health, 95);

    runtime.shutdown().await;
}

#[tokio::test]
async fn escape_ends_the_battle_from_any_phase() {
    let vaults = Arc::new(InMemoryVaultStore::new().with_vault("hero", hero_vault()));
    let setup = setup(&vaults, BattleMode::Cpu, goblin(100, 15)).await;
    let runtime = BattleRuntime::builder()
        .config(config())
        .vaults(vaults)
        .start(setup)
        .expect("runtime");
    let handle = runtime.handle();
    let mut outcome_rx = handle.subscribe(Topic::Outcome);

    handle.select_move("strike").await.expect("select");
    handle.select_target("goblin").await.expect("target");

    let report = handle.escape().await.expect("escape");
    assert_eq!(report.ended(), Some(BattleResult::Escape));
    assert!(matches!(
        outcome_rx.recv().await.expect("outcome"),
        Event::Outcome(OutcomeEvent::Ended {
            result: BattleResult::Escape,
            ..
        })
    ));

    let err = handle.execute().await.expect_err("battle is over");
    assert!(matches!(err, RuntimeError::Battle(BattleError::BattleOver)));

    runtime.shutdown().await;
}

#[tokio::test]
async fn multiplayer_round_waits_for_human_selections() {
    let vaults = Arc::new(InMemoryVaultStore::new().with_vault("hero", hero_vault()));
    let setup = setup(&vaults, BattleMode::Multiplayer, goblin(100, 15)).await;
    let runtime = BattleRuntime::builder()
        .config(config())
        .vaults(vaults)
        .start(setup)
        .expect("runtime");
    let handle = runtime.handle();

    let err = handle.resolve_round().await.expect_err("hero has not chosen");
    assert!(matches!(
        err,
        RuntimeError::Battle(BattleError::NotReady { .. })
    ));

    handle
        .submit_selection("hero", "strike", "goblin")
        .await
        .expect("submit");
    let report = handle.resolve_round().await.expect("round");
    assert!(report.log_lines.iter().any(|l| l.contains("Goblin uses Bite!")));

    let view = handle.view().await.expect("view");
    assert_eq!(view.turn, 2);
    assert_eq!(view.phase, BattlePhase::Selection);
    let goblin = view.combatant(&CombatantId::new("goblin")).expect("goblin");
    assert_eq!(goblin.health, 95);

    runtime.shutdown().await;
}

#[tokio::test]
async fn missing_vault_is_reported() {
    let vaults = InMemoryVaultStore::new();
    let err = load_vault_combatant(
        &vaults,
        "nobody",
        "Nobody",
        1,
        Side::Ally,
        Controller::Human,
        Vec::new(),
    )
    .await
    .expect_err("no vault");
    assert!(matches!(err, RuntimeError::Repository(_)));
}
