use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use battle_core::{
    BattleConfig, BattleMode, BattlePhase, Combatant, CombatantId, Controller, EffectKind, Move,
    MoveRecord, RecordId, RollTuning, SessionSetup, Side, StatusEffectSpec, VaultSnapshot,
};
use battle_runtime::{
    BattleHandle, BattleRuntime, InMemoryMoveLog, InMemoryVaultStore, MoveLogStore, PvpSync,
    RepositoryError, RuntimeConfig, VaultStore,
};

const ROOM: &str = "arena-1";

fn config() -> RuntimeConfig {
    RuntimeConfig {
        poll_interval: Duration::from_millis(10),
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

fn vault() -> VaultSnapshot {
    VaultSnapshot {
        current_pp: 40,
        shield_strength: 0,
        max_shield_strength: 30,
        vault_health: 100,
        capacity: 150,
        overshield: 0,
    }
}

fn duelist(id: &str, name: &str, side: Side, controller: Controller) -> Combatant {
    Combatant::from_vault(id, name, 4, side, &vault())
        .with_controller(controller)
        .with_move(Move::attack("strike", "Strike", 20))
        .with_move(Move::new("ember", "Ember").with_status(
            StatusEffectSpec::new(EffectKind::Burn, 3)
                .with_chance(100)
                .with_damage_per_turn(10),
        ))
}

/// One client's view of the duel: `local` plays, `remote` arrives via the log.
fn duel(local: (&str, &str), remote: (&str, &str)) -> SessionSetup {
    SessionSetup::new(BattleMode::Pvp, local.0, 7)
        .with_room(ROOM)
        .with_combatant(duelist(local.0, local.1, Side::Ally, Controller::Human))
        .with_combatant(duelist(remote.0, remote.1, Side::Opponent, Controller::Remote))
}

fn shared_vaults() -> Arc<InMemoryVaultStore> {
    Arc::new(
        InMemoryVaultStore::new()
            .with_vault("alice", vault())
            .with_vault("bob", vault()),
    )
}

fn start(
    setup: SessionSetup,
    vaults: Arc<InMemoryVaultStore>,
    log: Arc<InMemoryMoveLog>,
    auto_sync: bool,
) -> BattleRuntime {
    BattleRuntime::builder()
        .config(config())
        .vaults(vaults)
        .move_log(log)
        .auto_sync(auto_sync)
        .start(setup)
        .expect("runtime")
}

fn sync_for<L: MoveLogStore + 'static>(handle: &BattleHandle, log: &Arc<L>, player: &str) -> PvpSync {
    PvpSync::new(
        handle.clone(),
        log.clone(),
        ROOM,
        CombatantId::new(player),
        Duration::from_millis(10),
    )
}

async fn health_of(handle: &BattleHandle, id: &str) -> u32 {
    let view = handle.view().await.expect("view");
    view.combatant(&CombatantId::new(id)).expect("combatant").health
}

#[tokio::test]
async fn both_clients_converge_on_the_same_state_and_log() {
    let vaults = shared_vaults();
    let log = Arc::new(InMemoryMoveLog::new());
    let alice = start(duel(("alice", "Alice"), ("bob", "Bob")), vaults.clone(), log.clone(), false);
    let bob = start(duel(("bob", "Bob"), ("alice", "Alice")), vaults.clone(), log.clone(), false);
    let (alice_handle, bob_handle) = (alice.handle(), bob.handle());
    let alice_sync = sync_for(&alice_handle, &log, "alice");
    let bob_sync = sync_for(&bob_handle, &log, "bob");

    alice_handle.play_turn("strike", "bob").await.expect("alice strikes");
    assert_eq!(log.len(ROOM), 1);
    assert_eq!(
        alice_handle.view().await.expect("view").phase,
        BattlePhase::OpponentTurn
    );
    // A client never applies its own records.
    assert_eq!(alice_sync.poll_once().await.expect("poll"), 0);

    assert_eq!(bob_sync.poll_once().await.expect("poll"), 1);
    assert_eq!(bob_sync.poll_once().await.expect("poll again"), 0);
    assert_eq!(health_of(&bob_handle, "bob").await, 80);
    assert_eq!(health_of(&alice_handle, "bob").await, 80);
    assert_eq!(
        bob_handle.view().await.expect("view").phase,
        BattlePhase::Selection
    );

    bob_handle.play_turn("strike", "alice").await.expect("bob strikes");
    assert_eq!(alice_sync.poll_once().await.expect("poll"), 1);
    assert_eq!(health_of(&alice_handle, "alice").await, 80);

    let alice_log = alice_handle.view().await.expect("view").log;
    let bob_log = bob_handle.view().await.expect("view").log;
    assert_eq!(alice_log, bob_log);

    // The attacking client writes the defender's vault too.
    let stored = vaults
        .read(&CombatantId::new("alice"))
        .await
        .expect("read")
        .expect("vault");
    assert_eq!(stored.vault_health, 80);

    alice.shutdown().await;
    bob.shutdown().await;
}

#[tokio::test]
async fn malformed_records_do_not_stall_the_poller() {
    let log = Arc::new(InMemoryMoveLog::new());
    let bob = start(duel(("bob", "Bob"), ("alice", "Alice")), shared_vaults(), log.clone(), false);
    let handle = bob.handle();
    let sync = sync_for(&handle, &log, "bob");

    log.append(
        ROOM,
        MoveRecord {
            id: RecordId::new("broken"),
            actor_id: CombatantId::new("alice"),
            ..MoveRecord::default()
        },
    )
    .await
    .expect("append");

    assert_eq!(sync.poll_once().await.expect("poll"), 1);
    let view = handle.view().await.expect("view");
    assert!(
        view.log
            .iter()
            .any(|line| line.contains("alice attacked for 0 damage."))
    );
    assert_eq!(health_of(&handle, "bob").await, 100);
    assert_eq!(sync.poll_once().await.expect("poll"), 0);

    bob.shutdown().await;
}

#[tokio::test]
async fn spawned_poller_applies_records_in_the_background() {
    let vaults = shared_vaults();
    let log = Arc::new(InMemoryMoveLog::new());
    let alice = start(duel(("alice", "Alice"), ("bob", "Bob")), vaults.clone(), log.clone(), true);
    let bob = start(duel(("bob", "Bob"), ("alice", "Alice")), vaults, log.clone(), true);
    let bob_handle = bob.handle();

    alice
        .handle()
        .play_turn("strike", "bob")
        .await
        .expect("alice strikes");

    let synced = tokio::time::timeout(Duration::from_secs(2), async {
        while health_of(&bob_handle, "bob").await != 80 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(synced.is_ok(), "bob never saw alice's strike");

    alice.shutdown().await;
    bob.shutdown().await;
}

#[tokio::test]
async fn failed_vault_checkpoint_skips_the_record() {
    let log = Arc::new(InMemoryMoveLog::new());
    let alice = start(
        duel(("alice", "Alice"), ("bob", "Bob")),
        Arc::new(InMemoryVaultStore::new()),
        log.clone(),
        false,
    );
    let handle = alice.handle();

    handle
        .play_turn("strike", "bob")
        .await
        .expect("store failure does not fail the turn");

    assert_eq!(health_of(&handle, "bob").await, 80);
    assert_eq!(log.len(ROOM), 0);

    alice.shutdown().await;
}

#[tokio::test]
async fn burn_crosses_the_log_and_ticks_on_the_owner_client() {
    let vaults = shared_vaults();
    let log = Arc::new(InMemoryMoveLog::new());
    let alice = start(duel(("alice", "Alice"), ("bob", "Bob")), vaults.clone(), log.clone(), false);
    let bob = start(duel(("bob", "Bob"), ("alice", "Alice")), vaults.clone(), log.clone(), false);
    let (alice_handle, bob_handle) = (alice.handle(), bob.handle());
    let alice_sync = sync_for(&alice_handle, &log, "alice");
    let bob_sync = sync_for(&bob_handle, &log, "bob");

    alice_handle.play_turn("ember", "bob").await.expect("alice burns");
    assert_eq!(bob_sync.poll_once().await.expect("poll"), 1);
    let view = bob_handle.view().await.expect("view");
    let burning = view.combatant(&CombatantId::new("bob")).expect("bob");
    assert_eq!(burning.effects, vec![EffectKind::Burn]);

    bob_handle.play_turn("strike", "alice").await.expect("bob strikes");
    assert_eq!(health_of(&bob_handle, "bob").await, 90);

    assert_eq!(alice_sync.poll_once().await.expect("poll"), 1);
    let view = alice_handle.view().await.expect("view");
    let burning = view.combatant(&CombatantId::new("bob")).expect("bob");
    assert_eq!((burning.health, burning.effects.clone()), (90, vec![EffectKind::Burn]));
    assert_eq!(health_of(&alice_handle, "alice").await, 80);

    let stored = vaults
        .read(&CombatantId::new("bob"))
        .await
        .expect("read")
        .expect("vault");
    assert_eq!(stored.vault_health, 90);

    alice.shutdown().await;
    bob.shutdown().await;
}

/// Move log that refuses the first `failures` appends.
struct FlakyLog {
    inner: InMemoryMoveLog,
    failures: AtomicUsize,
}

#[async_trait]
impl MoveLogStore for FlakyLog {
    async fn append(&self, room: &str, record: MoveRecord) -> Result<RecordId, RepositoryError> {
        let refused = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(RepositoryError::LockPoisoned);
        }
        self.inner.append(room, record).await
    }

    async fn query_unprocessed(
        &self,
        room: &str,
        exclude_actor: &CombatantId,
        self_id: &str,
    ) -> Result<Vec<MoveRecord>, RepositoryError> {
        self.inner.query_unprocessed(room, exclude_actor, self_id).await
    }

    async fn mark_processed(
        &self,
        room: &str,
        record: &RecordId,
        self_id: &str,
    ) -> Result<(), RepositoryError> {
        self.inner.mark_processed(room, record, self_id).await
    }
}

#[tokio::test]
async fn failed_append_keeps_the_record_for_the_next_flush() {
    let log = Arc::new(FlakyLog {
        inner: InMemoryMoveLog::new(),
        failures: AtomicUsize::new(1),
    });
    let alice = BattleRuntime::builder()
        .config(config())
        .vaults(shared_vaults())
        .move_log(log.clone())
        .auto_sync(false)
        .start(duel(("alice", "Alice"), ("bob", "Bob")))
        .expect("runtime");
    let handle = alice.handle();
    let sync = sync_for(&handle, &log, "alice");

    handle.play_turn("strike", "bob").await.expect("alice strikes");
    assert_eq!(log.inner.len(ROOM), 0);

    // Applying bob's answer settles another transition, which flushes again.
    log.inner
        .append(
            ROOM,
            MoveRecord {
                id: RecordId::new("bob-answer"),
                actor_id: CombatantId::new("bob"),
                ..MoveRecord::default()
            },
        )
        .await
        .expect("append");
    assert_eq!(sync.poll_once().await.expect("poll"), 1);

    assert_eq!(log.inner.len(ROOM), 2);
    let pending = log
        .inner
        .query_unprocessed(ROOM, &CombatantId::new("bob"), "bob")
        .await
        .expect("query");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].actor_id.as_str(), "alice");

    alice.shutdown().await;
}
