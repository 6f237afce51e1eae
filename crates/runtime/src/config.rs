//! Runtime configuration.

use std::env;
use std::time::Duration;

use battle_core::BattleConfig;

/// Settings for the battle runtime.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// How often the PvP synchronizer polls the move log.
    pub poll_interval: Duration,
    /// Pause before the CPU opponent acts, for readability.
    pub opponent_turn_delay: Duration,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Fixed battle seed; a random one is drawn when unset.
    pub seed: Option<u64>,
    pub battle: BattleConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            opponent_turn_delay: Duration::from_millis(1200),
            event_buffer_size: 100,
            command_buffer_size: 32,
            seed: None,
            battle: BattleConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `BATTLE_POLL_INTERVAL_MS` - PvP poll interval (default: 500)
    /// - `BATTLE_OPPONENT_DELAY_MS` - pause before the CPU turn (default: 1200)
    /// - `BATTLE_EVENT_BUFFER` - per-topic event buffer (default: 100)
    /// - `BATTLE_SEED` - fixed seed for reproducible battles
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_env::<u64>("BATTLE_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = read_env::<u64>("BATTLE_OPPONENT_DELAY_MS") {
            config.opponent_turn_delay = Duration::from_millis(ms);
        }
        if let Some(size) = read_env::<usize>("BATTLE_EVENT_BUFFER") {
            config.event_buffer_size = size.max(1);
        }
        config.seed = read_env::<u64>("BATTLE_SEED");

        config
    }

    /// The configured seed, or a fresh random one.
    pub fn seed_or_random(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
