use serde::{Deserialize, Serialize};

use battle_core::{BattleEvent, BattleResult, CombatantId, CombatantSnapshot};

/// Topics for event routing.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Battle log updates.
    Log,
    /// Combatant state snapshots.
    Opponent,
    /// Battle end and reward banking.
    Outcome,
    /// One-shot narrative hooks such as a boss awakening.
    Story,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Log, Topic::Opponent, Topic::Outcome, Topic::Story];

    pub(crate) const fn index(self) -> usize {
        match self {
            Topic::Log => 0,
            Topic::Opponent => 1,
            Topic::Outcome => 2,
            Topic::Story => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeEvent {
    Ended {
        result: BattleResult,
        winners: Vec<CombatantId>,
        losers: Vec<CombatantId>,
        reward: u32,
    },
    RewardBanked {
        amount: u32,
        total: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoryEvent {
    BossAwakened { combatant: CombatantId, name: String },
}

/// Event wrapper that carries the topic and typed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Lines appended to the battle log, in order.
    Log { lines: Vec<String> },
    Combatant(CombatantSnapshot),
    Outcome(OutcomeEvent),
    Story(StoryEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Log { .. } => Topic::Log,
            Event::Combatant(_) => Topic::Opponent,
            Event::Outcome(_) => Topic::Outcome,
            Event::Story(_) => Topic::Story,
        }
    }
}

impl From<BattleEvent> for Event {
    fn from(event: BattleEvent) -> Self {
        match event {
            BattleEvent::LogUpdated { lines } => Event::Log { lines },
            BattleEvent::CombatantUpdated(snapshot) => Event::Combatant(snapshot),
            BattleEvent::BattleEnded {
                result,
                winners,
                losers,
                reward,
            } => Event::Outcome(OutcomeEvent::Ended {
                result,
                winners,
                losers,
                reward,
            }),
            BattleEvent::RewardBanked { amount, total } => {
                Event::Outcome(OutcomeEvent::RewardBanked { amount, total })
            }
            BattleEvent::BossAwakened { combatant, name } => {
                Event::Story(StoryEvent::BossAwakened { combatant, name })
            }
        }
    }
}
