//! Decision Engine v1: Game State / Progression
//!
//! Day counter, phase, decision history, chaos score and the owned
//! resource store. Endings and score are derived on demand.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arithmetic::{half_floor, is_valid_card_id};
use crate::error::EngineError;
use crate::events::GameEvent;
use crate::resources::{ResourceStore, ResourceType};

pub const EARLY_GAME_LAST_DAY: u32 = 10;
pub const MID_GAME_LAST_DAY: u32 = 30;
pub const LATE_GAME_LAST_DAY: u32 = 60;

/// Any history card id containing this marker forces `AlienOverlords`.
pub const ALIEN_ALLIANCE_MARKER: &str = "ALIEN_ALLIANCE";
/// Any history card id containing this marker forces `NuclearWinter`.
pub const NUCLEAR_MARKER: &str = "NUCLEAR";

pub const TIME_LOOP_CHAOS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Introduction,
    EarlyGame,
    MidGame,
    LateGame,
    Endgame,
    GameOver,
}

/// Phase implied by the day number. Never yields `Introduction` or
/// `GameOver`.
pub fn phase_for_day(day: u32) -> GamePhase {
    match day {
        d if d <= EARLY_GAME_LAST_DAY => GamePhase::EarlyGame,
        d if d <= MID_GAME_LAST_DAY => GamePhase::MidGame,
        d if d <= LATE_GAME_LAST_DAY => GamePhase::LateGame,
        _ => GamePhase::Endgame,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndingType {
    DemocraticVictory,
    AutocraticEmpire,
    EconomicCollapse,
    NuclearWinter,
    AlienOverlords,
    ImpeachmentEnding,
    MilitaryCoup,
    MediaRevolution,
    ChaosReigns,
    TimeLoopParadox,
    PeacefulTransition,
    MediocrePresident,
}

// ---------------------------------------------------------------------------
// Decision records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub day: u32,
    pub card_id: String,
    pub choice_id: u32,
}

impl DecisionRecord {
    pub fn new(day: u32, card_id: &str, choice_id: u32) -> Self {
        Self {
            day,
            card_id: card_id.to_string(),
            choice_id,
        }
    }

    /// `day/card_id/choice_id`
    pub fn to_compact(&self) -> String {
        format!("{}/{}/{}", self.day, self.card_id, self.choice_id)
    }

    pub fn parse_compact(s: &str) -> Result<Self, EngineError> {
        let malformed = || EngineError::MalformedRecord(s.to_string());
        let mut parts = s.split('/');
        let (Some(day), Some(card_id), Some(choice), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if !is_valid_card_id(card_id) {
            return Err(malformed());
        }
        Ok(Self {
            day: day.parse().map_err(|_| malformed())?,
            card_id: card_id.to_string(),
            choice_id: choice.parse().map_err(|_| malformed())?,
        })
    }
}

impl fmt::Display for DecisionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}: Card {}, Choice {}", self.day, self.card_id, self.choice_id)
    }
}

impl FromStr for DecisionRecord {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_compact(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub days_in_office: u32,
    pub total_decisions: u32,
    pub chaos_generated: i64,
    pub final_popularity: i32,
    pub final_stability: i32,
    pub overall_score: i64,
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    current_day: u32,
    total_decisions: u32,
    phase: GamePhase,
    history: Vec<DecisionRecord>,
    chaos_score: i64,
    resources: ResourceStore,
    // Index over `history` card ids.
    played: BTreeSet<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Day 1, Introduction, all resources at their initial value.
    pub fn new() -> Self {
        Self::from_parts(1, 0, 0, Vec::new(), ResourceStore::new())
    }

    /// Rebuild a state from persisted parts. The phase is `Introduction`
    /// on day 1 and derived from the day otherwise.
    pub fn from_parts(
        current_day: u32,
        total_decisions: u32,
        chaos_score: i64,
        history: Vec<DecisionRecord>,
        resources: ResourceStore,
    ) -> Self {
        let phase = if current_day <= 1 {
            GamePhase::Introduction
        } else {
            phase_for_day(current_day)
        };
        let played = history.iter().map(|r| r.card_id.clone()).collect();
        Self {
            current_day,
            total_decisions,
            phase,
            history,
            chaos_score,
            resources,
            played,
        }
    }

    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    pub fn total_decisions(&self) -> u32 {
        self.total_decisions
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn history(&self) -> &[DecisionRecord] {
        &self.history
    }

    pub fn chaos_score(&self) -> i64 {
        self.chaos_score
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceStore {
        &mut self.resources
    }

    pub fn has_played(&self, card_id: &str) -> bool {
        self.played.contains(card_id)
    }

    /// Increment the day and re-derive the phase. `GameOver` is sticky.
    pub fn advance_day(&mut self, events: &mut Vec<GameEvent>) {
        self.current_day = self.current_day.saturating_add(1);
        events.push(GameEvent::DayChanged {
            day: self.current_day,
        });

        if self.phase == GamePhase::GameOver {
            return;
        }
        let new = phase_for_day(self.current_day);
        if new != self.phase {
            let old = std::mem::replace(&mut self.phase, new);
            info!(day = self.current_day, ?old, ?new, "phase changed");
            events.push(GameEvent::PhaseChanged { old, new });
        }
    }

    pub fn record_decision(&mut self, card_id: &str, choice_id: u32) {
        self.total_decisions = self.total_decisions.saturating_add(1);
        self.played.insert(card_id.to_string());
        self.history
            .push(DecisionRecord::new(self.current_day, card_id, choice_id));
    }

    /// Unconditional; negative amounts lower the score.
    pub fn add_chaos(&mut self, amount: i64) {
        self.chaos_score = self.chaos_score.saturating_add(amount);
    }

    /// Enter `GameOver`. Emits `PhaseChanged` unless already there.
    pub fn mark_game_over(&mut self, events: &mut Vec<GameEvent>) {
        if self.phase != GamePhase::GameOver {
            let old = std::mem::replace(&mut self.phase, GamePhase::GameOver);
            info!(day = self.current_day, ?old, "administration has fallen");
            events.push(GameEvent::PhaseChanged {
                old,
                new: GamePhase::GameOver,
            });
        }
    }

    /// Ordered cascade; the first matching rule wins.
    pub fn determine_ending(&self) -> EndingType {
        let history_has = |marker: &str| self.history.iter().any(|r| r.card_id.contains(marker));
        let popularity = self.resources.value(ResourceType::Popularity);
        let stability = self.resources.value(ResourceType::Stability);
        let economic = self.resources.value(ResourceType::EconomicHealth);
        let health = self.resources.overall_health();

        if history_has(ALIEN_ALLIANCE_MARKER) {
            EndingType::AlienOverlords
        } else if history_has(NUCLEAR_MARKER) {
            EndingType::NuclearWinter
        } else if self.chaos_score >= TIME_LOOP_CHAOS {
            EndingType::TimeLoopParadox
        } else if stability >= 70 && popularity >= 60 {
            EndingType::DemocraticVictory
        } else if stability <= 20 {
            EndingType::AutocraticEmpire
        } else if economic <= 10 {
            EndingType::EconomicCollapse
        } else if health >= 70 {
            EndingType::PeacefulTransition
        } else if health <= 30 {
            EndingType::ImpeachmentEnding
        } else {
            EndingType::MediocrePresident
        }
    }

    /// `day*100 + overall_health*10 + floor(chaos/2)`, saturating.
    pub fn compute_score(&self) -> i64 {
        i64::from(self.current_day)
            .saturating_mul(100)
            .saturating_add(i64::from(self.resources.overall_health()) * 10)
            .saturating_add(half_floor(self.chaos_score))
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            days_in_office: self.current_day,
            total_decisions: self.total_decisions,
            chaos_generated: self.chaos_score,
            final_popularity: self.resources.value(ResourceType::Popularity),
            final_stability: self.resources.value(ResourceType::Stability),
            overall_score: self.compute_score(),
        }
    }
}
