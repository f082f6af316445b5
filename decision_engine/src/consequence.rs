//! Decision Engine v1: Consequence Engine
//!
//! Turns one applied choice into headlines, consequence lines and an
//! optional cascade event. The resource store is borrowed for the duration
//! of a single `process_choice` call; randomness is injected so every run
//! can be replayed from a seed.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::cards::{CardCategory, CardChoice, DecisionCard};
use crate::events::GameEvent;
use crate::resources::{CrisisLevel, ResourceMap, ResourceStore, ResourceType};

/// Minimum |delta| for a resource headline.
pub const HEADLINE_THRESHOLD: i32 = 15;
/// Minimum |delta| on any single resource that forces a cascade.
pub const CASCADE_THRESHOLD: i32 = 20;
pub const MAJOR_IMPACT: i64 = 30;
pub const MODERATE_IMPACT: i64 = 15;
/// A delta below this counts as a heavy loss.
pub const HEAVY_LOSS: i32 = -10;
pub const DEFAULT_RECENT_HEADLINES: usize = 5;

pub const GENERIC_HEADLINE: &str = "Nation Reacts to Presidential Decision";
pub const CASCADE_TITLE: &str = "CASCADE EVENT TRIGGERED";

pub const SATIRICAL_HEADLINES: [&str; 8] = [
    "President's Latest Decision Leaves Nation Confused",
    "Experts Baffled by Presidential Strategy",
    "White House: 'Everything is Fine, Probably'",
    "'This is Fine' Says President as Chaos Unfolds",
    "Nation Collectively Shrugs at Latest Executive Action",
    "Presidential Decision Described as 'Certainly a Choice'",
    "Historians Will Have Questions About This Era",
    "President Continues to President, Nation Watches",
];

const MAJOR_IMPACT_LINES: [&str; 2] = [
    "Your decision sends shockwaves through the capital",
    "International community 'deeply concerned' about recent events",
];
const MODERATE_IMPACT_LINES: [&str; 2] = [
    "Cabinet members exchange worried glances",
    "Social media explodes with reactions",
];
const HEAVY_LOSS_LINES: [&str; 2] = [
    "Critics call for immediate resignation",
    "Emergency cabinet meeting scheduled",
];

/// Canned headline for a resource moving in the direction of `change`.
pub fn resource_headline(kind: ResourceType, change: i32) -> &'static str {
    use ResourceType::*;
    match (kind, change.signum()) {
        (Popularity, 1) => "President's Approval Rating Surges After Bold Move",
        (Popularity, -1) => "Nationwide Protests Erupt Following Presidential Decision",
        (Stability, 1) => "Markets Rally as Government Shows Strength",
        (Stability, -1) => "Institutional Crisis: Confidence in Government Plummets",
        (MediaTrust, 1) => "Media Praises Presidential Transparency",
        (MediaTrust, -1) => "Press Declares 'Attack on Free Media' After Latest Decision",
        (EconomicHealth, 1) => "Economic Boom: Markets Hit All-Time High",
        (EconomicHealth, -1) => "Economic Catastrophe Looms as Markets Crash",
        _ => GENERIC_HEADLINE,
    }
}

/// Description of a cascade at the given crisis level.
pub fn cascade_description(level: CrisisLevel) -> &'static str {
    match level {
        CrisisLevel::Severe => "Your decisions have triggered a constitutional crisis!",
        CrisisLevel::Critical => "The government is on the brink of collapse!",
        CrisisLevel::GameOver => "GAME OVER: The administration has fallen.",
        CrisisLevel::Normal | CrisisLevel::Warning => "Tensions are rising across the nation.",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeEvent {
    pub title: String,
    pub description: String,
    pub severity: CrisisLevel,
}

impl CascadeEvent {
    pub fn for_level(level: CrisisLevel) -> Self {
        Self {
            title: CASCADE_TITLE.to_string(),
            description: cascade_description(level).to_string(),
            severity: level,
        }
    }
}

/// Outcome of one processed choice. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsequenceResult {
    pub card_id: String,
    pub choice_id: u32,
    pub choice_text: String,
    /// Actual deltas, one entry per effect key (zero deltas included).
    pub resource_changes: ResourceMap<i32>,
    pub headlines: Vec<String>,
    pub consequences: Vec<String>,
    pub followup_cards: Vec<String>,
    pub cascade_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cascade_event: Option<CascadeEvent>,
}

impl ConsequenceResult {
    /// Sum of |delta| over all applied changes.
    pub fn total_impact(&self) -> i64 {
        total_impact(&self.resource_changes)
    }
}

fn total_impact(changes: &ResourceMap<i32>) -> i64 {
    changes.values().map(|&v| i64::from(v).abs()).sum()
}

pub struct ConsequenceEngine<R: Rng = StdRng> {
    rng: R,
    satirical_pool: Vec<String>,
    headlines: VecDeque<String>,
    headline_capacity: Option<usize>,
    history: Vec<String>,
}

impl ConsequenceEngine<StdRng> {
    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> ConsequenceEngine<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            satirical_pool: SATIRICAL_HEADLINES.iter().map(|s| s.to_string()).collect(),
            headlines: VecDeque::new(),
            headline_capacity: None,
            history: Vec::new(),
        }
    }

    /// Replace the satirical fallback pool. An empty pool falls back to the
    /// generic headline.
    pub fn with_satirical_pool(mut self, pool: Vec<String>) -> Self {
        self.satirical_pool = pool;
        self
    }

    /// Cap the headline log and the history log, dropping the oldest
    /// entries first.
    pub fn with_headline_capacity(mut self, capacity: usize) -> Self {
        self.headline_capacity = Some(capacity);
        self.trim_logs();
        self
    }

    /// Apply `choice` to `store` and describe what happened.
    ///
    /// `day` is the in-game day used in the history line. The pairing of
    /// `card` and `choice` is not checked.
    pub fn process_choice(
        &mut self,
        store: &mut ResourceStore,
        day: u32,
        card: &DecisionCard,
        choice: &CardChoice,
        events: &mut Vec<GameEvent>,
    ) -> ConsequenceResult {
        let changes = store.apply_changes(&choice.effects, events);

        let headlines = self.generate_headlines(card, choice, &changes);
        self.headlines.extend(headlines.iter().cloned());

        let mut consequences = choice.consequences.clone();
        consequences.extend(dynamic_consequences(&changes).into_iter().map(String::from));

        let level = store.crisis_level();
        let cascade_triggered = changes.values().any(|&v| v.abs() >= CASCADE_THRESHOLD)
            || level >= CrisisLevel::Severe;
        let cascade_event = cascade_triggered.then(|| CascadeEvent::for_level(level));

        self.history.push(format!(
            "Day {}: {} -> {}",
            day,
            choice.text,
            headlines.join(", ")
        ));
        self.trim_logs();

        let result = ConsequenceResult {
            card_id: card.id.clone(),
            choice_id: choice.choice_id,
            choice_text: choice.text.clone(),
            resource_changes: changes,
            headlines,
            consequences,
            followup_cards: choice.followup_card_ids.clone(),
            cascade_triggered,
            cascade_event,
        };

        debug!(
            card_id = %result.card_id,
            choice_id = result.choice_id,
            impact = result.total_impact(),
            cascade = result.cascade_triggered,
            ?level,
            "choice processed"
        );

        events.push(GameEvent::ConsequenceGenerated(Box::new(result.clone())));
        result
    }

    /// The last `count` headlines, oldest first.
    pub fn recent_headlines(&self, count: usize) -> Vec<String> {
        let skip = self.headlines.len().saturating_sub(count);
        self.headlines.iter().skip(skip).cloned().collect()
    }

    /// One line per processed choice, in processing order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn generate_headlines(
        &mut self,
        card: &DecisionCard,
        choice: &CardChoice,
        changes: &ResourceMap<i32>,
    ) -> Vec<String> {
        let mut headlines: Vec<String> = changes
            .iter()
            .filter(|&(_, &change)| change.abs() >= HEADLINE_THRESHOLD)
            .map(|(kind, &change)| resource_headline(kind, change).to_string())
            .collect();

        if card.category == CardCategory::Crisis {
            headlines.push(format!("BREAKING: {} - {}", card.title, choice.text));
        }

        if headlines.is_empty() {
            headlines.push(self.satirical_headline());
        }
        headlines
    }

    fn satirical_headline(&mut self) -> String {
        if self.satirical_pool.is_empty() {
            return GENERIC_HEADLINE.to_string();
        }
        let idx = self.rng.gen_range(0..self.satirical_pool.len());
        self.satirical_pool[idx].clone()
    }

    fn trim_logs(&mut self) {
        if let Some(cap) = self.headline_capacity {
            while self.headlines.len() > cap {
                self.headlines.pop_front();
            }
            let excess = self.history.len().saturating_sub(cap);
            self.history.drain(..excess);
        }
    }
}

fn dynamic_consequences(changes: &ResourceMap<i32>) -> Vec<&'static str> {
    let mut lines = Vec::new();
    let impact = total_impact(changes);
    if impact > MAJOR_IMPACT {
        lines.extend(MAJOR_IMPACT_LINES);
    } else if impact > MODERATE_IMPACT {
        lines.extend(MODERATE_IMPACT_LINES);
    }
    if changes.values().filter(|&&v| v < HEAVY_LOSS).count() >= 2 {
        lines.extend(HEAVY_LOSS_LINES);
    }
    lines
}
