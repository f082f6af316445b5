//! Session manager: one game, its deck, its cast and its saves.
//!
//! Per-decision order:
//!   1. Look the card up in the deck
//!   2. engine.resolve_choice (validate, apply, record, notify)
//!   3. Mark the card played in the deck
//!
//! End of day: advance, fall if any resource is depleted, autosave every
//! N days when configured. Concurrency: `SharedSession` serializes access
//! through one Mutex, no global mutable state.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use decision_engine::cards::{CardSupplier, DecisionCard};
use decision_engine::characters::CharacterRoster;
use decision_engine::consequence::ConsequenceResult;
use decision_engine::engine::GameEngine;
use decision_engine::state::{EndingType, GamePhase, GameStats, GameState};
use decision_engine::EngineError;

use crate::config::{ConfigError, SessionConfig};
use crate::deck::{CardDeck, DeckError};
use crate::save_store::SaveStore;
use crate::snapshot_codec::SnapshotError;

/// Keeps the draw stream apart from the consequence stream under one seed.
const DRAW_STREAM: u64 = 0x5EED_D0C5;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("game is over")]
    GameOver,
}

pub struct Session {
    engine: GameEngine,
    deck: CardDeck,
    roster: CharacterRoster,
    store: SaveStore,
    config: SessionConfig,
    draw_rng: StdRng,
}

impl Session {
    /// Deck from the config, empty cast.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let deck = config.load_deck()?;
        Ok(Self::with_parts(config, deck, CharacterRoster::new()))
    }

    pub fn with_parts(config: SessionConfig, deck: CardDeck, roster: CharacterRoster) -> Self {
        let draw_rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ DRAW_STREAM),
            None => StdRng::from_entropy(),
        };
        info!(
            cards = deck.total_cards(),
            seed = ?config.seed,
            save_dir = %config.save_dir.display(),
            "session started"
        );
        Self {
            engine: config.build_engine(),
            store: config.save_store(),
            deck,
            roster,
            config,
            draw_rng,
        }
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// For subscribing to game events.
    pub fn engine_mut(&mut self) -> &mut GameEngine {
        &mut self.engine
    }

    pub fn state(&self) -> &GameState {
        self.engine.state()
    }

    pub fn deck(&self) -> &CardDeck {
        &self.deck
    }

    pub fn roster(&self) -> &CharacterRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut CharacterRoster {
        &mut self.roster
    }

    pub fn store(&self) -> &SaveStore {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_over(&self) -> bool {
        self.engine.state().phase() == GamePhase::GameOver
    }

    pub fn current_hash(&self) -> String {
        self.engine.canonical_hash()
    }

    /// Unplayed cards eligible right now, in deck order. The cast's current
    /// scene decides character requirements.
    pub fn eligible_cards(&self) -> Vec<&DecisionCard> {
        self.deck.eligible_unplayed(self.engine.state(), &self.roster)
    }

    /// Make every card drawable again. Decision history is untouched, so
    /// requirement checks still see earlier plays.
    pub fn reshuffle(&mut self) {
        self.deck.reset_played();
    }

    /// Random unplayed eligible card.
    pub fn next_card(&mut self) -> Option<&DecisionCard> {
        self.deck
            .draw_eligible(self.engine.state(), &self.roster, &mut self.draw_rng)
    }

    pub fn resolve(&mut self, card_id: &str, choice_id: u32) -> Result<ConsequenceResult, SessionError> {
        if self.is_over() {
            return Err(SessionError::GameOver);
        }
        let card = self
            .deck
            .card(card_id)
            .ok_or_else(|| EngineError::UnknownCard(card_id.to_string()))?;
        let result = self.engine.resolve_choice(card, choice_id)?;
        self.deck.mark_played(card_id);
        Ok(result)
    }

    pub fn add_chaos(&mut self, amount: i64) {
        self.engine.add_chaos(amount);
    }

    /// Advance one day. Returns true once the game is over. Autosave
    /// failures are logged, not returned.
    pub fn end_day(&mut self) -> bool {
        let over = self.engine.end_day();

        let every = self.config.autosave_every_days;
        let day = self.engine.state().current_day();
        if every > 0 && day % every == 0 {
            if let Err(e) = self.store.save(self.engine.state(), &self.config.autosave_name) {
                warn!(day, error = %e, "autosave failed");
            }
        }
        over
    }

    pub fn save(&self, name: &str) -> Result<PathBuf, SessionError> {
        Ok(self.store.save(self.engine.state(), name)?)
    }

    /// Restore from `name`. Returns false and keeps the current game when
    /// the save is missing or unreadable.
    pub fn load(&mut self, name: &str) -> bool {
        let Some(state) = self.store.load_state(name) else {
            return false;
        };
        self.deck.reset_played();
        for record in state.history() {
            self.deck.mark_played(&record.card_id);
        }
        self.engine.restore(state);
        true
    }

    /// End the game: the phase becomes `GameOver` and the final verdict is
    /// returned. Calling it again returns the same verdict.
    pub fn finish(&mut self) -> (EndingType, GameStats) {
        self.engine.mark_game_over();
        let ending = self.engine.determine_ending();
        let stats = self.engine.stats();
        info!(
            ?ending,
            days = stats.days_in_office,
            score = stats.overall_score,
            "game finished"
        );
        (ending, stats)
    }
}

/// Thread-safe session handle.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Poisoning is ignored; the session stays usable after a caller panics.
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access.
    pub fn with<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn resolve(&self, card_id: &str, choice_id: u32) -> Result<ConsequenceResult, SessionError> {
        self.lock().resolve(card_id, choice_id)
    }

    pub fn end_day(&self) -> bool {
        self.lock().end_day()
    }

    pub fn save(&self, name: &str) -> Result<PathBuf, SessionError> {
        self.lock().save(name)
    }

    pub fn load(&self, name: &str) -> bool {
        self.lock().load(name)
    }

    pub fn finish(&self) -> (EndingType, GameStats) {
        self.lock().finish()
    }

    pub fn current_hash(&self) -> String {
        self.lock().current_hash()
    }

    pub fn into_inner(self) -> Session {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
