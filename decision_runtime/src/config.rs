//! Session configuration, loaded from JSON. Every field has a default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use decision_engine::arithmetic::is_valid_card_id;
use decision_engine::consequence::ConsequenceEngine;
use decision_engine::engine::GameEngine;

use crate::deck::{CardDeck, DeckError};
use crate::save_store::{SaveStore, DEFAULT_SAVE_DIR, DEFAULT_SAVE_NAME};

pub const DEFAULT_MAX_DAYS: u32 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Seed for the consequence RNG. Absent means seeded from entropy.
    pub seed: Option<u64>,
    pub save_dir: PathBuf,
    pub autosave_name: String,
    /// Autosave every N days; 0 disables autosave.
    pub autosave_every_days: u32,
    /// Cap on the headline log and the consequence history log; absent
    /// keeps every entry.
    pub headline_log_capacity: Option<usize>,
    /// Replaces the built-in satirical fallback headlines.
    pub satirical_headlines: Option<Vec<String>>,
    /// Card definitions; absent means the bundled deck.
    pub deck_path: Option<PathBuf>,
    /// Length of a harness run.
    pub max_days: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            autosave_name: DEFAULT_SAVE_NAME.to_string(),
            autosave_every_days: 0,
            headline_log_capacity: None,
            satirical_headlines: None,
            deck_path: None,
            max_days: DEFAULT_MAX_DAYS,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_card_id(&self.autosave_name) {
            return Err(ConfigError::Invalid {
                field: "autosave_name",
                reason: format!("{:?} must match [A-Za-z0-9_-]+", self.autosave_name),
            });
        }
        if self.headline_log_capacity == Some(0) {
            return Err(ConfigError::Invalid {
                field: "headline_log_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Consequence engine configured from seed, pool and headline cap.
    pub fn build_consequences(&self) -> ConsequenceEngine {
        let mut engine = match self.seed {
            Some(seed) => ConsequenceEngine::with_seed(seed),
            None => ConsequenceEngine::from_entropy(),
        };
        if let Some(pool) = &self.satirical_headlines {
            engine = engine.with_satirical_pool(pool.clone());
        }
        if let Some(cap) = self.headline_log_capacity {
            engine = engine.with_headline_capacity(cap);
        }
        engine
    }

    pub fn build_engine(&self) -> GameEngine {
        GameEngine::new(self.build_consequences())
    }

    pub fn load_deck(&self) -> Result<CardDeck, DeckError> {
        match &self.deck_path {
            Some(path) => CardDeck::from_file(path),
            None => CardDeck::bundled(),
        }
    }

    pub fn save_store(&self) -> SaveStore {
        SaveStore::new(&self.save_dir)
    }
}
