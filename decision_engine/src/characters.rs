//! Decision Engine v1: Characters
//!
//! Advisors with a bounded loyalty stat and canned dialogue. The roster is
//! also the scene context that decides `required_character_present`.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::eligibility::SceneContext;

pub const LOYALTY_MIN: i32 = 0;
pub const LOYALTY_MAX: i32 = 100;
pub const INITIAL_LOYALTY: i32 = 50;
pub const LOYAL_THRESHOLD: i32 = 70;
pub const HOSTILE_THRESHOLD: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacterArchetype {
    IguanaKing,
    Executive45,
    MascotBot,
    Progressive,
    Corporate,
    Military,
    MediaMogul,
    Populist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DialogueType {
    Greeting,
    Happy,
    Angry,
    Crisis,
    Farewell,
    Agreement,
    Disagreement,
    Advice,
    Warning,
    Celebration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub archetype: CharacterArchetype,
    #[serde(default = "initial_loyalty")]
    loyalty: i32,
    #[serde(default)]
    pub competence: i32,
    #[serde(default)]
    pub chaos_factor: i32,
    #[serde(default)]
    pub dialogue: BTreeMap<DialogueType, Vec<String>>,
}

fn initial_loyalty() -> i32 {
    INITIAL_LOYALTY
}

impl Character {
    pub fn new(id: &str, name: &str, archetype: CharacterArchetype) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            title: String::new(),
            archetype,
            loyalty: INITIAL_LOYALTY,
            competence: 0,
            chaos_factor: 0,
            dialogue: BTreeMap::new(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_lines(mut self, kind: DialogueType, lines: &[&str]) -> Self {
        self.dialogue
            .entry(kind)
            .or_default()
            .extend(lines.iter().map(|l| l.to_string()));
        self
    }

    pub fn loyalty(&self) -> i32 {
        self.loyalty
    }

    pub fn modify_loyalty(&mut self, amount: i32) {
        self.loyalty = self
            .loyalty
            .saturating_add(amount)
            .clamp(LOYALTY_MIN, LOYALTY_MAX);
    }

    pub fn is_loyal(&self) -> bool {
        self.loyalty >= LOYAL_THRESHOLD
    }

    pub fn is_hostile(&self) -> bool {
        self.loyalty <= HOSTILE_THRESHOLD
    }

    pub fn is_neutral(&self) -> bool {
        !self.is_loyal() && !self.is_hostile()
    }

    /// Random line for `kind`, or `"{name}: ..."` when there is none.
    pub fn dialogue<R: Rng + ?Sized>(&self, kind: DialogueType, rng: &mut R) -> String {
        match self.dialogue.get(&kind) {
            Some(lines) if !lines.is_empty() => lines[rng.gen_range(0..lines.len())].clone(),
            _ => format!("{}: ...", self.name),
        }
    }
}

/// Known characters plus who is currently in the scene.
#[derive(Debug, Clone, Default)]
pub struct CharacterRoster {
    characters: BTreeMap<String, Character>,
    present: BTreeSet<String>,
}

impl CharacterRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any character with the same id.
    pub fn add(&mut self, character: Character) {
        self.characters.insert(character.id.clone(), character);
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> + '_ {
        self.characters.values()
    }

    /// False if the character is unknown.
    pub fn enter_scene(&mut self, id: &str) -> bool {
        if !self.characters.contains_key(id) {
            return false;
        }
        self.present.insert(id.to_string());
        true
    }

    pub fn leave_scene(&mut self, id: &str) -> bool {
        self.present.remove(id)
    }

    pub fn clear_scene(&mut self) {
        self.present.clear();
    }

    /// False if the character is unknown.
    pub fn modify_loyalty(&mut self, id: &str, amount: i32) -> bool {
        match self.characters.get_mut(id) {
            Some(c) => {
                c.modify_loyalty(amount);
                true
            }
            None => false,
        }
    }
}

impl SceneContext for CharacterRoster {
    fn is_present(&self, character_id: &str) -> bool {
        self.present.contains(character_id)
    }
}
