//! Decision Engine v1: Card / Choice Model
//!
//! Pure data. Cards and choices are immutable once built; the kernel only
//! evaluates eligibility and applies effects.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::arithmetic::validate_card_id;
use crate::error::EngineError;
use crate::resources::{ResourceMap, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardCategory {
    #[default]
    Normal,
    Crisis,
    Scandal,
    Opportunity,
    Character,
    Absurd,
    EndGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum CardRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum UrgencyLevel {
    #[default]
    Normal,
    Elevated,
    Urgent,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChoiceAlignment {
    #[default]
    Neutral,
    Cautious,
    Aggressive,
    Chaotic,
    Diplomatic,
    Authoritarian,
}

/// One option on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardChoice {
    pub choice_id: u32,
    pub text: String,
    /// Signed deltas; keys need not cover all four resources.
    #[serde(default)]
    pub effects: ResourceMap<i32>,
    #[serde(default)]
    pub consequences: Vec<String>,
    #[serde(default)]
    pub followup_card_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence_preview: Option<String>,
    #[serde(default)]
    pub alignment: ChoiceAlignment,
}

impl CardChoice {
    pub fn new(choice_id: u32, text: &str) -> Self {
        Self {
            choice_id,
            text: text.to_string(),
            effects: ResourceMap::new(),
            consequences: Vec::new(),
            followup_card_ids: Vec::new(),
            consequence_preview: None,
            alignment: ChoiceAlignment::Neutral,
        }
    }

    pub fn with_effect(mut self, kind: ResourceType, amount: i32) -> Self {
        self.effects.insert(kind, amount);
        self
    }

    pub fn with_consequence(mut self, line: &str) -> Self {
        self.consequences.push(line.to_string());
        self
    }

    pub fn with_followup(mut self, card_id: &str) -> Self {
        self.followup_card_ids.push(card_id.to_string());
        self
    }

    pub fn with_alignment(mut self, alignment: ChoiceAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Optional predicate bundle. An absent field is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardRequirements {
    pub min_day: Option<u32>,
    pub max_day: Option<u32>,
    pub min_resource_values: Option<ResourceMap<i32>>,
    pub max_resource_values: Option<ResourceMap<i32>>,
    pub required_previous_cards: Option<Vec<String>>,
    pub blocked_by_cards: Option<Vec<String>>,
    pub required_character_present: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionCard {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: CardCategory,
    #[serde(default)]
    pub rarity: CardRarity,
    #[serde(default)]
    pub urgency: UrgencyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<u32>,
    pub choices: Vec<CardChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<CardRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_id: Option<String>,
}

impl DecisionCard {
    pub fn new(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category: CardCategory::Normal,
            rarity: CardRarity::Common,
            urgency: UrgencyLevel::Normal,
            time_limit_seconds: None,
            choices: Vec::new(),
            requirements: None,
            character_id: None,
            image_id: None,
            sound_id: None,
        }
    }

    pub fn with_category(mut self, category: CardCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_choice(mut self, choice: CardChoice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn with_requirements(mut self, requirements: CardRequirements) -> Self {
        self.requirements = Some(requirements);
        self
    }

    pub fn choice(&self, choice_id: u32) -> Option<&CardChoice> {
        self.choices.iter().find(|c| c.choice_id == choice_id)
    }

    /// A card with zero choices can never be shown.
    pub fn is_presentable(&self) -> bool {
        !self.choices.is_empty()
    }

    /// Reject malformed ids, empty choice lists and duplicate choice ids.
    pub fn validate(&self) -> Result<(), EngineError> {
        validate_card_id(&self.id)?;
        if self.choices.is_empty() {
            return Err(EngineError::CardHasNoChoices(self.id.clone()));
        }
        let mut seen = BTreeSet::new();
        for choice in &self.choices {
            if !seen.insert(choice.choice_id) {
                return Err(EngineError::DuplicateChoice {
                    card_id: self.id.clone(),
                    choice_id: choice.choice_id,
                });
            }
        }
        Ok(())
    }
}

/// Source of decision cards. Deck and pool management live behind it.
pub trait CardSupplier {
    fn card(&self, id: &str) -> Option<&DecisionCard>;
    fn cards(&self) -> &[DecisionCard];
}

impl CardSupplier for [DecisionCard] {
    fn card(&self, id: &str) -> Option<&DecisionCard> {
        self.iter().find(|c| c.id == id)
    }

    fn cards(&self) -> &[DecisionCard] {
        self
    }
}

impl CardSupplier for Vec<DecisionCard> {
    fn card(&self, id: &str) -> Option<&DecisionCard> {
        self.as_slice().card(id)
    }

    fn cards(&self) -> &[DecisionCard] {
        self
    }
}
